//! Activity Watch Core - adaptive activity-state engine
//!
//! The main entry point for aw-core, handling:
//! - Record ingestion and aggregation
//! - Threshold fitting and re-fit scheduling
//! - State classification and escalation alerts
//! - Configuration inspection

use std::path::{Path, PathBuf};

use aw_common::{Error, OutputFormat, Result, StructuredError, SCHEMA_VERSION};
use aw_config::{load_config, resolve_config, ConfigSnapshot, Interval, LoadedConfig};
use aw_core::engine::{config_error, ActivityEngine};
use aw_core::exit_codes::ExitCode;
use aw_core::ingest::{aggregate, aggregate_by_entity, read_records, AggregatedSeries, ValueSeries};
use aw_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use aw_core::output::{
    render_analysis, render_thresholds, AnalysisReport, EntityReport, ThresholdReport,
};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

/// Activity Watch Core - adaptive thresholds, activity states and alerts
#[derive(Parser)]
#[command(name = "aw-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Engine config file (overrides AW_CONFIG and the config directories)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a series and report states and alerts per window
    Analyze(InputArgs),

    /// Print the pinned threshold spans for a series
    Thresholds(InputArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Raw records (JSON array or JSON lines)
    #[arg(long, conflicts_with = "series", required_unless_present = "series")]
    records: Option<PathBuf>,

    /// Pre-aggregated value series (JSON)
    #[arg(long)]
    series: Option<PathBuf>,

    /// Bucket interval for raw records (e.g. 1D, 6H, 1W, 1M)
    #[arg(long)]
    interval: Option<Interval>,

    /// Record field naming the entity; one series per entity
    #[arg(long, requires = "records")]
    entity_field: Option<String>,

    /// Only analyze this entity
    #[arg(long, requires = "records")]
    entity: Option<String>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved config)
        path: Option<PathBuf>,
    },
    /// Print which config file would be used
    Path,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => cli.global.log_level,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let ctx = LogContext::new(generate_run_id());
    let span = ctx.span();
    let _guard = span.enter();

    let exit_code = match &cli.command {
        Commands::Analyze(args) => run_analyze(&cli.global, &ctx, args),
        Commands::Thresholds(args) => run_thresholds(&cli.global, &ctx, args),
        Commands::Config(args) => run_config(&cli.global, &ctx, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_analyze(global: &GlobalOpts, ctx: &LogContext, args: &InputArgs) -> ExitCode {
    info!(
        target: event_names::RUN_STARTED,
        stage = %Stage::Init,
        command = "analyze",
        "starting analysis"
    );
    let result = analyze(global, ctx, args);
    finish(global, ctx, result)
}

fn analyze(global: &GlobalOpts, ctx: &LogContext, args: &InputArgs) -> Result<ExitCode> {
    let loaded = load_engine_config(global.config.as_deref())?;
    let engine = ActivityEngine::new(loaded.config.clone())?;
    let inputs = load_inputs(&loaded, args)?;

    let entities: Vec<EntityReport> = inputs
        .into_iter()
        .map(|(entity, agg)| {
            let output = engine.run(&agg.series);
            EntityReport::new(entity, agg.dropped, output)
        })
        .collect();

    let report = AnalysisReport::new(ctx.run_id.clone(), ConfigSnapshot::new(&loaded), entities);
    print!("{}", with_newline(render_analysis(&report, global.format)?));
    Ok(ExitCode::from_alert(report.alert_active()))
}

fn run_thresholds(global: &GlobalOpts, ctx: &LogContext, args: &InputArgs) -> ExitCode {
    info!(
        target: event_names::RUN_STARTED,
        stage = %Stage::Init,
        command = "thresholds",
        "starting threshold fit"
    );
    let result = thresholds(global, ctx, args);
    finish(global, ctx, result)
}

fn thresholds(global: &GlobalOpts, ctx: &LogContext, args: &InputArgs) -> Result<ExitCode> {
    let loaded = load_engine_config(global.config.as_deref())?;
    let engine = ActivityEngine::new(loaded.config.clone())?;
    let mut inputs = load_inputs(&loaded, args)?;
    if inputs.len() != 1 {
        return Err(Error::Input(format!(
            "thresholds needs a single series, input has {} entities (use --entity)",
            inputs.len()
        )));
    }
    let (_, agg) = inputs.remove(0);

    let values = agg.series.values();
    let pinned = engine.pin_thresholds(&values);
    let report = ThresholdReport::new(
        ctx.run_id.clone(),
        ConfigSnapshot::new(&loaded),
        values.len(),
        pinned.spans().to_vec(),
    );
    print!("{}", with_newline(render_thresholds(&report, global.format)?));
    Ok(ExitCode::Clean)
}

fn finish(global: &GlobalOpts, ctx: &LogContext, result: Result<ExitCode>) -> ExitCode {
    match result {
        Ok(code) => {
            info!(
                target: event_names::RUN_FINISHED,
                stage = %Stage::Output,
                exit_code = code.as_i32(),
                "done"
            );
            code
        }
        Err(err) => output_error(global, ctx, &err),
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn load_engine_config(path: Option<&Path>) -> Result<LoadedConfig> {
    match load_config(path) {
        Ok(loaded) => {
            match &loaded.path {
                Some(p) => info!(
                    target: event_names::CONFIG_LOADED,
                    path = %p.display(),
                    source = %loaded.source,
                    "config loaded"
                ),
                None => info!(
                    target: event_names::CONFIG_DEFAULT_USED,
                    "no config file found, using built-in defaults"
                ),
            }
            Ok(loaded)
        }
        Err(err) => {
            error!(target: event_names::CONFIG_ERROR, error = %err, "config rejected");
            Err(config_error(err))
        }
    }
}

/// Read the input named by `args` into one aggregated series per entity.
fn load_inputs(
    loaded: &LoadedConfig,
    args: &InputArgs,
) -> Result<Vec<(Option<String>, AggregatedSeries)>> {
    if let Some(path) = &args.series {
        let text = std::fs::read_to_string(path)?;
        let mut series = ValueSeries::from_json_str(&text)?;
        if let Some(interval) = args.interval {
            series = series.with_interval(interval)?;
        }
        info!(
            target: event_names::INGEST_FINISHED,
            stage = %Stage::Ingest,
            points = series.len(),
            "series loaded"
        );
        return Ok(vec![(None, AggregatedSeries { series, dropped: 0 })]);
    }

    let path = args
        .records
        .as_ref()
        .ok_or_else(|| Error::Internal("neither --records nor --series given".to_string()))?;
    let text = std::fs::read_to_string(path)?;

    let mut fields = loaded.config.ingest.clone();
    if let Some(field) = &args.entity_field {
        fields.entity_field = Some(field.clone());
    }
    let interval = args.interval.unwrap_or(loaded.config.interval);

    info!(
        target: event_names::INGEST_STARTED,
        stage = %Stage::Ingest,
        path = %path.display(),
        interval = %interval,
        "reading records"
    );
    let batch = read_records(&text, &fields)?;

    let inputs = if fields.entity_field.is_some() {
        let mut groups = aggregate_by_entity(&batch, interval)?;
        match &args.entity {
            Some(entity) => {
                let agg = groups.remove(entity).ok_or_else(|| Error::UnknownEntity {
                    entity: entity.clone(),
                })?;
                vec![(Some(entity.clone()), agg)]
            }
            None => groups.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        }
    } else {
        if args.entity.is_some() {
            return Err(Error::InvalidConfigValue {
                field: "ingest.entity_field".to_string(),
                message: "--entity needs an entity field (--entity-field or config)".to_string(),
            });
        }
        vec![(None, aggregate(&batch, interval)?)]
    };

    let dropped: usize = inputs.iter().map(|(_, agg)| agg.dropped).sum();
    if dropped > 0 {
        warn!(
            target: event_names::INGEST_FINISHED,
            dropped,
            "records with unparseable timestamps were dropped"
        );
    }
    info!(
        target: event_names::INGEST_FINISHED,
        stage = %Stage::Ingest,
        records = batch.len(),
        series = inputs.len(),
        using_weights = batch.using_weights,
        "records aggregated"
    );
    Ok(inputs)
}

// ============================================================================
// Config commands
// ============================================================================

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> ExitCode {
    let result = match &args.command {
        ConfigCommands::Show => config_show(global, ctx),
        ConfigCommands::Validate { path } => {
            config_validate(global, ctx, path.as_deref().or(global.config.as_deref()))
        }
        ConfigCommands::Path => {
            config_path(global, ctx);
            Ok(ExitCode::Clean)
        }
    };
    finish(global, ctx, result)
}

/// Display the resolved configuration (including defaults if no file found).
fn config_show(global: &GlobalOpts, ctx: &LogContext) -> Result<ExitCode> {
    let loaded = load_engine_config(global.config.as_deref())?;
    let snapshot = ConfigSnapshot::new(&loaded);

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "source": {
                    "path": snapshot.config_path,
                    "origin": snapshot.config_source,
                    "hash": snapshot.config_hash,
                    "using_defaults": loaded.path.is_none(),
                },
                "config": &loaded.config,
            });
            print_json(global, &response)?;
        }
        OutputFormat::Summary => {
            println!(
                "[{}] config: {} ({}) hash={}",
                ctx.run_id,
                snapshot.config_path.as_deref().unwrap_or("built-in defaults"),
                snapshot.config_source,
                snapshot.short_id()
            );
        }
        OutputFormat::Md => {
            let c = &loaded.config;
            println!("# aw-core config show");
            println!();
            match &snapshot.config_path {
                Some(path) => println!("Source: {} ({})", path, snapshot.config_source),
                None => println!("Source: **built-in defaults** (no engine config found)"),
            }
            println!("Hash: {}", snapshot.config_hash);
            println!();
            println!("| setting | value |");
            println!("|---|---|");
            println!("| quantile_levels | {:?} |", c.quantile_levels);
            println!("| state_names | {} |", c.state_names.join(", "));
            println!("| start_idx | {} |", c.start_idx);
            println!("| expanding_window | {} |", c.expanding_window);
            println!("| rolling_window | {} |", c.rolling_window);
            for w in &c.windows {
                println!("| window \"{}\" | {} |", w.label, w.length);
            }
            println!("| min_fit_samples | {} |", c.min_fit_samples);
            println!("| extreme_multiplier | {} |", c.extreme_multiplier);
            println!("| alert_min_state | {} |", c.alert_min_state);
            println!("| interval | {} ({}) |", c.interval, c.interval.label());
        }
    }
    Ok(ExitCode::Clean)
}

/// Validate a configuration file.
fn config_validate(global: &GlobalOpts, ctx: &LogContext, path: Option<&Path>) -> Result<ExitCode> {
    let loaded = load_engine_config(path)?;
    let snapshot = ConfigSnapshot::new(&loaded);

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "valid",
                "path": snapshot.config_path,
                "source": snapshot.config_source,
                "hash": snapshot.config_hash,
            });
            print_json(global, &response)?;
        }
        OutputFormat::Summary => {
            println!("[{}] config validate: OK", ctx.run_id);
        }
        OutputFormat::Md => {
            println!("# Configuration Validation");
            println!();
            println!("Status: ✓ Valid");
            match &snapshot.config_path {
                Some(path) => println!("File: {}", path),
                None => println!("File: using built-in defaults"),
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn config_path(global: &GlobalOpts, ctx: &LogContext) {
    let resolved = resolve_config(global.config.as_deref());
    let path = resolved.path.as_ref().map(|p| p.display().to_string());

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "path": path,
                "source": resolved.source.to_string(),
            });
            println!("{}", response);
        }
        _ => match path {
            Some(p) => println!("{} ({})", p, resolved.source),
            None => println!("built-in defaults"),
        },
    }
}

// ============================================================================
// Shared output helpers
// ============================================================================

fn print_json(global: &GlobalOpts, value: &serde_json::Value) -> Result<()> {
    let text = match global.format {
        OutputFormat::Jsonl => serde_json::to_string(value)?,
        _ => serde_json::to_string_pretty(value)?,
    };
    println!("{}", text);
    Ok(())
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "aw_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            println!("{}", version_info);
        }
        _ => {
            println!("aw-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

/// Output an error in the appropriate format and pick the exit code.
fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    if exit_code.is_internal_error() {
        error!(target: event_names::INTERNAL_ERROR, error = %err, "command failed");
    }

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": StructuredError::from(err),
                "remediation": err.remediation(),
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error: {}", ctx.run_id, err);
        }
        OutputFormat::Md => {
            eprintln!("# {}", err.headline());
            eprintln!();
            eprintln!("Error: {}", err);
            eprintln!();
            eprintln!("{}", err.remediation());
        }
    }

    exit_code
}
