use std::fmt::Write;

use super::{format_thresholds, AnalysisReport, ThresholdReport};

pub(super) fn analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Activity analysis");
    let _ = writeln!(out);
    let _ = writeln!(out, "Run: {}", report.run_id);
    let _ = writeln!(
        out,
        "Config: {} ({})",
        report.config.short_id(),
        report.config.config_source
    );
    let _ = writeln!(out, "Generated: {}", report.generated_at.to_rfc3339());

    for entity in &report.entities {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", entity.display_name());
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} points, {}{}",
            entity.output.series_len,
            if entity.output.using_weights {
                "weighted mentions"
            } else {
                "event counts"
            },
            if entity.dropped_records > 0 {
                format!(", {} records dropped", entity.dropped_records)
            } else {
                String::new()
            }
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "| window | length | populated | alerts | latest | alert |");
        let _ = writeln!(out, "|---|---|---|---|---|---|");
        for label in &entity.output.labels {
            let s = &label.summary;
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                s.label,
                s.window,
                s.populated,
                s.alerts,
                s.latest_state,
                if s.latest_alert { "yes" } else { "no" }
            );
        }

        for (label, segs) in &entity.segments {
            let set: Vec<_> = segs.iter().filter(|s| s.state.is_set()).collect();
            if set.is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "### {} segments", label);
            let _ = writeln!(out);
            let _ = writeln!(out, "| from | to | state | alerts |");
            let _ = writeln!(out, "|---|---|---|---|");
            for seg in set {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    seg.start.format("%Y-%m-%d %H:%M"),
                    seg.end.format("%Y-%m-%d %H:%M"),
                    seg.state,
                    seg.alerts.len()
                );
            }
        }
    }
    out
}

pub(super) fn thresholds(report: &ThresholdReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Pinned thresholds");
    let _ = writeln!(out);
    let _ = writeln!(out, "Run: {}", report.run_id);
    let _ = writeln!(out, "Config: {}", report.config.short_id());
    let _ = writeln!(out, "Series length: {}", report.series_len);
    let _ = writeln!(out);
    let _ = writeln!(out, "| history | applies to | method | thresholds |");
    let _ = writeln!(out, "|---|---|---|---|");
    for pinned in &report.spans {
        let span = &pinned.span;
        let _ = writeln!(
            out,
            "| {}..{} | {}..{} | {} | {} |",
            span.fit_start,
            span.fit_end,
            span.apply_start,
            span.apply_end(),
            pinned.method,
            format_thresholds(pinned.thresholds.as_slice())
        );
    }
    out
}
