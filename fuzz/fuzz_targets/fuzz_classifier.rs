//! Fuzz target for the engine pass over arbitrary series and schedules.
//!
//! Checks the warm-up and alert invariants on every input.

#![no_main]

use arbitrary::Arbitrary;
use aw_config::{EngineConfig, WindowConfig};
use aw_core::engine::ActivityEngine;
use aw_core::ingest::ValueSeries;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    values: Vec<u16>,
    start_idx: u8,
    expanding_window: u8,
    rolling_window: u8,
    window: u8,
}

fuzz_target!(|input: Input| {
    let window = usize::from(input.window.max(1));
    let config = EngineConfig {
        start_idx: usize::from(input.start_idx),
        expanding_window: usize::from(input.expanding_window.max(1)),
        rolling_window: usize::from(input.rolling_window.max(1)),
        windows: vec![WindowConfig::new(window, "fuzz")],
        min_fit_samples: 1000,
        ..EngineConfig::default()
    };
    let Ok(engine) = ActivityEngine::new(config) else {
        return;
    };

    let values: Vec<f64> = input.values.iter().map(|&v| f64::from(v)).collect();
    let out = engine.run(&ValueSeries::from_values(&values));

    let first = usize::from(input.start_idx).max(window).saturating_sub(1);
    let rows = &out.labels[0].rows;
    assert_eq!(rows.len(), values.len());
    for (i, row) in rows.iter().enumerate() {
        if i < first {
            assert!(!row.state.is_set());
        }
        if row.alert {
            let prev = rows[i - 1].state.index();
            let cur = row.state.index();
            assert!(matches!((prev, cur), (Some(p), Some(c)) if c > p && c >= 3));
        }
    }
});
