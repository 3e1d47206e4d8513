//! Fuzz target for raw record reading and aggregation.
//!
//! Record files come from external exports; any byte sequence must yield
//! either a series or an error, never a panic.

#![no_main]

use aw_config::{IngestConfig, Interval};
use aw_core::ingest::{aggregate, aggregate_by_entity, read_records};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut fields = IngestConfig::default();
    if let Ok(batch) = read_records(text, &fields) {
        let _ = aggregate(&batch, Interval::DAILY);
    }

    fields.entity_field = Some("country".to_string());
    if let Ok(batch) = read_records(text, &fields) {
        let _ = aggregate_by_entity(&batch, "6H".parse().unwrap_or(Interval::DAILY));
    }
});
