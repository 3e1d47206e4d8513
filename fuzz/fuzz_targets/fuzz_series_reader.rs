//! Fuzz target for pre-aggregated series parsing.

#![no_main]

use aw_core::ingest::ValueSeries;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = ValueSeries::from_json_str(text);
    }
});
