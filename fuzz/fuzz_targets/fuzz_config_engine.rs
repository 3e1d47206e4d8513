//! Fuzz target for engine configuration parsing and validation.
//!
//! A config that parses and validates must also build an engine.

#![no_main]

use aw_config::{validate_config, EngineConfig};
use aw_core::engine::ActivityEngine;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let parsed = match std::str::from_utf8(data) {
        Ok(text) if text.trim_start().starts_with('{') => EngineConfig::from_json_str(text),
        Ok(text) => EngineConfig::from_toml_str(text),
        Err(_) => return,
    };

    if let Ok(config) = parsed {
        if validate_config(&config).is_ok() {
            assert!(ActivityEngine::new(config).is_ok());
        }
    }
});
