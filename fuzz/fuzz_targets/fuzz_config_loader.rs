#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = airsense_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // Anything that validates must convert into engine config.
            let _ = airsense_core::EngineCfg::from(&cfg);
        }
    }
});
