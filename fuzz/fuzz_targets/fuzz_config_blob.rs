//! Fuzz target: `ReactorConfig::from_bytes` and `from_json`
//!
//! Arbitrary flash contents must decode to a validated config or an
//! error, never a panic. Anything that decodes must re-encode to a blob
//! that decodes to the same value.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use devicereactor::ReactorConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = ReactorConfig::from_bytes(data) {
        assert!(config.validate().is_ok());
        let blob = config.to_bytes().expect("valid config encodes");
        assert_eq!(ReactorConfig::from_bytes(&blob), Ok(config));
    }
    if let Ok(config) = ReactorConfig::from_json(data) {
        assert!(config.validate().is_ok());
    }
});
