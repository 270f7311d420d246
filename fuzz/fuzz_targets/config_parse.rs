//! Fuzz test for configuration file parsing
//!
//! Tests that arbitrary TOML input doesn't cause panics when parsed as
//! server or client configuration.

#![no_main]

use filestream_cli::ClientConfig;
use filestream_server::ServerConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _: Result<toml::Value, _> = toml::from_str(s);

        // Invalid configs fail to parse or validate, never panic
        if let Ok(config) = toml::from_str::<ServerConfig>(s) {
            let _ = config.validate();
            let _ = config.parse_listen_addr();
        }
        if let Ok(config) = toml::from_str::<ClientConfig>(s) {
            let _ = config.validate();
        }
    }
});
