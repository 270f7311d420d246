//! Fuzz test for client driver arguments
//!
//! Tests command parsing and file name validation against arbitrary strings.

#![no_main]

use filestream_cli::Operation;
use filestream_files::validate_file_name;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut args = s.split_whitespace();

        if let Some(command) = args.next() {
            if let Ok(op) = command.parse::<Operation>() {
                assert_eq!(op.name(), command);
            }
        }

        for arg in args {
            if validate_file_name(arg).is_ok() {
                assert!(!arg.contains('/'));
                assert!(arg != "." && arg != "..");
            }
        }
    }
});
