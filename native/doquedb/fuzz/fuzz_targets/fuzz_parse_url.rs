#![no_main]
//! Fuzz test for connection-string parsing
//!
//! Connection strings come straight from application configuration, so the
//! parser must answer "recognized" or "not ours" for every input and never panic.

use doquedb::url::{accepts_url, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (if valid UTF-8)
    if let Ok(url) = std::str::from_utf8(data) {
        let parsed = parse(url);
        assert_eq!(parsed.is_some(), accepts_url(url));
    }
});
