//! Unit and integration tests for the DoqueDB client
//!
//! This module organizes all tests into logical submodules that correspond to
//! the main library modules. Wire traffic is served by the scripted mock in
//! `test_utils`.

mod connection_tests;
mod proptest_tests;
mod url_tests;
