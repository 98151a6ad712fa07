//! Unit tests for sg-cli modules
//!
//! These tests cover individual components without network I/O.

mod test_api;
mod test_patch;
