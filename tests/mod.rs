//! Integration tests for PodTUI
//!
//! Tests are organized by component:
//! - directory_test: podcast directory search client
//! - feed_test: RSS feed reader
//! - fetch_test: audio download into temporary files
//! - cli_test: argument parsing and JSON output helpers
//! - ui_test: rendering of each view with a test backend
//! - e2e_test: full flows (search -> show -> episode -> play) with a fake audio device

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
