//! Loader scenario tests
//!
//! Each module builds a small data directory in a temp dir and runs the full
//! discovery-to-dataset pipeline over it.

pub mod error_handling;
