//! Common utilities for the Bilby HTML parser.
//!
//! This crate provides shared infrastructure used by the parser crates:
//! - **Warning System** - colored terminal output for recoverable problems

pub mod warning;
