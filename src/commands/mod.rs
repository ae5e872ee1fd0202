//! Command implementations for the CLI
//!
//! - start: Start the demo server
//! - test: Test configuration validity
//! - config: Configuration display
//! - decode: Print the rows of a captured header

pub mod config;
pub mod decode;
pub mod start;
pub mod test;
