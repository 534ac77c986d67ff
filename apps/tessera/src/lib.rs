//! # Tessera - Object Store Binary
//!
//! Library surface of the Tessera application. The CLI command
//! implementations live here so integration tests can drive them
//! without spawning a process.

pub mod cli;
pub mod config;
