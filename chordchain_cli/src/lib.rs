// Chordchain command-line layer: configuration, orchestration of the core
// engine, JSON output and report rendering. `main.rs` only parses flags and
// prints.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod report;
