//! Command-line interface
//!
//! Argument parsing for the scripted walkthrough driver.

pub mod commands;

pub use commands::{Command, Opt, TargetArg};
