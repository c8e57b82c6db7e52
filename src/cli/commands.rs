use crate::core::types::{Target, TARGET_LENGTH};
use clap::{Parser, Subcommand};
use data_encoding::HEXLOWER;
use std::path::PathBuf;
use std::str::FromStr;

/// A proof-of-work target given as 8 hex digits, e.g. `000fffff`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetArg(pub Target);

impl FromStr for TargetArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = HEXLOWER
            .decode(s.to_lowercase().as_bytes())
            .map_err(|e| format!("Invalid target {s}: {e}"))?;
        let prefix: [u8; TARGET_LENGTH] = bytes
            .try_into()
            .map_err(|_| format!("Invalid target {s}: expected {} hex digits", TARGET_LENGTH * 2))?;
        Ok(TargetArg(Target(prefix)))
    }
}

#[derive(Debug, Parser)]
#[command(name = "testcoin")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "demo",
        about = "Run a scripted walkthrough: fund an account, pay a peer, pay back"
    )]
    Demo {
        #[arg(long = "config", help = "TOML file with protocol and miner settings")]
        config: Option<PathBuf>,
        #[arg(long = "json", help = "Print the final chain summary as JSON")]
        json: bool,
    },
    #[command(
        name = "solve-speed",
        about = "Time nonce searches for random headers at a target"
    )]
    SolveSpeed {
        #[arg(long = "target", help = "Target prefix as 8 hex digits")]
        target: TargetArg,
        #[arg(long = "iterations", default_value_t = 10, help = "Number of headers to solve")]
        iterations: u32,
    },
}
