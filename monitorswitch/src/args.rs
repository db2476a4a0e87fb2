//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Control monitor settings (input switching, brightness, contrast)
/// over the DDC/CI protocol.
#[derive(Parser, Debug)]
#[command(name = "monitorswitch", author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Engine configuration file (TOML)
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect connected monitors
    Detect,

    /// List selectable input sources
    List,

    /// Show a monitor's current input, brightness, and contrast
    Status {
        /// Monitor id (defaults to the first detected monitor)
        #[arg(long)]
        id: Option<u32>,
    },

    /// Switch a monitor to the named input (hdmi, dp, usb-c, ...)
    Switch {
        input: String,
        #[arg(long)]
        id: Option<u32>,
    },

    /// Read a raw VCP feature
    Get {
        /// Feature code, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_feature_code)]
        code: u8,
        #[arg(long)]
        id: Option<u32>,
    },

    /// Write a raw VCP feature
    Set {
        /// Feature code, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_feature_code)]
        code: u8,
        value: u16,
        #[arg(long)]
        id: Option<u32>,
    },
}

fn parse_feature_code(text: &str) -> Result<u8, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| format!("'{}' is not a feature code (0-255 or 0x00-0xff)", text))
}
