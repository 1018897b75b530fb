//! CLI argument parsing with clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::Backend;
use crate::camera::Resolution;

/// Pick a camera and capture mirrored stills
#[derive(Parser, Debug)]
#[command(name = "camsnap")]
#[command(version, about = "Camera picker with mirrored still capture", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Media backend
    #[arg(long, value_enum, default_value = "native", global = true)]
    pub backend: Backend,

    /// Where captures are written (PNG, overwritten on every capture)
    #[arg(long, short, global = true)]
    pub output: Option<PathBuf>,

    /// Capture size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_resolution, global = true)]
    pub size: Option<Resolution>,

    /// Do not mirror captures
    #[arg(long, global = true)]
    pub no_mirror: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Capture one still and exit
    Snap {
        /// Camera id (from list-cameras); defaults to the first camera
        #[arg(long, short)]
        device: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Parse and validate a capture size (WIDTHxHEIGHT format)
pub fn parse_resolution(s: &str) -> Result<Resolution, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid size format '{}'. Use WIDTHxHEIGHT (e.g., 320x240)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in size", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in size", parts[1]))?;
    let size = Resolution::new(width, height);
    size.validate_capture_size()?;
    Ok(size)
}
