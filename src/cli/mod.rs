//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, the terminal
//! selection control and subcommand handlers.

mod args;
mod commands;
mod enums;
mod terminal;

pub use args::{parse_resolution, Args, Command, ConfigAction};
pub use commands::{handle_config_action, interactive, list_cameras, snap};
pub use enums::Backend;
pub use terminal::{parse_command, TerminalControl};
