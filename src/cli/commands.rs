//! Subcommand handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::args::ConfigAction;
use super::terminal::TerminalControl;
use crate::camera::{CameraError, DeviceEnumerator, MediaHost};
use crate::config::{default_path as get_config_path, Config, DEFAULT_CONFIG};
use crate::selection::options_from_devices;
use crate::session::{CaptureSettings, Session};

/// List available cameras and print them to stdout.
pub async fn list_cameras(host: Arc<dyn MediaHost>) -> Result<(), CameraError> {
    let devices = DeviceEnumerator::new(host).authorize_and_list().await?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
    } else {
        println!("Available cameras:");
        for (option, device) in options_from_devices(&devices).iter().zip(&devices) {
            println!("  [{}] {}", device.id, option.text);
        }
        println!();
        println!("Use 'camsnap snap --device <id>' to capture from a camera.");
    }
    Ok(())
}

/// Capture one still from `device` (or the first camera) and write it to
/// `output`.
pub async fn snap(
    host: Arc<dyn MediaHost>,
    device: Option<String>,
    settings: CaptureSettings,
    output: PathBuf,
) -> Result<(), CameraError> {
    let mut session = Session::new(host, TerminalControl::new(output), settings)?;
    let devices = session.startup().await?;
    let device_id = match device {
        Some(id) => id,
        None => devices
            .first()
            .map(|d| d.id.clone())
            .ok_or_else(|| CameraError::DeviceNotFound("(any camera)".to_string()))?,
    };

    let result = async {
        session.select(&device_id).await?;
        let size = session.wait_until_flowing().await?;
        log::debug!("Camera '{}' streaming at {}", device_id, size);
        session.capture()
    }
    .await;
    session.shutdown();

    let geometry = result?;
    log::debug!("Capture geometry: {:?}", geometry);
    Ok(())
}

/// Interactive picker on stdin/stdout.
pub async fn interactive(
    host: Arc<dyn MediaHost>,
    settings: CaptureSettings,
    output: PathBuf,
) -> Result<(), CameraError> {
    let mut control = TerminalControl::new(output);
    let events = control.spawn_input();
    let mut session = Session::new(host, control, settings)?;
    session.run(events).await
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config: &Config, path: Option<&Path>) {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!(
                "  Capture size: {}x{}",
                config.capture.width, config.capture.height
            );
            println!(
                "  Mirror: {}",
                if config.capture.mirror { "yes" } else { "no" }
            );
            println!("  Output: {}", config.output.path.display());
            println!("  Warm-up timeout: {} ms", config.stream.warmup_timeout_ms);
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!("Config file already exists: {}", config_path.display());
                eprintln!("Use 'camsnap config show' to view current settings.");
                std::process::exit(1);
            }

            if let Some(parent) = config_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Error creating config directory: {}", e);
                    std::process::exit(1);
                }
            }

            if let Err(e) = std::fs::write(&config_path, DEFAULT_CONFIG) {
                eprintln!("Error writing config file: {}", e);
                std::process::exit(1);
            }

            println!("Created config file: {}", config_path.display());
        }
    }
}
