//! Line-based selection control for the interactive mode.
//!
//! Options are printed as a numbered list. Typing a number selects that
//! camera, `c` (or an empty line) captures, `q` quits.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::camera::{CameraError, CaptureBuffer};
use crate::selection::{SelectOption, SelectionControl, UiEvent};

type SharedOptions = Arc<Mutex<Vec<SelectOption>>>;

const INPUT_HELP: &str = "Type a number to select a camera, 'c' to capture, 'q' to quit.";

/// Prints choices and alerts, writes captures to a PNG file.
#[derive(Debug)]
pub struct TerminalControl {
    options: SharedOptions,
    output: PathBuf,
    reading_input: bool,
}

impl TerminalControl {
    pub fn new(output: PathBuf) -> Self {
        Self {
            options: Arc::new(Mutex::new(Vec::new())),
            output,
            reading_input: false,
        }
    }

    /// Usage line printed under the camera list, only while stdin is read.
    fn input_help(&self) -> Option<&'static str> {
        self.reading_input.then_some(INPUT_HELP)
    }

    /// Start reading stdin; each recognised line becomes a [`UiEvent`].
    pub fn spawn_input(&mut self) -> mpsc::Receiver<UiEvent> {
        self.reading_input = true;
        let (tx, rx) = mpsc::channel(16);
        let options = Arc::clone(&self.options);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let event = {
                    let options = options.lock().unwrap_or_else(PoisonError::into_inner);
                    parse_command(&line, &options)
                };
                match event {
                    Some(event) => {
                        let quit = event == UiEvent::Quit;
                        if tx.send(event).await.is_err() || quit {
                            break;
                        }
                    }
                    None => eprintln!("Unrecognised input '{}'", line.trim()),
                }
            }
        });
        rx
    }
}

impl SelectionControl for TerminalControl {
    fn set_options(&mut self, options: &[SelectOption]) {
        if options.is_empty() {
            println!("No cameras found.");
            println!();
            println!("Make sure your camera is connected and permissions are granted.");
        } else {
            println!("Available cameras:");
            for (i, option) in options.iter().enumerate() {
                println!("  {}) {}", i + 1, option.text);
            }
            if let Some(help) = self.input_help() {
                println!();
                println!("{}", help);
            }
        }
        *self.options.lock().unwrap_or_else(PoisonError::into_inner) = options.to_vec();
    }

    fn alert(&mut self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn show_capture(&mut self, buffer: &CaptureBuffer) -> Result<(), CameraError> {
        buffer.save_png(&self.output)?;
        println!(
            "Saved {} capture to {}",
            buffer.resolution(),
            self.output.display()
        );
        Ok(())
    }
}

/// Translate one input line into an event.
pub fn parse_command(line: &str, options: &[SelectOption]) -> Option<UiEvent> {
    let input = line.trim();
    match input {
        "" | "c" | "capture" => Some(UiEvent::Capture),
        "q" | "quit" | "exit" => Some(UiEvent::Quit),
        _ => {
            let n: usize = input.parse().ok()?;
            let option = options.get(n.checked_sub(1)?)?;
            Some(UiEvent::Select(option.value.clone()))
        }
    }
}
