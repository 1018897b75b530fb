//! The human-facing control surface.
//!
//! The core never renders anything itself. It populates a
//! [`SelectionControl`] with choices, reports problems through it, hands it
//! finished captures, and reacts to the [`UiEvent`]s it emits.

use crate::camera::{CameraError, CaptureBuffer, DeviceDescriptor};

/// One entry of the device picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Text shown to the user
    pub text: String,
    /// Device id passed back on selection
    pub value: String,
}

impl SelectOption {
    /// Build an option for the device at `position` (0-based) in the list.
    ///
    /// Devices without a label (access not granted yet) are shown as
    /// `Camera N`, counting from 1.
    pub fn from_device(position: usize, device: &DeviceDescriptor) -> Self {
        let text = if device.label.trim().is_empty() {
            format!("Camera {}", position + 1)
        } else {
            device.label.clone()
        };
        Self {
            text,
            value: device.id.clone(),
        }
    }
}

/// Options for every device, in the given order.
pub fn options_from_devices(devices: &[DeviceDescriptor]) -> Vec<SelectOption> {
    devices
        .iter()
        .enumerate()
        .map(|(i, d)| SelectOption::from_device(i, d))
        .collect()
}

/// Events a control emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The user picked a device
    Select(String),
    /// The user asked for a still
    Capture,
    /// The user is done
    Quit,
}

/// A selectable list plus a capture action.
pub trait SelectionControl {
    /// Replace the list of choices.
    fn set_options(&mut self, options: &[SelectOption]);

    /// Show a user-visible error.
    fn alert(&mut self, message: &str);

    /// A capture finished and `buffer` holds the new still.
    ///
    /// An error means the still could not be shown or stored.
    fn show_capture(&mut self, buffer: &CaptureBuffer) -> Result<(), CameraError>;
}
