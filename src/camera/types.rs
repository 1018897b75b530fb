//! Camera types and data structures.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

/// Category of a media device as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Camera-class source
    VideoInput,
    /// Microphone-class source
    AudioInput,
    /// Speaker or headphone sink
    AudioOutput,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::AudioInput => "audioinput",
            DeviceKind::AudioOutput => "audiooutput",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media device reported by one enumeration call.
///
/// Descriptors are produced fresh on every enumeration and never persisted.
/// The label may be empty until the user has authorized camera access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Opaque host identifier, used for constraint-exact binding
    pub id: String,
    /// Human-readable name (may be empty)
    pub label: String,
    /// Device category
    pub kind: DeviceKind,
    /// Identifier shared by devices on the same physical unit
    pub group_id: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            group_id: String::new(),
        }
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "[{}] (unnamed {})", self.id, self.kind)
        } else {
            write!(f, "[{}] {}", self.id, self.label)
        }
    }
}

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Default capture buffer size (320x240)
    pub const CAPTURE: Resolution = Resolution::new(320, 240);

    /// Preferred stream size requested from cameras (1280x720)
    pub const HD: Resolution = Resolution::new(1280, 720);

    /// Largest capture buffer accepted from flags or config files
    pub const MAX_CAPTURE: Resolution = Resolution::new(7680, 4320);

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Check that this is a usable capture buffer size.
    pub fn validate_capture_size(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err("Size width and height must be greater than 0".to_string());
        }
        if self.width > Self::MAX_CAPTURE.width || self.height > Self::MAX_CAPTURE.height {
            return Err(format!(
                "Size {} exceeds maximum supported ({})",
                self,
                Self::MAX_CAPTURE
            ));
        }
        Ok(())
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::CAPTURE
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Constraints passed to the host when requesting a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Exact device to open; `None` lets the host pick any camera
    pub device_id: Option<String>,
    /// Preferred resolution, if any
    pub ideal_resolution: Option<Resolution>,
}

impl StreamConstraints {
    /// Any video input, used for the authorization probe.
    pub fn any_video() -> Self {
        Self::default()
    }

    /// Exactly the given device.
    pub fn exact_device(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ideal_resolution: None,
        }
    }
}

/// A decoded RGB frame from a live stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, 3 bytes per pixel, row-major
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * Self::BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// RGB value at (x, y), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let p = self.data.get(i..i + Self::BYTES_PER_PIXEL)?;
        Some([p[0], p[1], p[2]])
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// The host has no media-device capability at all
    #[error("Camera access is not supported on this host: {0}")]
    CapabilityUnsupported(String),

    /// The user or platform refused camera access
    #[error("Camera permission denied. {hint}")]
    PermissionDenied { hint: String },

    /// Opening a specific device failed
    #[error("Failed to open camera '{device_id}': {reason}")]
    Acquisition { device_id: String, reason: String },

    /// The requested device id is not known to the host
    #[error("Camera '{0}' not found. Run 'camsnap list-cameras' to see available devices")]
    DeviceNotFound(String),

    /// Generic enumeration or query failure
    #[error("Camera platform error: {0}")]
    Platform(String),

    /// A newer bind request on the same surface won
    #[error("Request for camera '{device_id}' was superseded by a newer selection")]
    Superseded { device_id: String },

    /// The display surface has no stream bound
    #[error("No camera stream is bound")]
    NoActiveStream,

    /// The bound stream has not delivered a frame yet
    #[error("Camera stream has not produced a frame yet")]
    NoFrame,

    /// The bound stream did not start delivering frames in time
    #[error("Camera stream did not start within {0:?}")]
    StreamTimeout(std::time::Duration),

    /// Capture buffer with a zero dimension
    #[error("Invalid capture surface size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    /// Writing a capture to disk failed
    #[error("Failed to write capture to '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl CameraError {
    pub fn permission_denied() -> Self {
        CameraError::PermissionDenied {
            hint: crate::permissions::PermissionType::Camera
                .settings_hint()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_descriptor_display() {
        let named = DeviceDescriptor::new("cam-1", "Test Camera", DeviceKind::VideoInput);
        assert_eq!(format!("{}", named), "[cam-1] Test Camera");

        let unnamed = DeviceDescriptor::new("cam-2", "", DeviceKind::VideoInput);
        assert_eq!(format!("{}", unnamed), "[cam-2] (unnamed videoinput)");
    }

    #[test]
    fn test_resolution_constants() {
        assert_eq!(Resolution::CAPTURE, Resolution::new(320, 240));
        assert_eq!(Resolution::HD, Resolution::new(1280, 720));
        assert_eq!(Resolution::default(), Resolution::CAPTURE);
        assert_eq!(Resolution::HD.to_string(), "1280x720");
    }

    #[test]
    fn test_aspect_ratio() {
        assert!((Resolution::CAPTURE.aspect_ratio() - 4.0 / 3.0).abs() < 1e-12);
        assert!((Resolution::HD.aspect_ratio() - 16.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_capture_size() {
        assert!(Resolution::CAPTURE.validate_capture_size().is_ok());
        assert!(Resolution::MAX_CAPTURE.validate_capture_size().is_ok());
        assert!(Resolution::new(0, 240).validate_capture_size().is_err());
        assert!(Resolution::new(7681, 240).validate_capture_size().is_err());
        assert!(Resolution::new(320, 4321).validate_capture_size().is_err());
    }

    #[test]
    fn test_constraints() {
        assert_eq!(StreamConstraints::any_video().device_id, None);
        assert_eq!(
            StreamConstraints::exact_device("abc").device_id.as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_frame_pixel_access() {
        let frame = Frame::from_fn(2, 2, |x, y| [x as u8, y as u8, 9]);
        assert_eq!(frame.data.len(), 12);
        assert_eq!(frame.pixel(1, 0), Some([1, 0, 9]));
        assert_eq!(frame.pixel(0, 1), Some([0, 1, 9]));
        assert_eq!(frame.pixel(2, 0), None);
    }

    #[test]
    fn test_camera_error_display() {
        assert_eq!(
            CameraError::DeviceNotFound("x".into()).to_string(),
            "Camera 'x' not found. Run 'camsnap list-cameras' to see available devices"
        );
        assert_eq!(
            CameraError::Acquisition {
                device_id: "cam".into(),
                reason: "busy".into()
            }
            .to_string(),
            "Failed to open camera 'cam': busy"
        );
        assert!(CameraError::permission_denied()
            .to_string()
            .contains("permission denied"));
    }
}
