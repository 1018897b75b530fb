//! Platform permission hints.
//!
//! Access itself is requested through the media host (see
//! [`DeviceEnumerator::request_authorization`]); this module only knows where
//! each platform lets the user grant it, so denial messages can point there.
//!
//! [`DeviceEnumerator::request_authorization`]: crate::camera::DeviceEnumerator::request_authorization

/// Kinds of media permission a host may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionType {
    /// Camera permission (required for any stream)
    Camera,
}

impl PermissionType {
    /// Where the current platform lets the user grant this permission.
    pub fn settings_hint(&self) -> &'static str {
        match self {
            PermissionType::Camera => CAMERA_HINT,
        }
    }
}

#[cfg(target_os = "macos")]
const CAMERA_HINT: &str = "Grant access in System Settings > Privacy & Security > Camera";

#[cfg(target_os = "windows")]
const CAMERA_HINT: &str = "Grant access in Settings > Privacy & security > Camera";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CAMERA_HINT: &str = "Make sure your user can read /dev/video* (e.g. is in the 'video' group)";
