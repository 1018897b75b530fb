//! Camera selection, stream binding and still capture.
//!
//! This module provides a high-level API for:
//! - Device enumeration via [`DeviceEnumerator`]
//! - Binding streams to a [`DisplaySurface`] via [`StreamBinder`]
//! - Mirrored still capture via [`FrameCapturer`] into a [`CaptureBuffer`]
//!
//! Platform access goes through the [`MediaHost`] trait.

mod binder;
mod canvas;
mod capture;
mod device;
pub mod fake;
mod host;
#[cfg(feature = "native")]
mod native;
mod types;

pub use binder::{BindOutcome, DisplaySurface, MediaStreamHandle, StreamBinder};
pub use canvas::{CaptureBuffer, Context2d, Transform};
pub use capture::{CropGeometry, FrameCapturer};
pub use device::{filter_video_inputs, DeviceEnumerator};
pub use host::{default_host, MediaHost, MediaStream, MediaTrack, UnsupportedHost};
#[cfg(feature = "native")]
pub use native::NativeHost;
pub use types::{
    CameraError, DeviceDescriptor, DeviceKind, Frame, Resolution, StreamConstraints,
};
