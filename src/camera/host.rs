//! Host platform capability seam.
//!
//! A [`MediaHost`] is whatever can enumerate media devices and open camera
//! streams: the native nokhwa backend, the in-memory [`FakeHost`] used by tests,
//! or [`UnsupportedHost`] when the binary was built without camera support.
//!
//! [`FakeHost`]: super::fake::FakeHost

use async_trait::async_trait;
use std::sync::Arc;

use super::types::{CameraError, DeviceDescriptor, Frame, StreamConstraints};

/// One track of a media stream.
pub trait MediaTrack: Send + Sync {
    /// Host identifier of the track.
    fn id(&self) -> &str;

    /// Stop the track and release its hardware reservation.
    ///
    /// Stopping is permanent; calling it again has no effect.
    fn stop(&self);

    /// Whether the track is still delivering data.
    fn is_live(&self) -> bool;
}

/// A live stream opened by [`MediaHost::get_user_media`].
pub trait MediaStream: Send + Sync {
    /// Host identifier of the stream.
    fn id(&self) -> &str;

    /// All tracks belonging to the stream.
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// The most recent frame, or `None` until the stream is flowing.
    fn current_frame(&self) -> Option<Frame>;
}

/// Asynchronous host media capability.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Whether the host exposes media devices at all.
    fn supports_media_devices(&self) -> bool;

    /// List every media device, in host order.
    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError>;

    /// Open a stream matching `constraints`.
    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}

#[async_trait]
impl<H: MediaHost + ?Sized> MediaHost for Arc<H> {
    fn supports_media_devices(&self) -> bool {
        (**self).supports_media_devices()
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        (**self).enumerate_devices().await
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        (**self).get_user_media(constraints).await
    }
}

#[async_trait]
impl<'a, H: MediaHost + ?Sized> MediaHost for &'a H {
    fn supports_media_devices(&self) -> bool {
        (**self).supports_media_devices()
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        (**self).enumerate_devices().await
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        (**self).get_user_media(constraints).await
    }
}

/// Host without any camera capability.
#[derive(Debug, Clone)]
pub struct UnsupportedHost {
    reason: String,
}

impl UnsupportedHost {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> CameraError {
        CameraError::CapabilityUnsupported(self.reason.clone())
    }
}

#[async_trait]
impl MediaHost for UnsupportedHost {
    fn supports_media_devices(&self) -> bool {
        false
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        Err(self.error())
    }

    async fn get_user_media(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        Err(self.error())
    }
}

/// The host the binary uses: nokhwa when built with the `native` feature.
#[cfg(feature = "native")]
pub fn default_host() -> Arc<dyn MediaHost> {
    Arc::new(super::native::NativeHost::new())
}

/// The host the binary uses: nokhwa when built with the `native` feature.
#[cfg(not(feature = "native"))]
pub fn default_host() -> Arc<dyn MediaHost> {
    Arc::new(UnsupportedHost::new(
        "camsnap was built without the `native` feature",
    ))
}
