//! Camera device enumeration.

use super::host::MediaHost;
use super::types::{CameraError, DeviceDescriptor, StreamConstraints};

/// Keep only video-input devices, preserving host order.
pub fn filter_video_inputs(devices: Vec<DeviceDescriptor>) -> Vec<DeviceDescriptor> {
    devices.into_iter().filter(|d| d.is_video_input()).collect()
}

/// Lists the cameras a [`MediaHost`] exposes.
#[derive(Debug, Clone)]
pub struct DeviceEnumerator<H> {
    host: H,
}

impl<H: MediaHost> DeviceEnumerator<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Ask the host for camera access.
    ///
    /// Access is requested by opening a generic video stream and stopping it
    /// straight away. An unsupported host fails with
    /// [`CameraError::CapabilityUnsupported`] before anything is queried.
    ///
    /// When the host has no camera it can open, there is nothing to
    /// authorize: the call succeeds and listing reports what is there.
    pub async fn request_authorization(&self) -> Result<(), CameraError> {
        if !self.host.supports_media_devices() {
            return Err(CameraError::CapabilityUnsupported(
                "host does not expose media devices".to_string(),
            ));
        }

        let probe = match self.host.get_user_media(&StreamConstraints::any_video()).await {
            Ok(probe) => probe,
            Err(e @ (CameraError::Acquisition { .. } | CameraError::DeviceNotFound(_))) => {
                log::debug!("No camera to authorize against: {}", e);
                return Ok(());
            }
            Err(e) => {
                log::warn!("Authorization probe failed: {}", e);
                return Err(e);
            }
        };

        let tracks = probe.tracks();
        for track in &tracks {
            track.stop();
        }
        log::debug!(
            "Camera access granted (probe stream {} released, {} track(s))",
            probe.id(),
            tracks.len()
        );
        Ok(())
    }

    /// All video-input devices, in host-reported order.
    ///
    /// Labels may be empty when called before [`request_authorization`].
    ///
    /// [`request_authorization`]: Self::request_authorization
    pub async fn list_video_input_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        if !self.host.supports_media_devices() {
            return Err(CameraError::CapabilityUnsupported(
                "host does not expose media devices".to_string(),
            ));
        }

        let devices = self.host.enumerate_devices().await.map_err(|e| match e {
            CameraError::CapabilityUnsupported(_) | CameraError::Platform(_) => e,
            other => CameraError::Platform(other.to_string()),
        })?;
        let total = devices.len();
        let cameras = filter_video_inputs(devices);
        log::debug!("Enumerated {} device(s), {} camera(s)", total, cameras.len());
        Ok(cameras)
    }

    /// Authorize, then list. The single startup strategy.
    pub async fn authorize_and_list(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        self.request_authorization().await?;
        self.list_video_input_devices().await
    }
}
