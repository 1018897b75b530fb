//! Ties enumeration, selection, binding and capture together.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::camera::{
    BindOutcome, CameraError, CaptureBuffer, CropGeometry, DeviceDescriptor, DeviceEnumerator,
    DisplaySurface, FrameCapturer, MediaHost, Resolution, StreamBinder,
};
use crate::selection::{options_from_devices, SelectionControl, UiEvent};

/// How captures are produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    /// Capture buffer size
    pub resolution: Resolution,
    /// Flip horizontally so stills match a mirrored self-view
    pub mirror: bool,
    /// How long to wait for a freshly bound stream to deliver a frame
    pub warmup_timeout: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::CAPTURE,
            mirror: true,
            warmup_timeout: Duration::from_secs(5),
        }
    }
}

/// One user's camera session: a control, a display surface and a capture
/// buffer sharing a single host.
pub struct Session<H, C> {
    enumerator: DeviceEnumerator<H>,
    binder: StreamBinder<H>,
    capturer: FrameCapturer,
    surface: DisplaySurface,
    buffer: CaptureBuffer,
    settings: CaptureSettings,
    control: C,
    devices: Vec<DeviceDescriptor>,
}

impl<H: MediaHost + Clone, C: SelectionControl> Session<H, C> {
    pub fn new(host: H, control: C, settings: CaptureSettings) -> Result<Self, CameraError> {
        Ok(Self {
            enumerator: DeviceEnumerator::new(host.clone()),
            binder: StreamBinder::new(host),
            capturer: FrameCapturer::new(settings.mirror),
            surface: DisplaySurface::new("preview"),
            buffer: CaptureBuffer::with_resolution(settings.resolution)?,
            settings,
            control,
            devices: Vec::new(),
        })
    }

    pub fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    pub fn buffer(&self) -> &CaptureBuffer {
        &self.buffer
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// Cameras found by the last successful startup.
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Authorize, list cameras and populate the control.
    ///
    /// Any failure aborts startup and raises a single alert.
    pub async fn startup(&mut self) -> Result<&[DeviceDescriptor], CameraError> {
        match self.enumerator.authorize_and_list().await {
            Ok(devices) => {
                log::info!("Found {} camera(s)", devices.len());
                self.control.set_options(&options_from_devices(&devices));
                self.devices = devices;
                Ok(&self.devices)
            }
            Err(e) => {
                log::error!("Startup failed: {}", e);
                self.control.alert(&e.to_string());
                Err(e)
            }
        }
    }

    /// Bind `device_id` to the preview surface.
    ///
    /// Failures are alerted but leave the session usable; selecting again
    /// retries.
    pub async fn select(&mut self, device_id: &str) -> Result<BindOutcome, CameraError> {
        let result = self.binder.bind(&self.surface, device_id).await;
        match &result {
            Ok(outcome) => log::debug!("Selected {:?}", outcome),
            Err(CameraError::Superseded { .. }) => {}
            Err(e) => self.control.alert(&e.to_string()),
        }
        result
    }

    /// Wait for the bound stream's first frame.
    pub async fn wait_until_flowing(&self) -> Result<Resolution, CameraError> {
        self.binder
            .wait_until_flowing(&self.surface, self.settings.warmup_timeout)
            .await
    }

    /// Capture the preview into the buffer and hand it to the control.
    pub fn capture(&mut self) -> Result<CropGeometry, CameraError> {
        let result = self
            .capturer
            .capture_surface(&self.surface, &mut self.buffer)
            .and_then(|geometry| {
                self.control.show_capture(&self.buffer)?;
                Ok(geometry)
            });
        match result {
            Ok(geometry) => Ok(geometry),
            Err(e) => {
                log::warn!("Capture failed: {}", e);
                self.control.alert(&e.to_string());
                Err(e)
            }
        }
    }

    /// Release the preview stream. Safe to call repeatedly.
    pub fn shutdown(&mut self) -> usize {
        self.binder.unbind(&self.surface)
    }

    /// Start up, then handle events until `Quit` or the sender goes away.
    ///
    /// Only startup failures end the loop early; selection and capture
    /// failures are alerted and the loop continues.
    pub async fn run(&mut self, mut events: mpsc::Receiver<UiEvent>) -> Result<(), CameraError> {
        self.startup().await?;

        while let Some(event) = events.recv().await {
            log::trace!("UI event: {:?}", event);
            match event {
                UiEvent::Select(device_id) => {
                    let _ = self.select(&device_id).await;
                }
                UiEvent::Capture => {
                    let _ = self.capture();
                }
                UiEvent::Quit => break,
            }
        }

        let released = self.shutdown();
        log::debug!("Session ended ({} track(s) released)", released);
        Ok(())
    }
}
