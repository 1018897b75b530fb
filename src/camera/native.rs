//! Native camera host backed by nokhwa.
//!
//! Each opened stream runs a background thread that owns the nokhwa `Camera`
//! and keeps the latest decoded RGB frame in a shared slot. Stopping the
//! stream's track signals the thread, which closes the device.

use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use super::host::{MediaHost, MediaStream, MediaTrack};
use super::types::{
    CameraError, DeviceDescriptor, DeviceKind, Frame, Resolution, StreamConstraints,
};

const DEFAULT_FPS: u32 = 30;

/// Media host for the cameras attached to this machine.
#[derive(Debug, Default)]
pub struct NativeHost {
    next_stream: AtomicU64,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaHost for NativeHost {
    fn supports_media_devices(&self) -> bool {
        true
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        let devices = tokio::task::spawn_blocking(|| nokhwa::query(ApiBackend::Auto))
            .await
            .map_err(|e| CameraError::Platform(e.to_string()))?
            .map_err(|e| CameraError::Platform(e.to_string()))?;

        // nokhwa only reports cameras
        Ok(devices
            .into_iter()
            .map(|d| {
                let mut descriptor = DeviceDescriptor::new(
                    d.index().to_string(),
                    d.human_name(),
                    DeviceKind::VideoInput,
                );
                descriptor.group_id = d.misc();
                descriptor
            })
            .collect())
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let device_id = constraints
            .device_id
            .clone()
            .unwrap_or_else(|| "0".to_string());
        let index = parse_index(&device_id);
        let resolution = constraints.ideal_resolution.unwrap_or(Resolution::HD);

        let n = self.next_stream.fetch_add(1, Ordering::SeqCst);
        let stream_id = format!("native-{}-{}", device_id, n);
        let latest = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_latest = Arc::clone(&latest);
        let thread_stop = Arc::clone(&stop);
        let thread_device = device_id.clone();
        thread::Builder::new()
            .name(format!("camsnap-{}", stream_id))
            .spawn(move || {
                run_capture_loop(
                    thread_device,
                    index,
                    resolution,
                    thread_latest,
                    thread_stop,
                    ready_tx,
                )
            })
            .map_err(|e| CameraError::Platform(format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(actual)) => {
                log::info!("Opened camera '{}' at {}", device_id, actual);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(CameraError::Acquisition {
                    device_id,
                    reason: "capture thread terminated unexpectedly".to_string(),
                })
            }
        }

        let track = Arc::new(NativeTrack {
            id: format!("{}-video", stream_id),
            stop,
        });
        Ok(Box::new(NativeStream {
            id: stream_id,
            track,
            latest,
        }))
    }
}

/// Numeric ids map to device indices, anything else is passed as a name.
fn parse_index(device_id: &str) -> CameraIndex {
    match device_id.parse::<u32>() {
        Ok(i) => CameraIndex::Index(i),
        Err(_) => CameraIndex::String(device_id.to_string()),
    }
}

struct NativeTrack {
    id: String,
    stop: Arc<AtomicBool>,
}

impl MediaTrack for NativeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
    }
}

struct NativeStream {
    id: String,
    track: Arc<NativeTrack>,
    latest: Arc<Mutex<Option<Frame>>>,
}

impl MediaStream for NativeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![Arc::clone(&self.track) as Arc<dyn MediaTrack>]
    }

    fn current_frame(&self) -> Option<Frame> {
        if !self.track.is_live() {
            return None;
        }
        self.latest.lock().ok()?.clone()
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.track.stop();
    }
}

fn run_capture_loop(
    device_id: String,
    index: CameraIndex,
    resolution: Resolution,
    latest: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<Resolution, CameraError>>,
) {
    let mut camera = match open_camera_with_fallback(&device_id, &index, resolution) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(CameraError::Acquisition {
            device_id,
            reason: e.to_string(),
        }));
        return;
    }

    let res = camera.resolution();
    let _ = ready.send(Ok(Resolution::new(res.width(), res.height())));

    while !stop.load(Ordering::Relaxed) {
        if let Ok(raw) = camera.frame() {
            // Undecodable frames are skipped
            if let Some(frame) = convert_to_rgb(&raw) {
                if let Ok(mut slot) = latest.lock() {
                    *slot = Some(frame);
                }
            }
        }
        thread::sleep(Duration::from_millis(1));
    }

    if let Err(e) = camera.stop_stream() {
        log::warn!("Failed to close camera '{}': {}", device_id, e);
    }
    log::debug!("Capture thread for '{}' stopped", device_id);
}

/// Try NV12, then MJPEG, then whatever the camera offers at its highest
/// resolution.
fn open_camera_with_fallback(
    device_id: &str,
    index: &CameraIndex,
    resolution: Resolution,
) -> Result<Camera, CameraError> {
    let wanted = nokhwa::utils::Resolution::new(resolution.width, resolution.height);
    let attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::NV12,
            DEFAULT_FPS,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::MJPEG,
            DEFAULT_FPS,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = String::from("no format attempted");
    for requested in attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => last_error = e.to_string(),
        }
    }

    let msg = last_error.to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("access")
    {
        Err(CameraError::permission_denied())
    } else if msg.contains("not found") || msg.contains("no such") {
        Err(CameraError::DeviceNotFound(device_id.to_string()))
    } else {
        Err(CameraError::Acquisition {
            device_id: device_id.to_string(),
            reason: last_error,
        })
    }
}

/// Decode a nokhwa buffer (MJPEG, YUYV, NV12, ...) into an RGB frame.
fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();
    Some(Frame {
        data: decoded.into_raw(),
        width: resolution.width(),
        height: resolution.height(),
        timestamp: Instant::now(),
    })
}
