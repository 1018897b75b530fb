//! In-memory media host.
//!
//! `FakeHost` behaves like a browser-style media host with scriptable
//! devices, failures and latencies. Integration tests drive the whole flow
//! through it, and it doubles as a headless backend for the CLI.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::host::{MediaHost, MediaStream, MediaTrack};
use super::types::{
    CameraError, DeviceDescriptor, DeviceKind, Frame, Resolution, StreamConstraints,
};

/// Per-device behaviour.
#[derive(Debug, Clone)]
struct FakeDevice {
    descriptor: DeviceDescriptor,
    frame: Option<Frame>,
    latency: Duration,
    failure: Option<String>,
}

/// Scriptable media host.
#[derive(Debug)]
pub struct FakeHost {
    supported: bool,
    deny_permission: AtomicBool,
    enumerate_failure: Mutex<Option<String>>,
    devices: Mutex<Vec<FakeDevice>>,
    tracks_per_stream: usize,
    authorized: AtomicBool,
    enumerate_calls: AtomicUsize,
    open_calls: AtomicUsize,
    next_stream: AtomicU64,
    opened: Mutex<Vec<Arc<FakeStream>>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// A supported host with no devices.
    pub fn new() -> Self {
        Self {
            supported: true,
            deny_permission: AtomicBool::new(false),
            enumerate_failure: Mutex::new(None),
            devices: Mutex::new(Vec::new()),
            tracks_per_stream: 1,
            authorized: AtomicBool::new(false),
            enumerate_calls: AtomicUsize::new(0),
            open_calls: AtomicUsize::new(0),
            next_stream: AtomicU64::new(1),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// A host that lacks the media-device capability.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// A host with two cameras and a microphone, each camera streaming a
    /// gradient test pattern.
    pub fn demo() -> Self {
        Self::new()
            .with_camera("fake-cam-0", "Fake Front Camera", test_pattern(Resolution::HD))
            .with_device(DeviceDescriptor::new(
                "fake-mic-0",
                "Fake Microphone",
                DeviceKind::AudioInput,
            ))
            .with_camera("fake-cam-1", "Fake Rear Camera", test_pattern(Resolution::new(640, 480)))
    }

    /// Add a device of any kind that streams nothing.
    pub fn with_device(self, descriptor: DeviceDescriptor) -> Self {
        self.lock_devices().push(FakeDevice {
            descriptor,
            frame: None,
            latency: Duration::ZERO,
            failure: None,
        });
        self
    }

    /// Add a camera that streams `frame`.
    pub fn with_camera(self, id: &str, label: &str, frame: Frame) -> Self {
        self.lock_devices().push(FakeDevice {
            descriptor: DeviceDescriptor::new(id, label, DeviceKind::VideoInput),
            frame: Some(frame),
            latency: Duration::ZERO,
            failure: None,
        });
        self
    }

    /// Number of tracks each opened stream carries.
    pub fn with_tracks_per_stream(mut self, tracks: usize) -> Self {
        self.tracks_per_stream = tracks;
        self
    }

    /// Delay `get_user_media` for `device_id` by `latency`.
    pub fn with_latency(self, device_id: &str, latency: Duration) -> Self {
        self.update_device(device_id, |d| d.latency = latency);
        self
    }

    /// Make opening `device_id` fail with `reason`.
    pub fn with_failing_device(self, device_id: &str, reason: &str) -> Self {
        self.update_device(device_id, |d| d.failure = Some(reason.to_string()));
        self
    }

    /// Refuse every stream request as if the user denied the prompt.
    pub fn deny_permission(&self, deny: bool) {
        self.deny_permission.store(deny, Ordering::SeqCst);
    }

    /// Make the next enumerations fail with `reason` (or succeed with `None`).
    pub fn fail_enumeration(&self, reason: Option<&str>) {
        *self
            .enumerate_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = reason.map(str::to_string);
    }

    pub fn enumerate_calls(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    /// Streams opened so far that still have a live track.
    pub fn live_streams(&self) -> Vec<String> {
        self.lock_opened()
            .iter()
            .filter(|s| s.tracks.iter().any(|t| t.is_live()))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Total tracks stopped across every stream opened so far.
    pub fn stopped_tracks(&self) -> usize {
        self.lock_opened()
            .iter()
            .flat_map(|s| s.tracks.iter())
            .filter(|t| !t.is_live())
            .count()
    }

    /// Device id each opened stream was created for, in open order.
    pub fn opened_devices(&self) -> Vec<String> {
        self.lock_opened()
            .iter()
            .map(|s| s.device_id.clone())
            .collect()
    }

    fn lock_devices(&self) -> std::sync::MutexGuard<'_, Vec<FakeDevice>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_opened(&self) -> std::sync::MutexGuard<'_, Vec<Arc<FakeStream>>> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_device(&self, device_id: &str, f: impl FnOnce(&mut FakeDevice)) {
        if let Some(device) = self
            .lock_devices()
            .iter_mut()
            .find(|d| d.descriptor.id == device_id)
        {
            f(device);
        }
    }
}

#[async_trait]
impl MediaHost for FakeHost {
    fn supports_media_devices(&self) -> bool {
        self.supported
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, CameraError> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        if !self.supported {
            return Err(CameraError::CapabilityUnsupported(
                "fake host without media devices".to_string(),
            ));
        }
        if let Some(reason) = self
            .enumerate_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(CameraError::Platform(reason));
        }

        let authorized = self.authorized.load(Ordering::SeqCst);
        Ok(self
            .lock_devices()
            .iter()
            .map(|d| {
                let mut descriptor = d.descriptor.clone();
                // Hosts hide labels until the user has granted access
                if !authorized {
                    descriptor.label.clear();
                }
                descriptor
            })
            .collect())
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if !self.supported {
            return Err(CameraError::CapabilityUnsupported(
                "fake host without media devices".to_string(),
            ));
        }
        if self.deny_permission.load(Ordering::SeqCst) {
            return Err(CameraError::permission_denied());
        }

        let device = {
            let devices = self.lock_devices();
            let found = match &constraints.device_id {
                Some(id) => devices
                    .iter()
                    .find(|d| d.descriptor.id == *id && d.descriptor.is_video_input()),
                None => devices.iter().find(|d| d.descriptor.is_video_input()),
            };
            match (found, &constraints.device_id) {
                (Some(d), _) => d.clone(),
                (None, Some(id)) => return Err(CameraError::DeviceNotFound(id.clone())),
                (None, None) => {
                    return Err(CameraError::Acquisition {
                        device_id: "default".to_string(),
                        reason: "no video input available".to_string(),
                    })
                }
            }
        };

        if !device.latency.is_zero() {
            tokio::time::sleep(device.latency).await;
        }
        if let Some(reason) = device.failure {
            return Err(CameraError::Acquisition {
                device_id: device.descriptor.id,
                reason,
            });
        }

        self.authorized.store(true, Ordering::SeqCst);
        let n = self.next_stream.fetch_add(1, Ordering::SeqCst);
        let stream_id = format!("stream-{}", n);
        let tracks = (0..self.tracks_per_stream)
            .map(|t| {
                Arc::new(FakeTrack {
                    id: format!("{}-track-{}", stream_id, t),
                    live: AtomicBool::new(true),
                })
            })
            .collect();
        let stream = Arc::new(FakeStream {
            id: stream_id,
            device_id: device.descriptor.id,
            tracks,
            frame: device.frame,
        });
        self.lock_opened().push(Arc::clone(&stream));
        Ok(Box::new(FakeStreamHandle(stream)))
    }
}

#[derive(Debug)]
struct FakeTrack {
    id: String,
    live: AtomicBool,
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct FakeStream {
    id: String,
    device_id: String,
    tracks: Vec<Arc<FakeTrack>>,
    frame: Option<Frame>,
}

/// Boxed view of a shared fake stream; the host keeps its own reference for
/// inspection.
struct FakeStreamHandle(Arc<FakeStream>);

impl MediaStream for FakeStreamHandle {
    fn id(&self) -> &str {
        &self.0.id
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.0
            .tracks
            .iter()
            .map(|t| Arc::clone(t) as Arc<dyn MediaTrack>)
            .collect()
    }

    fn current_frame(&self) -> Option<Frame> {
        if self.0.tracks.iter().any(|t| t.is_live()) {
            self.0.frame.clone()
        } else {
            None
        }
    }
}

/// Horizontal/vertical gradient with a white marker in the top-left corner.
pub fn test_pattern(resolution: Resolution) -> Frame {
    let Resolution { width, height } = resolution;
    Frame::from_fn(width, height, |x, y| {
        if x < width / 8 && y < height / 8 {
            [255, 255, 255]
        } else {
            [
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]
        }
    })
}
