//! Binding camera streams to display surfaces.
//!
//! A [`DisplaySurface`] owns at most one [`MediaStreamHandle`]. Every bind or
//! unbind takes a new generation number on the surface; a bind whose stream
//! arrives after a newer request was issued releases that stream instead of
//! attaching it, so overlapping selections resolve to the most recent one.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::host::{MediaHost, MediaStream};
use super::types::{CameraError, Frame, Resolution, StreamConstraints};

/// Poll interval used while waiting for a stream to start delivering frames.
const FLOW_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// An owned live stream opened for one device.
pub struct MediaStreamHandle {
    device_id: String,
    stream: Box<dyn MediaStream>,
}

impl std::fmt::Debug for MediaStreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStreamHandle")
            .field("device_id", &self.device_id)
            .field("stream_id", &self.stream.id())
            .field("tracks", &self.stream.tracks().len())
            .finish()
    }
}

impl MediaStreamHandle {
    pub fn new(device_id: impl Into<String>, stream: Box<dyn MediaStream>) -> Self {
        Self {
            device_id: device_id.into(),
            stream,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn stream_id(&self) -> &str {
        self.stream.id()
    }

    pub fn track_count(&self) -> usize {
        self.stream.tracks().len()
    }

    pub fn is_live(&self) -> bool {
        self.stream.tracks().iter().any(|t| t.is_live())
    }

    pub fn current_frame(&self) -> Option<Frame> {
        self.stream.current_frame()
    }

    /// Stop every track, returning how many were stopped.
    pub fn stop(self) -> usize {
        let tracks = self.stream.tracks();
        for track in &tracks {
            track.stop();
        }
        tracks.len()
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    generation: u64,
    handle: Option<MediaStreamHandle>,
}

/// Where a live stream is shown.
///
/// The surface exposes the bound stream's intrinsic size once frames are
/// flowing. All state sits behind one mutex that is never held across an
/// await point.
#[derive(Debug, Default)]
pub struct DisplaySurface {
    name: String,
    state: Mutex<SurfaceState>,
}

impl DisplaySurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(SurfaceState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a stream is currently attached.
    pub fn is_bound(&self) -> bool {
        self.lock().handle.is_some()
    }

    /// Device id of the attached stream.
    pub fn bound_device(&self) -> Option<String> {
        self.lock().handle.as_ref().map(|h| h.device_id().to_string())
    }

    /// Current request generation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Latest frame of the attached stream.
    pub fn current_frame(&self) -> Option<Frame> {
        self.lock().handle.as_ref().and_then(|h| h.current_frame())
    }

    /// Intrinsic source size, available once the stream is flowing.
    pub fn intrinsic_size(&self) -> Option<Resolution> {
        self.current_frame().map(|f| f.resolution())
    }

    /// Start a new request; every older in-flight request becomes stale.
    /// Returns the new generation and whatever handle was attached.
    fn begin_request(&self) -> (u64, Option<MediaStreamHandle>) {
        let mut state = self.lock();
        state.generation += 1;
        (state.generation, state.handle.take())
    }

    /// Attach `handle` if `generation` is still current, otherwise hand it
    /// back to the caller.
    fn attach(
        &self,
        generation: u64,
        handle: MediaStreamHandle,
    ) -> Result<(), MediaStreamHandle> {
        let mut state = self.lock();
        if state.generation != generation {
            return Err(handle);
        }
        if let Some(previous) = state.handle.replace(handle) {
            // begin_request already took the old handle; reaching here means a
            // caller attached outside the binder
            previous.stop();
        }
        Ok(())
    }
}

/// What a successful bind did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    pub device_id: String,
    pub stream_id: String,
    /// Tracks stopped on the stream that was bound before
    pub released_tracks: usize,
}

/// Opens streams through a [`MediaHost`] and attaches them to surfaces.
#[derive(Debug, Clone)]
pub struct StreamBinder<H> {
    host: H,
}

impl<H: MediaHost> StreamBinder<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Bind the camera `device_id` to `surface`.
    ///
    /// Any stream already on the surface is stopped before the new one is
    /// requested. If another bind or unbind is issued on the same surface
    /// while this one is waiting for the host, the stream that arrives is
    /// stopped and [`CameraError::Superseded`] is returned. A stale request
    /// that fails is reported as superseded too.
    pub async fn bind(
        &self,
        surface: &DisplaySurface,
        device_id: &str,
    ) -> Result<BindOutcome, CameraError> {
        let (generation, previous) = surface.begin_request();
        let released_tracks = previous.map(release).unwrap_or(0);
        log::debug!(
            "Binding '{}' to surface '{}' (generation {})",
            device_id,
            surface.name(),
            generation
        );

        let stream = match self
            .host
            .get_user_media(&StreamConstraints::exact_device(device_id))
            .await
        {
            Ok(stream) => stream,
            Err(e) if surface.generation() != generation => {
                log::debug!("Ignoring failure of stale request for '{}': {}", device_id, e);
                return Err(CameraError::Superseded {
                    device_id: device_id.to_string(),
                });
            }
            Err(e) => {
                log::warn!("Could not open camera '{}': {}", device_id, e);
                return Err(e);
            }
        };

        let handle = MediaStreamHandle::new(device_id, stream);
        let stream_id = handle.stream_id().to_string();
        match surface.attach(generation, handle) {
            Ok(()) => {
                log::info!(
                    "Camera '{}' bound to surface '{}' (stream {})",
                    device_id,
                    surface.name(),
                    stream_id
                );
                Ok(BindOutcome {
                    device_id: device_id.to_string(),
                    stream_id,
                    released_tracks,
                })
            }
            Err(stale) => {
                let stopped = stale.stop();
                log::debug!(
                    "Discarded stale stream {} for '{}' ({} track(s) stopped)",
                    stream_id,
                    device_id,
                    stopped
                );
                Err(CameraError::Superseded {
                    device_id: device_id.to_string(),
                })
            }
        }
    }

    /// Detach and stop whatever is bound to `surface`.
    ///
    /// Returns the number of tracks stopped; 0 when nothing was bound.
    pub fn unbind(&self, surface: &DisplaySurface) -> usize {
        let (_, previous) = surface.begin_request();
        previous.map(release).unwrap_or(0)
    }

    /// Wait until the bound stream delivers its first frame.
    pub async fn wait_until_flowing(
        &self,
        surface: &DisplaySurface,
        timeout: Duration,
    ) -> Result<Resolution, CameraError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !surface.is_bound() {
                return Err(CameraError::NoActiveStream);
            }
            if let Some(size) = surface.intrinsic_size() {
                return Ok(size);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CameraError::StreamTimeout(timeout));
            }
            tokio::time::sleep(FLOW_POLL_INTERVAL).await;
        }
    }
}

fn release(handle: MediaStreamHandle) -> usize {
    let device = handle.device_id().to_string();
    let stopped = handle.stop();
    log::debug!("Released camera '{}' ({} track(s) stopped)", device, stopped);
    stopped
}
