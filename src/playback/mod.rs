/// Playback session: tracks one active media item and the mutable
/// transport state mirrored against an external media surface.
use crate::api::{ApiError, MediaServerApi};
use crate::models::{MediaItem, Server};

const SKIP_STEP_SECS: f64 = 10.0;

/// Lifecycle of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No media loaded
    Idle,
    /// Media metadata being fetched
    Loading,
    /// Media loaded, transport paused
    Ready,
    Playing,
    /// The surface reported end of media; the consumer is expected to
    /// treat this as "return to the prior view"
    Ended,
}

/// Notification from the external media surface. The surface is the
/// authority for transport state; the session only reconciles.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Played,
    Paused,
    /// Current playback position, seconds
    TimeUpdate(f64),
    /// Media duration became known or changed, seconds
    DurationChanged(f64),
    VolumeChanged { volume: f32, muted: bool },
    RateChanged(f32),
    Ended,
    PipEntered,
    PipExited,
    FullscreenChanged(bool),
    /// Decode or transport failure at the surface
    Error(String),
}

/// Ephemeral, process-local playback state. No persistence; a session
/// lives exactly as long as its consumer keeps it.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    state: SessionState,
    media: Option<MediaItem>,
    /// Time cursor in seconds
    position: f64,
    /// Duration in seconds
    duration: f64,
    volume: f32,
    muted: bool,
    rate: f32,
    pip_active: bool,
    fullscreen: bool,
    last_error: Option<String>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            media: None,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            pip_active: false,
            fullscreen: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn media(&self) -> Option<&MediaItem> {
        self.media.as_ref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn pip_active(&self) -> bool {
        self.pip_active
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch media details and populate the session. Success lands in
    /// `Ready`; not-found and transport failure return the session to
    /// `Idle` and surface the error to the caller.
    pub async fn load(
        &mut self,
        api: &dyn MediaServerApi,
        server: &Server,
        media_id: &str,
    ) -> Result<(), ApiError> {
        self.state = SessionState::Loading;
        self.last_error = None;

        match api.media_details(server, media_id).await {
            Ok(item) => {
                self.duration = item.duration_ms as f64 / 1000.0;
                // Resume where the server last saw this item
                self.position = item
                    .view_offset_ms
                    .map(|offset| offset as f64 / 1000.0)
                    .unwrap_or(0.0);
                self.media = Some(item);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("failed to load media {media_id}: {e}");
                self.media = None;
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    /// Request playback. Idempotent: playing an already-playing session
    /// is a no-op. The surface remains authoritative; if it rejects the
    /// request it reports back through `apply`.
    pub fn play(&mut self) {
        match self.state {
            SessionState::Ready | SessionState::Ended => self.state = SessionState::Playing,
            SessionState::Playing => {}
            _ => tracing::debug!("ignoring play() in {:?}", self.state),
        }
    }

    /// Request pause; idempotent like `play`
    pub fn pause(&mut self) {
        match self.state {
            SessionState::Playing => self.state = SessionState::Ready,
            SessionState::Ready => {}
            _ => tracing::debug!("ignoring pause() in {:?}", self.state),
        }
    }

    pub fn toggle_play(&mut self) {
        match self.state {
            SessionState::Playing => self.pause(),
            _ => self.play(),
        }
    }

    /// Move the time cursor, clamped to `[0, duration]`
    pub fn seek(&mut self, seconds: f64) {
        if self.state == SessionState::Idle {
            return;
        }
        self.position = seconds.max(0.0).min(self.duration);
    }

    pub fn skip_forward(&mut self) {
        self.seek(self.position + SKIP_STEP_SECS);
    }

    pub fn skip_backward(&mut self) {
        self.seek(self.position - SKIP_STEP_SECS);
    }

    /// Set the volume level, clamped into [0, 1]. Independent of the
    /// play/pause state; setting exactly zero also mutes.
    pub fn set_volume(&mut self, volume: f32) {
        if self.state == SessionState::Idle {
            return;
        }
        self.volume = volume.max(0.0).min(1.0);
        if self.volume == 0.0 {
            self.muted = true;
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.state == SessionState::Idle {
            return;
        }
        self.muted = muted;
    }

    pub fn toggle_mute(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        self.muted = !self.muted;
    }

    /// Set the playback rate; non-positive rates are rejected
    pub fn set_rate(&mut self, rate: f32) {
        if self.state == SessionState::Idle {
            return;
        }
        if rate <= 0.0 {
            tracing::warn!("rejecting non-positive playback rate {rate}");
            return;
        }
        self.rate = rate;
    }

    /// Express intent to enter or leave picture-in-picture. The flag does
    /// NOT flip here: the host environment confirms (or rejects) the
    /// transition asynchronously through `apply`. Returns the target
    /// state to forward to the environment, or None when there is
    /// nothing to request.
    pub fn request_pip(&self, active: bool) -> Option<bool> {
        if self.state == SessionState::Idle || self.pip_active == active {
            return None;
        }
        Some(active)
    }

    /// Same contract as `request_pip`, for fullscreen
    pub fn request_fullscreen(&self, active: bool) -> Option<bool> {
        if self.state == SessionState::Idle || self.fullscreen == active {
            return None;
        }
        Some(active)
    }

    /// Reconcile one external surface notification. This is the single
    /// place transport invariants are enforced; each event immediately
    /// overwrites the corresponding field, with no queueing.
    pub fn apply(&mut self, event: SurfaceEvent) {
        if self.state == SessionState::Idle {
            tracing::debug!("discarding surface event in Idle: {event:?}");
            return;
        }

        match event {
            SurfaceEvent::Played => self.state = SessionState::Playing,
            SurfaceEvent::Paused => {
                if self.state == SessionState::Playing {
                    self.state = SessionState::Ready;
                }
            }
            SurfaceEvent::TimeUpdate(seconds) => self.position = seconds,
            SurfaceEvent::DurationChanged(seconds) => self.duration = seconds,
            SurfaceEvent::VolumeChanged { volume, muted } => {
                self.volume = volume.max(0.0).min(1.0);
                self.muted = muted;
            }
            SurfaceEvent::RateChanged(rate) => self.rate = rate,
            SurfaceEvent::Ended => {
                self.state = SessionState::Ended;
                self.position = self.duration;
            }
            SurfaceEvent::PipEntered => self.pip_active = true,
            SurfaceEvent::PipExited => self.pip_active = false,
            SurfaceEvent::FullscreenChanged(active) => self.fullscreen = active,
            SurfaceEvent::Error(message) => {
                tracing::warn!("surface reported failure: {message}");
                self.last_error = Some(message);
                // The surface rejected playback (e.g. unsupported codec);
                // fall back to paused rather than pretending to play.
                if self.state == SessionState::Playing {
                    self.state = SessionState::Ready;
                }
            }
        }
    }

    /// Close the session: back to `Idle`, media reference dropped,
    /// transport fields reset. Volume and mute survive as user-level
    /// preferences for the next session.
    pub fn close(&mut self) {
        self.state = SessionState::Idle;
        self.media = None;
        self.position = 0.0;
        self.duration = 0.0;
        self.rate = 1.0;
        self.pip_active = false;
        self.fullscreen = false;
        self.last_error = None;
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}
