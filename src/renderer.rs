// ============================================================================
// RENDER ORCHESTRATOR — latest-settings-wins background rendering
// ============================================================================
//
// Every settings change bumps a token and spawns a render on rayon.  Results
// come back over a channel tagged with the token they were started under;
// anything older than the current token is dropped on arrival, so a slow
// render can never overwrite the output of a newer one.  The latest token is
// also shared with every job: a job that has been superseded gives up before
// starting and between pipeline stages, so a burst of changes does not queue
// a full render per change.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use image::RgbaImage;

use crate::ops::compositor;
use crate::settings::GrainSettings;

/// Result delivered from a background render.
pub struct RenderResult {
    /// Token the render was started under.
    pub token: u64,
    /// `None` when the render panicked or was superseded.
    pub image: Option<RgbaImage>,
    /// True when the job gave up because a newer request exists.
    pub cancelled: bool,
    pub elapsed_ms: f64,
}

/// Body of one background job.
fn run_job(token: u64, settings: &GrainSettings, latest: &AtomicU64) -> RenderResult {
    let start = Instant::now();
    let superseded = || latest.load(Ordering::Acquire) != token;
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        compositor::render_until(settings, superseded)
    }));
    let (image, cancelled) = match outcome {
        Ok(Some(img)) => (Some(img), false),
        Ok(None) => (None, true),
        Err(panic_info) => {
            let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            crate::log_err!("Render #{} panicked: {}", token, msg);
            (None, false)
        }
    };
    RenderResult {
        token,
        image,
        cancelled,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

pub struct Renderer {
    settings: GrainSettings,
    /// Token of the most recent request.
    token: u64,
    /// Same value, visible to running jobs.
    latest: Arc<AtomicU64>,
    /// Token of the buffer currently in `output` (0 = nothing yet).
    published_token: u64,
    output: Option<RgbaImage>,
    sender: Sender<RenderResult>,
    receiver: Receiver<RenderResult>,
    pending: usize,
    /// Background jobs that ran to completion.
    completed: usize,
}

impl Renderer {
    /// Create an orchestrator holding `settings`.  Nothing is rendered until
    /// [`request`](Self::request), [`set_settings`](Self::set_settings) or
    /// [`render_now`](Self::render_now) is called.
    pub fn new(settings: GrainSettings) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            settings,
            token: 0,
            latest: Arc::new(AtomicU64::new(0)),
            published_token: 0,
            output: None,
            sender,
            receiver,
            pending: 0,
            completed: 0,
        }
    }

    pub fn settings(&self) -> &GrainSettings {
        &self.settings
    }

    /// Latest finished buffer for the newest completed request, if any.
    pub fn output(&self) -> Option<&RgbaImage> {
        self.output.as_ref()
    }

    pub fn take_output(&mut self) -> Option<RgbaImage> {
        self.output.take()
    }

    pub fn latest_token(&self) -> u64 {
        self.token
    }

    pub fn published_token(&self) -> u64 {
        self.published_token
    }

    /// True while the newest request has not been published yet.
    pub fn is_stale(&self) -> bool {
        self.published_token != self.token
    }

    pub fn pending_jobs(&self) -> usize {
        self.pending
    }

    /// Background jobs that produced a buffer (published or not).
    pub fn completed_renders(&self) -> usize {
        self.completed
    }

    fn bump_token(&mut self) -> u64 {
        self.token = self.token.wrapping_add(1);
        self.latest.store(self.token, Ordering::Release);
        self.token
    }

    /// Replace the settings and start a background render.  Identical
    /// settings are ignored once a render for them exists or is in flight.
    /// Returns the token of the new request, or `None` if nothing changed.
    pub fn set_settings(&mut self, settings: GrainSettings) -> Option<u64> {
        if settings == self.settings && self.token != 0 {
            return None;
        }
        self.settings = settings;
        Some(self.request())
    }

    /// Start a background render of the current settings.
    pub fn request(&mut self) -> u64 {
        let token = self.bump_token();
        let settings = self.settings.clone();
        let sender = self.sender.clone();
        let latest = Arc::clone(&self.latest);
        self.pending += 1;

        rayon::spawn(move || {
            let _ = sender.send(run_job(token, &settings, &latest));
        });
        token
    }

    /// Render the current settings on this thread and publish immediately.
    /// Any render still in flight becomes stale.
    pub fn render_now(&mut self) -> &RgbaImage {
        self.bump_token();
        let image = compositor::render(&self.settings);
        self.published_token = self.token;
        self.output.insert(image)
    }

    /// Accept or discard one finished render.  Returns true if it was published.
    fn accept(&mut self, result: RenderResult) -> bool {
        self.pending = self.pending.saturating_sub(1);
        if result.cancelled {
            return false;
        }
        if result.image.is_some() {
            self.completed += 1;
        }
        if result.token != self.token {
            crate::log_info!(
                "Discarding stale render #{} (latest #{})",
                result.token,
                self.token
            );
            return false;
        }
        match result.image {
            Some(image) => {
                crate::log_info!("Published render #{} ({:.0}ms)", result.token, result.elapsed_ms);
                self.output = Some(image);
                self.published_token = result.token;
                true
            }
            None => false,
        }
    }

    /// Drain finished renders without blocking.  Returns true if a new buffer
    /// was published.
    pub fn poll(&mut self) -> bool {
        let mut published = false;
        while let Ok(result) = self.receiver.try_recv() {
            published |= self.accept(result);
        }
        published
    }

    /// Block until the newest request is published (or every in-flight render
    /// has finished without producing it).
    pub fn wait(&mut self) -> Option<&RgbaImage> {
        self.poll();
        while self.is_stale() && self.pending > 0 {
            match self.receiver.recv() {
                Ok(result) => {
                    self.accept(result);
                }
                Err(_) => break,
            }
        }
        if self.is_stale() { None } else { self.output.as_ref() }
    }
}
