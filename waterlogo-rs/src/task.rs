//! Request tokens, cancel flags, and the live preview worker.

use crate::compositor::{CompositeOutput, Compositor, SourceImage};
use crate::error::{WaterlogoError, WaterlogoResult};
use crate::settings::WatermarkSettings;
use futures::channel::{mpsc, mpsc::Sender, oneshot};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Identifies one request issued by a [`RequestTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Issues monotonically increasing tokens. Only the latest token is current.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, making every earlier token stale.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// Shared flag checked between batch items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a preview request.
#[derive(Debug)]
pub enum PreviewOutcome {
    Fresh(CompositeOutput),
    /// A newer request was issued; this result must not be shown.
    Stale,
}

impl PreviewOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, PreviewOutcome::Stale)
    }
}

enum PreviewCommand {
    Render {
        token: RequestToken,
        source: SourceImage,
        settings: WatermarkSettings,
        responder: oneshot::Sender<WaterlogoResult<PreviewOutcome>>,
    },
}

/// Renders watermark previews on a dedicated thread, last write wins.
///
/// Requests whose token is no longer current are skipped before rendering,
/// and a render that finishes after a newer request was issued is reported
/// as [`PreviewOutcome::Stale`].
///
/// ```no_run
/// use waterlogo_rs::{Compositor, PreviewWorker, SourceImage, WatermarkSettings};
///
/// let worker = PreviewWorker::new(Compositor::default());
/// let source = SourceImage::new("photo.png", Some("image/png"), std::fs::read("photo.png").unwrap());
/// let outcome = futures::executor::block_on(
///     worker.submit(source, WatermarkSettings::default()).outcome(),
/// ).expect("Failed to render preview");
/// println!("stale: {}", outcome.is_stale());
/// ```
#[derive(Clone)]
pub struct PreviewWorker {
    sender: Sender<PreviewCommand>,
    tracker: RequestTracker,
    _handle: Arc<JoinHandle<()>>,
}

impl PreviewWorker {
    pub fn new(compositor: Compositor) -> Self {
        let (sender, mut receiver) = mpsc::channel::<PreviewCommand>(32);
        let tracker = RequestTracker::new();
        let worker_tracker = tracker.clone();

        let handle = Arc::new(thread::spawn(move || {
            while let Some(cmd) = futures::executor::block_on(receiver.next()) {
                match cmd {
                    PreviewCommand::Render {
                        token,
                        source,
                        settings,
                        responder,
                    } => {
                        if !worker_tracker.is_current(token) {
                            log::debug!(target: "preview", "skipping stale request {:?}", token);
                            responder.send(Ok(PreviewOutcome::Stale)).ok();
                            continue;
                        }
                        let result = compositor
                            .composite(&source, &settings)
                            .map(PreviewOutcome::Fresh);
                        responder.send(result).ok();
                    }
                }
            }
        }));

        Self {
            sender,
            tracker,
            _handle: handle,
        }
    }

    /// Issue a preview request. The token is taken immediately, so a later
    /// submit makes this one stale even before it is awaited.
    pub fn submit(&self, source: SourceImage, settings: WatermarkSettings) -> PendingPreview {
        let token = self.tracker.issue();
        log::debug!(target: "preview", "issued request {:?} for {}", token, source.name);
        PendingPreview {
            token,
            source,
            settings,
            sender: self.sender.clone(),
            tracker: self.tracker.clone(),
        }
    }

    /// Preview the first of `sources`; `None` when there is nothing to show.
    pub fn submit_first(
        &self,
        sources: &[SourceImage],
        settings: &WatermarkSettings,
    ) -> Option<PendingPreview> {
        sources
            .first()
            .map(|source| self.submit(source.clone(), settings.clone()))
    }

    pub async fn request(
        &self,
        source: SourceImage,
        settings: WatermarkSettings,
    ) -> WaterlogoResult<PreviewOutcome> {
        self.submit(source, settings).outcome().await
    }
}

/// A submitted preview request.
pub struct PendingPreview {
    token: RequestToken,
    source: SourceImage,
    settings: WatermarkSettings,
    sender: Sender<PreviewCommand>,
    tracker: RequestTracker,
}

impl PendingPreview {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Send the request to the worker and wait for it.
    pub async fn outcome(mut self) -> WaterlogoResult<PreviewOutcome> {
        let (resp_tx, resp_rx) = oneshot::channel::<WaterlogoResult<PreviewOutcome>>();
        let cmd = PreviewCommand::Render {
            token: self.token,
            source: self.source,
            settings: self.settings,
            responder: resp_tx,
        };

        if let Err(err) = self.sender.send(cmd).await {
            return Err(WaterlogoError::Worker(format!(
                "Failed to send preview request: {err}"
            )));
        }

        let result = match resp_rx.await {
            Ok(result) => result,
            Err(err) => {
                return Err(WaterlogoError::Worker(format!(
                    "Failed to retrieve preview result: {err}"
                )))
            }
        };

        if !self.tracker.is_current(self.token) {
            log::debug!(target: "preview", "discarding stale result {:?}", self.token);
            return Ok(PreviewOutcome::Stale);
        }
        result
    }
}
