//! # Tokio Session Driver
//!
//! Runs a [`PreviewSession`] against real collaborators. Token requests and
//! timers run as spawned tasks; their results, and frame callbacks reported
//! through a [`DriverHandle`], all funnel into one channel that
//! [`PreviewDriver::step`] drains, so the session itself only ever sees one
//! event at a time. Cancelling a timer aborts its task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::PreviewError;
use crate::session::{
    LoadId, PreviewSession, PreviewTarget, SessionCommand, SessionEvent, SessionPhase,
};
use crate::token::{IssuedToken, PreviewTokenService, SectionScope};

/// Source of preview tokens.
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    /// Obtain a token for `scope`.
    async fn request_token(&self, scope: SectionScope) -> Result<IssuedToken, PreviewError>;
}

#[async_trait]
impl TokenSource for PreviewTokenService {
    async fn request_token(&self, scope: SectionScope) -> Result<IssuedToken, PreviewError> {
        Ok(self.issue(scope))
    }
}

/// The embedding surface. Implementations report the outcome of each load
/// through a [`DriverHandle`], tagged with the load's [`LoadId`].
pub trait FrameHost: Send + 'static {
    /// Navigate the frame to `src` under the given sandbox policy.
    fn load(&mut self, load: LoadId, src: &Url, sandbox: &'static str);
}

/// Cloneable handle for feeding external callbacks into a driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl DriverHandle {
    /// The frame finished loading.
    pub fn frame_loaded(&self, load: LoadId) {
        self.send(SessionEvent::FrameLoaded { load });
    }

    /// The frame reported an error.
    pub fn frame_error(&self, load: LoadId) {
        self.send(SessionEvent::FrameError { load });
    }

    /// The editor saved the draft.
    pub fn draft_saved(&self) {
        self.send(SessionEvent::DraftSaved { at: Utc::now() });
    }

    /// Tear the session down.
    pub fn close(&self) {
        self.send(SessionEvent::Close);
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("preview driver gone; event dropped");
        }
    }
}

/// Drives one preview session.
pub struct PreviewDriver<F> {
    session: PreviewSession,
    tokens: Arc<dyn TokenSource>,
    frame: F,
    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    timers: HashMap<LoadId, JoinHandle<()>>,
    requests: Vec<JoinHandle<()>>,
}

impl<F: FrameHost> PreviewDriver<F> {
    /// Open a session and execute its opening commands. Must be called
    /// within a tokio runtime.
    pub fn open(
        target: PreviewTarget,
        timeout: Duration,
        tokens: Arc<dyn TokenSource>,
        frame: F,
    ) -> Self {
        let (session, commands) = PreviewSession::open(target, timeout);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut driver = Self {
            session,
            tokens,
            frame,
            tx,
            rx,
            timers: HashMap::new(),
            requests: Vec::new(),
        };
        driver.execute(commands);
        driver
    }

    /// A handle for reporting frame callbacks, saves, and teardown.
    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            tx: self.tx.clone(),
        }
    }

    /// Current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// The underlying session.
    pub fn session(&self) -> &PreviewSession {
        &self.session
    }

    /// The frame host.
    pub fn frame(&self) -> &F {
        &self.frame
    }

    /// Number of armed timers.
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// Wait for the next event, apply it, and return the resulting phase.
    pub async fn step(&mut self) -> SessionPhase {
        if let Some(event) = self.rx.recv().await {
            if let SessionEvent::TimerFired { load } = &event {
                self.timers.remove(load);
            }
            let commands = self.session.handle(event);
            self.execute(commands);
        }
        self.session.phase()
    }

    /// Step until the phase satisfies `done`, returning it.
    pub async fn run_until(&mut self, mut done: impl FnMut(SessionPhase) -> bool) -> SessionPhase {
        let mut phase = self.session.phase();
        while !done(phase) {
            phase = self.step().await;
        }
        phase
    }

    fn execute(&mut self, commands: Vec<SessionCommand>) {
        for command in commands {
            match command {
                SessionCommand::RequestToken { load } => self.request_token(load),
                SessionCommand::LoadFrame { load, src, sandbox } => {
                    tracing::debug!(%load, %src, "loading preview frame");
                    self.frame.load(load, &src, sandbox);
                }
                SessionCommand::StartTimer { load, after } => {
                    let tx = self.tx.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(SessionEvent::TimerFired { load });
                    });
                    if let Some(previous) = self.timers.insert(load, handle) {
                        previous.abort();
                    }
                }
                SessionCommand::CancelTimer { load } => {
                    if let Some(handle) = self.timers.remove(&load) {
                        handle.abort();
                    }
                }
            }
        }
        self.requests.retain(|h| !h.is_finished());
    }

    fn request_token(&mut self, load: LoadId) {
        let tokens = Arc::clone(&self.tokens);
        let scope = self.session.target().scope;
        let tx = self.tx.clone();
        self.requests.push(tokio::spawn(async move {
            let event = match tokens.request_token(scope).await {
                Ok(issued) => SessionEvent::TokenIssued {
                    load,
                    token: issued.token,
                    expires_at: issued.expires_at,
                },
                Err(e) => {
                    tracing::warn!(%load, error = %e, "preview token request failed");
                    SessionEvent::TokenFailed { load }
                }
            };
            let _ = tx.send(event);
        }));
    }
}

impl<F> Drop for PreviewDriver<F> {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
        for handle in self.requests.drain(..) {
            handle.abort();
        }
    }
}
