//! # Preview Session Controller
//!
//! A pure, single-threaded state machine. It consumes [`SessionEvent`]s and
//! returns the [`SessionCommand`]s its host must execute; it performs no
//! I/O and reads no clock.
//!
//! ```text
//!  open ──▶ AwaitingToken ──token──▶ Loading ──loaded──▶ Ready
//!               │                      │
//!               │ token failed         │ frame error / timeout
//!               ▼                      ▼
//!         Unavailable(TokenRequestFailed | FrameError | Timeout)
//! ```
//!
//! Every token request, frame load, and timer belongs to a [`LoadId`]
//! generation. Starting a new load (on save) moves to a new generation, and
//! events tagged with an older one are dropped. Within one generation the
//! first of frame-loaded, frame-error, and timeout to arrive settles the
//! load; the others then find the phase settled and are ignored. Unavailable
//! is sticky: nothing retries until the next save.

use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;

use pcms_core::{PageSlug, SectionKey};

use crate::frame::{RendererEndpoint, SANDBOX_POLICY};
use crate::token::SectionScope;

/// Default time allowed for token issuance plus frame load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Generation of a preview load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

impl LoadId {
    /// Raw generation number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for LoadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Why the preview is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableReason {
    /// The token service failed.
    TokenRequestFailed,
    /// Neither success nor error arrived in time.
    Timeout,
    /// The frame reported a load error.
    FrameError,
}

/// Internal phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Waiting for a token.
    AwaitingToken,
    /// Frame load in flight.
    Loading,
    /// Frame loaded.
    Ready,
    /// Preview failed; no automatic retry.
    Unavailable(UnavailableReason),
    /// Torn down; all further events are ignored.
    Closed,
}

/// What the editor sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewDisplay {
    /// Still loading.
    Loading,
    /// Preview shown.
    Ready,
    /// "Preview unavailable", whatever the cause.
    Unavailable,
    /// Nothing shown.
    Closed,
}

/// Inputs to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The token request for `load` succeeded.
    TokenIssued {
        /// Generation of the request.
        load: LoadId,
        /// Token string.
        token: String,
        /// Token expiry.
        expires_at: DateTime<Utc>,
    },
    /// The token request for `load` failed.
    TokenFailed {
        /// Generation of the request.
        load: LoadId,
    },
    /// The frame finished loading.
    FrameLoaded {
        /// Generation of the load.
        load: LoadId,
    },
    /// The frame reported an error.
    FrameError {
        /// Generation of the load.
        load: LoadId,
    },
    /// The timeout for `load` fired.
    TimerFired {
        /// Generation of the timer.
        load: LoadId,
    },
    /// The editor saved the draft at `at`.
    DraftSaved {
        /// Save time, used to decide whether the token is still valid.
        at: DateTime<Utc>,
    },
    /// The view was torn down or switched to another section.
    Close,
}

/// Effects the host must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Request a token for the session's scope.
    RequestToken {
        /// Generation to tag the response with.
        load: LoadId,
    },
    /// (Re)load the frame.
    LoadFrame {
        /// Generation to tag load/error callbacks with.
        load: LoadId,
        /// Renderer URL including token.
        src: Url,
        /// Sandbox attribute value.
        sandbox: &'static str,
    },
    /// Arm the load timeout.
    StartTimer {
        /// Generation to tag the firing with.
        load: LoadId,
        /// Delay.
        after: Duration,
    },
    /// Disarm the load timeout.
    CancelTimer {
        /// Generation of the timer to cancel.
        load: LoadId,
    },
}

/// What is being previewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTarget {
    /// Token scope.
    pub scope: SectionScope,
    /// Slug of the page, sent as `page`.
    pub page_slug: PageSlug,
    /// Section key, sent as `section`.
    pub section_key: SectionKey,
    /// Renderer base URL.
    pub renderer: RendererEndpoint,
}

#[derive(Debug, Clone)]
struct HeldToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Preview session state machine.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    target: PreviewTarget,
    timeout: Duration,
    phase: SessionPhase,
    current: LoadId,
    timer: Option<LoadId>,
    token: Option<HeldToken>,
}

impl PreviewSession {
    /// Open a session: request a token and arm the timeout.
    pub fn open(target: PreviewTarget, timeout: Duration) -> (Self, Vec<SessionCommand>) {
        let load = LoadId(1);
        let session = Self {
            target,
            timeout,
            phase: SessionPhase::AwaitingToken,
            current: load,
            timer: Some(load),
            token: None,
        };
        let commands = vec![
            SessionCommand::StartTimer {
                load,
                after: timeout,
            },
            SessionCommand::RequestToken { load },
        ];
        (session, commands)
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current load generation.
    pub fn current_load(&self) -> LoadId {
        self.current
    }

    /// The target being previewed.
    pub fn target(&self) -> &PreviewTarget {
        &self.target
    }

    /// The user-visible state.
    pub fn display(&self) -> PreviewDisplay {
        match self.phase {
            SessionPhase::AwaitingToken | SessionPhase::Loading => PreviewDisplay::Loading,
            SessionPhase::Ready => PreviewDisplay::Ready,
            SessionPhase::Unavailable(_) => PreviewDisplay::Unavailable,
            SessionPhase::Closed => PreviewDisplay::Closed,
        }
    }

    /// Apply an event, returning the commands to execute.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionCommand> {
        if self.phase == SessionPhase::Closed {
            return Vec::new();
        }
        match event {
            SessionEvent::Close => {
                self.phase = SessionPhase::Closed;
                self.disarm().into_iter().collect()
            }
            SessionEvent::DraftSaved { at } => self.reload(at),
            SessionEvent::TokenIssued {
                load,
                token,
                expires_at,
            } => {
                if !self.is_current(load) || self.phase != SessionPhase::AwaitingToken {
                    return self.stale("token issued", load);
                }
                let src =
                    self.target
                        .renderer
                        .preview_url(&self.target.page_slug, &self.target.section_key, &token);
                self.token = Some(HeldToken { token, expires_at });
                self.phase = SessionPhase::Loading;
                vec![SessionCommand::LoadFrame {
                    load,
                    src,
                    sandbox: SANDBOX_POLICY,
                }]
            }
            SessionEvent::TokenFailed { load } => {
                if !self.is_current(load) || self.phase != SessionPhase::AwaitingToken {
                    return self.stale("token failed", load);
                }
                self.fail(UnavailableReason::TokenRequestFailed)
            }
            SessionEvent::FrameLoaded { load } => {
                if !self.is_current(load) || self.phase != SessionPhase::Loading {
                    return self.stale("frame loaded", load);
                }
                self.phase = SessionPhase::Ready;
                self.disarm().into_iter().collect()
            }
            SessionEvent::FrameError { load } => {
                if !self.is_current(load) || self.phase != SessionPhase::Loading {
                    return self.stale("frame error", load);
                }
                self.fail(UnavailableReason::FrameError)
            }
            SessionEvent::TimerFired { load } => {
                if self.timer != Some(load) {
                    return self.stale("timer fired", load);
                }
                self.timer = None;
                self.phase = SessionPhase::Unavailable(UnavailableReason::Timeout);
                tracing::warn!(%load, "preview timed out");
                Vec::new()
            }
        }
    }

    fn reload(&mut self, at: DateTime<Utc>) -> Vec<SessionCommand> {
        let mut commands: Vec<SessionCommand> = self.disarm().into_iter().collect();
        let load = LoadId(self.current.0 + 1);
        self.current = load;
        self.timer = Some(load);
        commands.push(SessionCommand::StartTimer {
            load,
            after: self.timeout,
        });

        match self.token.as_ref().filter(|held| at < held.expires_at) {
            Some(held) => {
                let src = self.target.renderer.preview_url(
                    &self.target.page_slug,
                    &self.target.section_key,
                    &held.token,
                );
                self.phase = SessionPhase::Loading;
                commands.push(SessionCommand::LoadFrame {
                    load,
                    src,
                    sandbox: SANDBOX_POLICY,
                });
            }
            None => {
                self.token = None;
                self.phase = SessionPhase::AwaitingToken;
                commands.push(SessionCommand::RequestToken { load });
            }
        }
        commands
    }

    fn fail(&mut self, reason: UnavailableReason) -> Vec<SessionCommand> {
        self.phase = SessionPhase::Unavailable(reason);
        tracing::warn!(load = %self.current, ?reason, "preview unavailable");
        self.disarm().into_iter().collect()
    }

    fn disarm(&mut self) -> Option<SessionCommand> {
        self.timer
            .take()
            .map(|load| SessionCommand::CancelTimer { load })
    }

    fn is_current(&self, load: LoadId) -> bool {
        load == self.current
    }

    fn stale(&self, what: &'static str, load: LoadId) -> Vec<SessionCommand> {
        tracing::debug!(%load, current = %self.current, phase = ?self.phase, what, "ignoring stale preview event");
        Vec::new()
    }
}
