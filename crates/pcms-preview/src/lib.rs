//! # pcms-preview: Live Preview of Draft Content
//!
//! An editor previews a draft by embedding the external renderer in a
//! sandboxed frame. The renderer fetches the draft with a short-lived token
//! scoped to exactly one (organization, page, section) triple.
//!
//! - [`token`]: issues and validates those tokens. Only SHA-256 digests of
//!   tokens are held; rejections are distinguished in logs but not to
//!   callers.
//! - [`frame`]: the renderer URL contract and sandbox policy.
//! - [`session`]: a pure state machine coordinating token request, frame
//!   load, and the load timeout. Each frame load carries a [`LoadId`]
//!   generation so late callbacks from an earlier load are ignored.
//! - [`driver`]: runs a session on tokio with real timers.

pub mod driver;
pub mod error;
pub mod frame;
pub mod session;
pub mod token;

pub use driver::{DriverHandle, FrameHost, PreviewDriver, TokenSource};
pub use error::{PreviewError, TokenRejection};
pub use frame::{preview_url, RendererEndpoint, SANDBOX_POLICY};
pub use session::{
    LoadId, PreviewDisplay, PreviewSession, PreviewTarget, SessionCommand, SessionEvent,
    SessionPhase, UnavailableReason, DEFAULT_LOAD_TIMEOUT,
};
pub use token::{IssuedToken, PreviewTokenService, SectionScope, DEFAULT_TOKEN_TTL_SECS};
