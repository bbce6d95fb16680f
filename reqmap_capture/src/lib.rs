//! Reqmap Capture - in-memory request ledger and capture lifecycle
//!
//! The engine task consumes lifecycle events from the interception
//! facility and serves the four-command messaging contract. UI surfaces
//! talk to it through the clonable [`CaptureHandle`].

mod engine;
mod session;
mod store;

pub use engine::{spawn_engine, CaptureError, CaptureHandle};
pub use session::CaptureSession;
pub use store::RecordStore;
