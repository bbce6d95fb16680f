//! Capture session state: the capture flag and the target-tab filter

use reqmap_common::{CaptureStatus, TabId};

/// At most one capture session is active at a time. Starting a new one
/// retargets the tab filter; the record store is cleared by the engine.
#[derive(Debug, Default)]
pub struct CaptureSession {
    is_capturing: bool,
    active_tab_id: Option<TabId>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable capture for the given tab. Idempotent: calling while
    /// already capturing simply retargets.
    pub fn start(&mut self, tab_id: TabId) {
        self.is_capturing = true;
        self.active_tab_id = Some(tab_id);
    }

    /// Disable capture. Records already collected remain queryable.
    pub fn stop(&mut self) {
        self.is_capturing = false;
    }

    /// Whether an event for `tab_id` should be recorded. Events for
    /// other tabs are silently dropped to scope capture to one tab.
    pub fn accepts(&self, tab_id: TabId) -> bool {
        self.is_capturing && self.active_tab_id == Some(tab_id)
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus {
            is_capturing: self.is_capturing,
            active_tab_id: self.active_tab_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_idempotent() {
        let mut session = CaptureSession::new();
        assert!(!session.status().is_capturing);

        session.start(5);
        session.start(5);
        assert!(session.accepts(5));

        session.stop();
        session.stop();
        assert!(!session.accepts(5));
        // Target tab is remembered across stop
        assert_eq!(session.status().active_tab_id, Some(5));
    }

    #[test]
    fn test_retarget_while_capturing() {
        let mut session = CaptureSession::new();
        session.start(5);
        session.start(9);
        assert!(!session.accepts(5));
        assert!(session.accepts(9));
    }

    #[test]
    fn test_rejects_other_tabs() {
        let mut session = CaptureSession::new();
        session.start(5);
        assert!(!session.accepts(6));
        assert!(!session.accepts(-1));
    }
}
