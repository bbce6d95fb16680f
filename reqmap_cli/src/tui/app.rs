//! TUI application state and event handling

use crate::config::MethodColors;
use crate::export;
use crate::tree::{assign_positions, build_tree, CollapseStates, TreeNode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use reqmap_common::{CaptureStatus, RequestRecord};
use std::path::Path;

/// Horizontal cells per tree depth level
pub const STEP_X: f64 = 28.0;
/// Vertical cells per layout unit
pub const STEP_Y: f64 = 2.0;

/// Default export file names
pub const JSON_EXPORT_FILE: &str = "captured_requests.json";
pub const IMAGE_EXPORT_FILE: &str = "mindmap.jpg";

/// Events that can be sent to the TUI
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Fresh record snapshot from the capture engine
    Snapshot(Vec<RequestRecord>),
    /// Capture status changed
    StatusUpdate(CaptureStatus),
    /// Key event from terminal
    Key(KeyEvent),
    /// Tick for periodic redraw
    Tick,
}

/// TUI application state
pub struct MapApp {
    pub requests: Vec<RequestRecord>,
    pub root: TreeNode,
    pub collapse_states: CollapseStates,
    pub colors: MethodColors,
    pub status: CaptureStatus,
    /// Index into the depth-first sequence of displayed nodes
    pub selected: usize,
    /// Record shown in the detail overlay, when open
    pub overlay: Option<RequestRecord>,
    /// Transient footer message (export results)
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl MapApp {
    pub fn new(colors: MethodColors) -> Self {
        let mut app = Self {
            requests: Vec::new(),
            root: TreeNode::new(""),
            collapse_states: CollapseStates::new(),
            colors,
            status: CaptureStatus {
                is_capturing: false,
                active_tab_id: None,
            },
            selected: 0,
            overlay: None,
            notice: None,
            should_quit: false,
        };
        app.rebuild();
        app
    }

    /// Rebuild the tree from the current snapshot, preserving collapse
    /// states and re-running the layout pass.
    fn rebuild(&mut self) {
        self.root = build_tree(&self.requests, &self.collapse_states);
        assign_positions(&mut self.root, 0.0, 0.0, STEP_X, STEP_Y);
        let visible = self.root.visible_nodes().len();
        if self.selected >= visible {
            self.selected = visible.saturating_sub(1);
        }
    }

    /// Number of currently displayed nodes
    pub fn visible_count(&self) -> usize {
        self.root.visible_nodes().len()
    }

    /// The currently selected node
    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.root.visible_nodes().get(self.selected).copied()
    }

    /// Handle TUI event
    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Snapshot(requests) => {
                self.requests = requests;
                self.rebuild();
            }
            TuiEvent::StatusUpdate(status) => self.status = status,
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Tick => {} // Just triggers a redraw
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) {
        // The overlay swallows everything except close keys
        if self.overlay.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('i') | KeyCode::Char('q')) {
                self.overlay = None;
            } else if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
                self.should_quit = true;
            }
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
                self.should_quit = true;
            }
            (KeyCode::Up | KeyCode::Char('k'), _) => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            (KeyCode::Down | KeyCode::Char('j'), _) => {
                if self.selected + 1 < self.visible_count() {
                    self.selected += 1;
                }
            }
            (KeyCode::Home, _) => self.selected = 0,
            (KeyCode::End, _) => self.selected = self.visible_count().saturating_sub(1),
            (KeyCode::Enter | KeyCode::Char(' '), _) => self.toggle_selected(),
            (KeyCode::Char('i'), _) => {
                self.overlay = self.selected_node().and_then(|node| node.record.clone());
            }
            (KeyCode::Char('e'), _) => self.export_json(),
            (KeyCode::Char('p'), _) => self.export_image(),
            _ => {}
        }
    }

    /// Flip the collapse flag of the selected node, remember it by
    /// label, and re-render.
    fn toggle_selected(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        if !node.has_children() {
            return;
        }
        let label = node.label.clone();
        let flipped = !node.collapsed;
        self.collapse_states.insert(label, flipped);
        self.rebuild();
    }

    fn export_json(&mut self) {
        self.notice = Some(
            match export::export_json(&self.requests, Path::new(JSON_EXPORT_FILE)) {
                Ok(()) => format!("Exported {}", JSON_EXPORT_FILE),
                Err(err) => format!("JSON export failed: {err:#}"),
            },
        );
    }

    fn export_image(&mut self) {
        // Fresh tree so the export layout (pixel spacing) never touches
        // the on-screen coordinates
        let mut root = build_tree(&self.requests, &self.collapse_states);
        self.notice = Some(
            match export::export_jpeg(&mut root, &self.colors, Path::new(IMAGE_EXPORT_FILE)) {
                Ok(()) => format!("Exported {}", IMAGE_EXPORT_FILE),
                Err(err) => format!("Image export failed: {err:#}"),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn record(id: &str, url: &str, status: Option<u16>) -> RequestRecord {
        RequestRecord {
            id: id.to_string(),
            url: url.to_string(),
            method: "GET".to_string(),
            initiator: "N/A".to_string(),
            time_stamp: Utc::now(),
            status_code: status,
            body: None,
            is_web_socket: false,
        }
    }

    fn app_with_two_domains() -> MapApp {
        let mut app = MapApp::new(MethodColors::default());
        app.handle_event(TuiEvent::Snapshot(vec![
            record("1", "https://a.com/x", Some(200)),
            record("2", "https://b.com/y", Some(200)),
        ]));
        app
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut app = app_with_two_domains();
        // root, a.com, leaf, url, b.com, leaf, url
        assert_eq!(app.visible_count(), 7);

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected, 0);
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.selected, 6);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected, 6);
        app.handle_key(key(KeyCode::Home));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_toggle_collapses_and_restores() {
        let mut app = app_with_two_domains();
        app.handle_key(key(KeyCode::Down)); // a.com
        assert_eq!(app.selected_node().unwrap().label, "a.com");

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.collapse_states.get("a.com"), Some(&true));
        // a.com's leaf and url disappear from the visible set
        assert_eq!(app.visible_count(), 5);

        let before = app.root.clone();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.visible_count(), 7);

        // Toggling back restores identical structure and positions
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.root, before);
    }

    #[test]
    fn test_toggle_ignored_on_leaf() {
        let mut app = app_with_two_domains();
        app.handle_key(key(KeyCode::End)); // url leaf under b.com
        assert!(!app.selected_node().unwrap().has_children());

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.visible_count(), 7);
        assert!(app.collapse_states.is_empty());
    }

    #[test]
    fn test_refresh_preserves_collapse_state() {
        let mut app = app_with_two_domains();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter)); // collapse a.com

        // New snapshot arrives with an extra request
        app.handle_event(TuiEvent::Snapshot(vec![
            record("1", "https://a.com/x", Some(200)),
            record("2", "https://b.com/y", Some(200)),
            record("3", "https://a.com/z", Some(404)),
        ]));

        let visible = app.root.visible_nodes();
        let a = visible.iter().find(|n| n.label == "a.com").unwrap();
        assert!(a.collapsed);
    }

    #[test]
    fn test_info_overlay_opens_for_record_nodes() {
        let mut app = app_with_two_domains();
        app.handle_key(key(KeyCode::Char('i')));
        assert!(app.overlay.is_none()); // root carries no record

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down)); // GET - 200 leaf
        app.handle_key(key(KeyCode::Char('i')));
        assert_eq!(app.overlay.as_ref().unwrap().id, "1");

        app.handle_key(key(KeyCode::Esc));
        assert!(app.overlay.is_none());
    }

    #[test]
    fn test_selection_clamped_when_tree_shrinks() {
        let mut app = app_with_two_domains();
        app.handle_key(key(KeyCode::End));
        app.handle_event(TuiEvent::Snapshot(vec![record(
            "1",
            "https://a.com/x",
            Some(200),
        )]));
        assert!(app.selected < app.visible_count());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with_two_domains();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
