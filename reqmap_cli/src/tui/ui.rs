//! TUI rendering functions
//!
//! The mind map is drawn on a canvas: straight connector lines between a
//! node and each child it currently displays, and labels at the layout
//! coordinates, colored per method with the error pair overriding on
//! status >= 500.

use super::app::MapApp;
use crate::config::Rgb;
use crate::tree::TreeNode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine},
        Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame,
};

const CONNECTOR_COLOR: Color = Color::Rgb(0x34, 0x98, 0xdb);

/// Draw the TUI
pub fn draw(frame: &mut Frame, app: &MapApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status line
            Constraint::Min(5),    // Mind map canvas
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    draw_status_line(frame, app, chunks[0]);
    draw_map(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);

    if let Some(record) = &app.overlay {
        draw_detail_overlay(frame, record, frame.area());
    }
}

fn draw_status_line(frame: &mut Frame, app: &MapApp, area: Rect) {
    let (capture_text, capture_color) = if app.status.is_capturing {
        ("capturing", Color::Green)
    } else {
        ("stopped", Color::Red)
    };
    let tab_text = app
        .status
        .active_tab_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    let line = Line::from(vec![
        Span::styled(" reqmap ", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(capture_text, Style::default().fg(capture_color)),
        Span::styled(" tab ", Style::default().fg(Color::DarkGray)),
        Span::styled(tab_text, Style::default().fg(Color::White)),
        Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{} requests", app.requests.len()),
            Style::default().fg(Color::White),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the mind map canvas, scrolled so the selected node stays visible
fn draw_map(frame: &mut Frame, app: &MapApp, area: Rect) {
    let visible = app.root.visible_nodes();

    let inner_width = area.width.saturating_sub(2).max(1) as f64;
    let inner_height = area.height.saturating_sub(2).max(1) as f64;

    let selected = visible.get(app.selected).copied();
    let (scroll_x, scroll_y) = scroll_origin(selected, inner_width, inner_height);

    let block = Block::default()
        .title(" Mind Map ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([scroll_x, scroll_x + inner_width])
        // Canvas y grows upward; tree y grows downward, so flip
        .y_bounds([-(scroll_y + inner_height), -scroll_y])
        .paint(|ctx| {
            paint_connectors(ctx, &app.root);
            ctx.layer();
            for (index, node) in visible.iter().enumerate() {
                paint_node(ctx, app, node, index == app.selected);
            }
        });

    frame.render_widget(canvas, area);
}

/// Top-left corner of the viewport in tree coordinates
fn scroll_origin(selected: Option<&TreeNode>, width: f64, height: f64) -> (f64, f64) {
    let Some(node) = selected else {
        return (0.0, 0.0);
    };
    // Keep the selected node roughly centered once it leaves the first
    // screenful
    let x = (node.x - width / 2.0).max(0.0);
    let y = (node.y - height / 2.0).max(0.0);
    (x, y)
}

fn paint_connectors(ctx: &mut Context, node: &TreeNode) {
    if node.collapsed {
        return;
    }
    for child in &node.children {
        ctx.draw(&CanvasLine {
            x1: node.x,
            y1: -node.y,
            x2: child.x,
            y2: -child.y,
            color: CONNECTOR_COLOR,
        });
        paint_connectors(ctx, child);
    }
}

fn paint_node(ctx: &mut Context, app: &MapApp, node: &TreeNode, is_selected: bool) {
    let mut style = match node.record.as_ref().and_then(|r| app.colors.for_record(r)) {
        Some((background, foreground)) => Style::default()
            .bg(to_color(background))
            .fg(to_color(foreground)),
        None => Style::default().fg(Color::White),
    };
    if is_selected {
        style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
    }

    let marker = if node.has_children() {
        if node.collapsed {
            "[+] "
        } else {
            "[-] "
        }
    } else {
        ""
    };

    ctx.print(
        node.x,
        -node.y,
        Line::from(Span::styled(format!("{marker}{}", node.label), style)),
    );
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Floating detail overlay showing the full record as formatted JSON
fn draw_detail_overlay(frame: &mut Frame, record: &reqmap_common::RequestRecord, area: Rect) {
    let popup = centered_rect(70, 70, area);

    let text = serde_json::to_string_pretty(record)
        .unwrap_or_else(|err| format!("Failed to format record: {err}"));

    let block = Block::default()
        .title(" Request Details (Esc to close) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

fn draw_footer(frame: &mut Frame, app: &MapApp, area: Rect) {
    let line = match &app.notice {
        Some(notice) => Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(vec![
            Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
            Span::styled(" Navigate  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::styled(" Collapse  ", Style::default().fg(Color::DarkGray)),
            Span::styled("i", Style::default().fg(Color::Cyan)),
            Span::styled(" Details  ", Style::default().fg(Color::DarkGray)),
            Span::styled("e", Style::default().fg(Color::Cyan)),
            Span::styled(" JSON  ", Style::default().fg(Color::DarkGray)),
            Span::styled("p", Style::default().fg(Color::Cyan)),
            Span::styled(" Image  ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::styled(" Quit", Style::default().fg(Color::DarkGray)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Centered rect sized as a percentage of the containing area
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
