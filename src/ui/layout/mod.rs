//! Layout management system

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Computed rects for the dashboard panels
#[derive(Debug, Clone, Default)]
pub struct ComputedLayout {
    pub header: Rect,
    pub host_panel: Rect,
    pub container_table: Rect,
    pub status_line: Rect,
    pub footer: Rect,
    pub dialog_area: Rect,
}

pub struct LayoutManager;

impl LayoutManager {
    /// Compute all panel rects based on terminal size
    pub fn compute(area: Rect) -> ComputedLayout {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(4), // Host gauges
                Constraint::Min(5),    // Container table
                Constraint::Length(1), // Status line
                Constraint::Length(1), // Footer
            ])
            .split(area);

        ComputedLayout {
            header: chunks[0],
            host_panel: chunks[1],
            container_table: chunks[2],
            status_line: chunks[3],
            footer: chunks[4],
            dialog_area: Self::centered_rect(50, 25, area),
        }
    }

    /// Create a centered rect with given percentage width/height
    pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
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
            .split(popup_layout[1])[1]
    }
}
