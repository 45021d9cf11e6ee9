//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::AppState;
use crate::integrations::docker::ContainerStatus;
use crate::ui::theme::Theme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.header);

        let containers = &self.state.list.containers;
        let running = containers
            .iter()
            .filter(|c| c.status == ContainerStatus::Running)
            .count();
        let docker_status = format!("🐳 {}/{} running", running, containers.len());

        let mut spans = vec![
            Span::styled(
                " DOCKMON ",
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(ratatui::style::Modifier::BOLD),
            ),
            Span::styled("│ ", Style::default().fg(self.theme.colors.fg_muted)),
            Span::styled(
                docker_status,
                Style::default().fg(self.theme.colors.fg_primary),
            ),
        ];

        if self.state.refreshing {
            spans.push(Span::styled(
                " │ ",
                Style::default().fg(self.theme.colors.fg_muted),
            ));
            spans.push(Span::styled(
                "refreshing…",
                Style::default().fg(self.theme.colors.fg_muted),
            ));
        }

        let left_line = Line::from(spans);
        buf.set_line(area.x, area.y, &left_line, area.width);

        // Clock on the right
        let time = chrono::Local::now().format("%H:%M").to_string();
        let time_span = Span::styled(&time, Style::default().fg(self.theme.colors.fg_muted));
        let time_x = area.x + area.width.saturating_sub(time.len() as u16 + 1);
        buf.set_span(time_x, area.y, &time_span, time.len() as u16);
    }
}
