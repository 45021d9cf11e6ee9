//! Host CPU/RAM panel

use humansize::{format_size, BINARY};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Borders, Widget},
};

use crate::core::state::AppState;
use crate::ui::theme::Theme;

const BAR_WIDTH: usize = 20;

pub struct HostPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> HostPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for HostPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(" HOST ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        let metrics = &self.state.metrics;

        if inner.height >= 1 {
            let cpu_label = format!(
                "CPU {} {:>5.1}%",
                percent_bar(metrics.cpu_percent),
                metrics.cpu_percent
            );
            let span = Span::styled(cpu_label, self.theme.styles.gauge);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
        }

        if inner.height >= 2 {
            let mem_label = format!(
                "MEM {} {:>5.1}%  {} / {}",
                percent_bar(metrics.memory_percent()),
                metrics.memory_percent(),
                format_size(metrics.memory_used_bytes, BINARY),
                format_size(metrics.memory_total_bytes, BINARY),
            );
            let span = Span::styled(mem_label, self.theme.styles.gauge);
            buf.set_span(
                inner.x + 1,
                inner.y + 1,
                &span,
                inner.width.saturating_sub(2),
            );
        }
    }
}

fn percent_bar(percent: f32) -> String {
    // Clamp to prevent overflow when percent > 100
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f32) as usize;
    "█".repeat(filled) + &"░".repeat(BAR_WIDTH - filled)
}
