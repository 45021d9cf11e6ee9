//! Status line widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::Widget,
};

use crate::core::state::{AppState, StatusLevel};
use crate::ui::theme::Theme;

pub struct StatusLine<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> StatusLine<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for StatusLine<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(self.theme.colors.bg_primary));

        // A runtime outage outranks transient messages.
        let (text, style) = if let Some(error) = &self.state.runtime_error {
            (error.as_str(), self.theme.styles.status_error)
        } else if let Some(status) = &self.state.status {
            let style = match status.level {
                StatusLevel::Info => self.theme.styles.status_info,
                StatusLevel::Success => self.theme.styles.status_success,
                StatusLevel::Error => self.theme.styles.status_error,
            };
            (status.text.as_str(), style)
        } else {
            return;
        };

        let span = Span::styled(text, style);
        buf.set_span(area.x + 1, area.y, &span, area.width.saturating_sub(2));
    }
}
