//! Rename input dialog

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::ui::theme::Theme;

pub struct RenameDialog<'a> {
    target_name: &'a str,
    buffer: &'a str,
    theme: &'a Theme,
}

impl<'a> RenameDialog<'a> {
    pub fn new(target_name: &'a str, buffer: &'a str, theme: &'a Theme) -> Self {
        Self {
            target_name,
            buffer,
            theme,
        }
    }
}

impl<'a> Widget for RenameDialog<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(Span::styled(" Rename ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_secondary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let prompt = Line::from(vec![
            Span::styled(
                "New name for ",
                Style::default().fg(self.theme.colors.fg_secondary),
            ),
            Span::styled(
                self.target_name,
                Style::default()
                    .fg(self.theme.colors.fg_primary)
                    .add_modifier(ratatui::style::Modifier::BOLD),
            ),
            Span::styled(":", Style::default().fg(self.theme.colors.fg_secondary)),
        ]);
        buf.set_line(inner.x + 1, inner.y, &prompt, inner.width.saturating_sub(2));

        if inner.height >= 3 {
            // Block cursor after the typed text.
            let input = Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.colors.accent_primary)),
                Span::styled(
                    self.buffer,
                    Style::default().fg(self.theme.colors.fg_primary),
                ),
                Span::styled("█", Style::default().fg(self.theme.colors.fg_primary)),
            ]);
            buf.set_line(
                inner.x + 1,
                inner.y + 2,
                &input,
                inner.width.saturating_sub(2),
            );
        }
    }
}
