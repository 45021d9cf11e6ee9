//! Delete confirmation dialog

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::ui::theme::Theme;

pub struct ConfirmDialog<'a> {
    target_name: &'a str,
    theme: &'a Theme,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(target_name: &'a str, theme: &'a Theme) -> Self {
        Self { target_name, theme }
    }
}

impl<'a> Widget for ConfirmDialog<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(Span::styled(
                " Confirm delete ",
                self.theme.styles.panel_title,
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.colors.error))
            .style(Style::default().bg(self.theme.colors.bg_secondary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let message = Line::from(vec![
            Span::styled(
                "Delete container ",
                Style::default().fg(self.theme.colors.fg_primary),
            ),
            Span::styled(
                self.target_name,
                Style::default()
                    .fg(self.theme.colors.error)
                    .add_modifier(ratatui::style::Modifier::BOLD),
            ),
            Span::styled("?", Style::default().fg(self.theme.colors.fg_primary)),
        ]);
        buf.set_line(inner.x + 1, inner.y, &message, inner.width.saturating_sub(2));

        if inner.height >= 3 {
            let buttons = Line::from(vec![
                Span::styled("[d/y]", self.theme.styles.keybind_key),
                Span::styled(" delete   ", self.theme.styles.keybind),
                Span::styled("[any key]", self.theme.styles.keybind_key),
                Span::styled(" cancel", self.theme.styles.keybind),
            ]);
            buf.set_line(
                inner.x + 1,
                inner.y + 2,
                &buttons,
                inner.width.saturating_sub(2),
            );
        }
    }
}
