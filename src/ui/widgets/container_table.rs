//! Container table widget

use humansize::{format_size, BINARY};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::snapshot::ContainerRecord;
use crate::core::state::AppState;
use crate::integrations::docker::ContainerStatus;
use crate::ui::theme::Theme;

const ID_WIDTH: usize = 13;
const NAME_WIDTH: usize = 20;
const IMAGE_WIDTH: usize = 24;
const PORTS_WIDTH: usize = 24;
const STATUS_WIDTH: usize = 11;
const UPTIME_WIDTH: usize = 9;

pub struct ContainerTable<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> ContainerTable<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn header_line(&self) -> Line<'a> {
        let text = format!(
            "  {:<ID_WIDTH$}{:<NAME_WIDTH$}{:<IMAGE_WIDTH$}{:<PORTS_WIDTH$}{:<STATUS_WIDTH$}{:<UPTIME_WIDTH$}{}",
            "ID", "NAME", "IMAGE", "PORTS", "STATUS", "UPTIME", "RAM"
        );
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(self.theme.colors.fg_muted)
                .add_modifier(ratatui::style::Modifier::BOLD),
        ))
    }

    fn container_row(&self, container: &ContainerRecord, selected: bool) -> Line<'a> {
        let status_style = match container.status {
            ContainerStatus::Running => self.theme.styles.status_running,
            ContainerStatus::Exited | ContainerStatus::Dead => self.theme.styles.status_stopped,
            ContainerStatus::Paused | ContainerStatus::Restarting => {
                self.theme.styles.status_warning
            }
            _ => self.theme.styles.list_item,
        };

        let base_style = if selected {
            self.theme.styles.list_item_selected
        } else {
            self.theme.styles.list_item
        };
        let indicator = if selected { "▸ " } else { "  " };

        let memory = if container.memory_bytes > 0 {
            format_size(container.memory_bytes, BINARY)
        } else {
            "-".to_string()
        };

        Line::from(vec![
            Span::styled(indicator, base_style),
            Span::styled(
                format!("{:<ID_WIDTH$}", container.short_id()),
                base_style.fg(self.theme.colors.fg_muted),
            ),
            Span::styled(
                format!("{:<NAME_WIDTH$}", pad(&container.name, NAME_WIDTH - 1)),
                base_style,
            ),
            Span::styled(
                format!("{:<IMAGE_WIDTH$}", pad(&container.image, IMAGE_WIDTH - 1)),
                base_style.fg(self.theme.colors.fg_secondary),
            ),
            Span::styled(
                format!(
                    "{:<PORTS_WIDTH$}",
                    pad(&container.ports_display(), PORTS_WIDTH - 1)
                ),
                base_style.fg(self.theme.colors.accent_secondary),
            ),
            Span::styled(
                format!("{:<STATUS_WIDTH$}", container.status.to_string()),
                if selected { base_style } else { status_style },
            ),
            Span::styled(
                format!("{:<UPTIME_WIDTH$}", container.uptime_display()),
                base_style,
            ),
            Span::styled(memory, base_style.fg(self.theme.colors.accent_primary)),
        ])
    }
}

impl<'a> Widget for ContainerTable<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(" CONTAINERS ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let containers = &self.state.list.containers;
        if containers.is_empty() {
            let msg = if self.state.runtime_error.is_some() {
                "Docker unavailable"
            } else if self.state.refreshing {
                "Loading..."
            } else {
                "No containers"
            };
            let span = Span::styled(msg, Style::default().fg(self.theme.colors.fg_muted));
            buf.set_span(inner.x + 2, inner.y, &span, inner.width.saturating_sub(3));
            return;
        }

        buf.set_line(inner.x, inner.y, &self.header_line(), inner.width);

        // Scroll so the selected row stays visible.
        let visible = inner.height.saturating_sub(1) as usize;
        if visible == 0 {
            return;
        }
        let selected = self.state.list.selected.unwrap_or(0);
        let offset = (selected + 1).saturating_sub(visible);

        for (row, (i, container)) in containers
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .enumerate()
        {
            let line = self.container_row(container, Some(i) == self.state.list.selected);
            buf.set_line(inner.x, inner.y + 1 + row as u16, &line, inner.width);
        }
    }
}

fn pad(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_truncates_long_names_with_ellipsis() {
        assert_eq!(pad("short", 10), "short");
        assert_eq!(pad("a-very-long-container-name", 10), "a-very-lo…");
    }
}
