//! Main UI renderer

use ratatui::Frame;

use crate::core::state::{AppMode, AppState};
use crate::ui::layout::LayoutManager;
use crate::ui::widgets::*;

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let area = frame.area();
        let theme = &state.theme;

        // Clear background
        frame.render_widget(
            ratatui::widgets::Block::default()
                .style(ratatui::style::Style::default().bg(theme.colors.bg_primary)),
            area,
        );

        let layout = LayoutManager::compute(area);

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(HostPanel::new(state, theme), layout.host_panel);
        frame.render_widget(ContainerTable::new(state, theme), layout.container_table);
        frame.render_widget(StatusLine::new(state, theme), layout.status_line);
        frame.render_widget(Footer::new(state, theme), layout.footer);

        // Modal overlays
        match &state.mode {
            AppMode::Dashboard => {}
            AppMode::RenameInput {
                target_name,
                buffer,
                ..
            } => {
                frame.render_widget(
                    RenameDialog::new(target_name, buffer, theme),
                    layout.dialog_area,
                );
            }
            AppMode::ConfirmDelete { target_name, .. } => {
                frame.render_widget(ConfirmDialog::new(target_name, theme), layout.dialog_area);
            }
        }
    }
}
