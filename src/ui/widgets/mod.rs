//! UI widgets

mod confirm_dialog;
mod container_table;
mod footer;
mod header;
mod host_panel;
mod rename_dialog;
mod status_line;

pub use confirm_dialog::ConfirmDialog;
pub use container_table::ContainerTable;
pub use footer::Footer;
pub use header::Header;
pub use host_panel::HostPanel;
pub use rename_dialog::RenameDialog;
pub use status_line::StatusLine;
