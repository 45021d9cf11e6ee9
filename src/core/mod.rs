pub mod app;
pub mod events;
pub mod snapshot;
pub mod state;
