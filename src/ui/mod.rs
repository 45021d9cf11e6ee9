pub mod layout;
pub mod renderer;
pub mod theme;
pub mod widgets;
