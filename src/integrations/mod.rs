pub mod docker;
pub mod ports;
pub mod system;
