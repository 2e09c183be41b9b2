pub mod config;
pub mod default;
pub mod detection;
pub mod domain;
pub mod javascript;
pub mod log;
pub mod session;
