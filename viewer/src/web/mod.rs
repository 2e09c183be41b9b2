pub mod api;
pub mod utils;
