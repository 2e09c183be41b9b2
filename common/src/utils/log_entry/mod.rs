pub mod detection;
pub mod network;
pub mod system;
