pub mod utils;
pub mod detection_client;
pub mod domain_memory;
pub mod orchestrator;
pub mod renderer;
pub mod viewer;
#[cfg(test)]
pub mod testing;
