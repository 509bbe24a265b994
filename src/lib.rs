pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod instrumentation;
pub mod llm;
pub mod orchestrator;
pub mod store;
#[cfg(test)]
mod testing;
