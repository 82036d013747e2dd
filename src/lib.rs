pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod reference;
pub mod shell;
