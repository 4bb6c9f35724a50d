pub mod command;
pub mod driver;
pub mod error;
pub mod parser;
pub mod report;
pub mod runner;
pub mod strategy;
pub mod utils;
pub mod widget;

// Re-export common items
pub use driver::list_devices;
pub use error::EngineError;
pub use report::generate_report;
pub use runner::{run_use_cases, Controller, ExecutionContext, UseCaseExecutor};
