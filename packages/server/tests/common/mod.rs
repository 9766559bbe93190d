// Common test utilities

pub mod app;
pub mod harness;

pub use app::*;
pub use harness::*;
