//! Kernel module - server infrastructure and dependencies.

pub mod deadline;
pub mod deps;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deadline::with_deadline;
pub use deps::{LogOtpSender, ServerDeps, TwilioAdapter};
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::TestDependencies;
pub use traits::*;
