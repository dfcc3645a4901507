pub mod engine;
pub mod queue;
pub mod submission;
pub mod trigger;
