pub mod batch;
pub mod progress;
pub mod sink;
