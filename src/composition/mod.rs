pub mod model;
pub mod job;
