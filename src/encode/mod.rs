pub mod png;
pub mod archive;
