pub mod composite;
pub mod resample;
