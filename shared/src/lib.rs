pub mod envelope;
pub mod protocol;
pub mod types;
