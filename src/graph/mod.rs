pub mod builder;
pub mod ring;
pub mod types;
