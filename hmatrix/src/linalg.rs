//! # Linear algebra utilities
pub mod aca;
pub mod types;
