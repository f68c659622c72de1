//! API route handlers

pub mod mappings;
pub mod status;
pub mod stream;
