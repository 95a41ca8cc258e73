// src/config/mod.rs
mod types;

pub use types::{load_requests, Layout, UserNaming, WriterConfig};
