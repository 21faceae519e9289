pub mod actor;
mod client;
mod config;
pub mod dto;

pub use actor::{LibraryCommand, LibraryEvent, spawn_library_actor};
pub use client::LibraryClient;
pub use config::LibraryClientConfig;
