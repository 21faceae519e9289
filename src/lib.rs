pub mod audio_worker;
pub mod cli;
pub mod console;
pub mod core;
pub mod domain;
pub mod error;
pub mod library;
pub mod logging;
pub mod messages;
pub mod player;
pub mod queue;
pub mod settings;
