//! 统一错误处理模块

mod app;
mod audio;
mod console;
mod download;
mod library;

pub use app::{AppError, SettingsError};
pub use audio::AudioError;
pub use console::ParseError;
pub use download::DownloadError;
pub use library::LibraryError;
