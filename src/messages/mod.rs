pub mod app;

pub use app::{AppCommand, AppEvent, Collection};
