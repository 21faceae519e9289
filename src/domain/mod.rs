pub mod ids;
pub mod model;

pub use ids::{EntryId, TrackId};
pub use model::{MediaSource, Track};
