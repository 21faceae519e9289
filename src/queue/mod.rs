mod play_queue;

pub use play_queue::{PlayQueue, QueueEntry};
