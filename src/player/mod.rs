//! 正在播放状态机：队列 + 游标 + 双缓冲输出 + playthrough 计数

mod controller;
mod outputs;
mod playthrough;

pub use controller::{PlaybackController, PlaybackStatus, PlayerSnapshot};
pub use outputs::{DualOutputs, Slot, SlotState};
pub use playthrough::{PlaythroughPolicy, PlaythroughStatus};

#[cfg(test)]
mod tests;
