//! 播放次数（playthrough）计数策略

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PlaythroughStatus {
    #[default]
    NotCounted,
    InFlight,
    Submitted,
}

/// 听够 `min_played_ms` 或播放进度达到 `min_ratio` 即计一次
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaythroughPolicy {
    pub min_played_ms: u64,
    pub min_ratio: f64,
}

impl Default for PlaythroughPolicy {
    fn default() -> Self {
        Self {
            min_played_ms: 30_000,
            min_ratio: 0.99,
        }
    }
}

impl PlaythroughPolicy {
    pub fn is_reached(&self, position_ms: u64, duration_ms: u64) -> bool {
        if position_ms >= self.min_played_ms {
            return true;
        }
        duration_ms > 0 && position_ms as f64 >= duration_ms as f64 * self.min_ratio
    }
}
