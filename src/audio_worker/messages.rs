use crate::domain::Track;
use crate::player::Slot;

#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// 装载曲目到槽位；`autoplay` 为 false 时只缓冲不播放（预加载）
    Load {
        slot: Slot,
        load_id: u64,
        track: Track,
        autoplay: bool,
    },
    /// 清空槽位，取消仍在进行的下载
    Clear { slot: Slot, load_id: u64 },
    Play { slot: Slot },
    Pause { slot: Slot },
    Seek { slot: Slot, position_ms: u64 },
    SetVolume(f32),
}

#[derive(Debug, Clone)]
pub enum AudioEvent {
    Loaded {
        slot: Slot,
        load_id: u64,
        duration_ms: Option<u64>,
    },
    Started {
        slot: Slot,
        load_id: u64,
    },
    Paused {
        slot: Slot,
        load_id: u64,
    },
    Progress {
        slot: Slot,
        load_id: u64,
        position_ms: u64,
    },
    Ended {
        slot: Slot,
        load_id: u64,
    },
    Failed {
        slot: Slot,
        load_id: u64,
        message: String,
    },
}

impl AudioEvent {
    pub fn target(&self) -> (Slot, u64) {
        match self {
            AudioEvent::Loaded { slot, load_id, .. }
            | AudioEvent::Started { slot, load_id }
            | AudioEvent::Paused { slot, load_id }
            | AudioEvent::Progress { slot, load_id, .. }
            | AudioEvent::Ended { slot, load_id }
            | AudioEvent::Failed { slot, load_id, .. } => (*slot, *load_id),
        }
    }
}
