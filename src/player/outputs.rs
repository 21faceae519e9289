//! 双缓冲输出槽位
//!
//! 固定两个槽位 A/B，同一时刻一个是 active（正在播放），
//! 另一个是 inactive（预加载下一首）。切歌时交换 active 标记。

use serde::Serialize;

use crate::domain::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotState {
    /// 当前装载的队列条目
    pub entry: Option<EntryId>,
    /// 最近一次 Load/Clear 的编号，事件带的 load_id 不一致即过期
    pub load_id: u64,
}

#[derive(Debug, Clone)]
pub struct DualOutputs {
    a: SlotState,
    b: SlotState,
    active: Slot,
    next_load_id: u64,
}

impl Default for DualOutputs {
    fn default() -> Self {
        Self {
            a: SlotState::default(),
            b: SlotState::default(),
            active: Slot::A,
            next_load_id: 0,
        }
    }
}

impl DualOutputs {
    pub fn active(&self) -> Slot {
        self.active
    }

    pub fn inactive(&self) -> Slot {
        self.active.other()
    }

    pub fn state(&self, slot: Slot) -> &SlotState {
        match slot {
            Slot::A => &self.a,
            Slot::B => &self.b,
        }
    }

    pub fn swap(&mut self) {
        self.active = self.active.other();
    }

    /// 给槽位分配新条目（`None` 表示清空），返回新的 load_id
    pub fn assign(&mut self, slot: Slot, entry: Option<EntryId>) -> u64 {
        self.next_load_id = self.next_load_id.wrapping_add(1).max(1);
        let load_id = self.next_load_id;
        let state = self.state_mut(slot);
        state.entry = entry;
        state.load_id = load_id;
        load_id
    }

    pub fn accepts(&self, slot: Slot, load_id: u64) -> bool {
        self.state(slot).load_id == load_id
    }

    pub fn active_entry(&self) -> Option<EntryId> {
        self.state(self.active).entry
    }

    pub fn preloaded_entry(&self) -> Option<EntryId> {
        self.state(self.inactive()).entry
    }

    fn state_mut(&mut self, slot: Slot) -> &mut SlotState {
        match slot {
            Slot::A => &mut self.a,
            Slot::B => &mut self.b,
        }
    }
}
