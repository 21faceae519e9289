use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::domain::{EntryId, Track};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub track: Track,
}

/// 有序播放队列 + 游标
///
/// 游标只在有当前曲目时为 `Some`，且总满足 `cursor < len`。
/// 所有越界参数都被忽略，不会 panic。
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
    next_entry_id: u64,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|pos| self.entries.get(pos))
    }

    /// 游标之后的第一个条目（没有游标时不存在"下一首"）
    pub fn peek_next(&self) -> Option<&QueueEntry> {
        let pos = self.cursor?;
        self.entries.get(pos + 1)
    }

    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.cursor = Some(index);
        true
    }

    /// 整体替换队列，返回生效的起始下标（越界时回到 0）
    pub fn replace(&mut self, tracks: Vec<Track>, start_index: usize) -> Option<usize> {
        self.entries = self.wrap(tracks);
        if self.entries.is_empty() {
            self.cursor = None;
            return None;
        }
        let start = if start_index < self.entries.len() {
            start_index
        } else {
            0
        };
        self.cursor = Some(start);
        Some(start)
    }

    /// 插到游标后面；没有游标时插到队首。返回插入位置。
    pub fn insert_next(&mut self, tracks: Vec<Track>) -> usize {
        let at = self.cursor.map_or(0, |pos| pos + 1);
        let wrapped = self.wrap(tracks);
        self.entries.splice(at..at, wrapped);
        at
    }

    /// 追加到队尾，返回第一首的位置
    pub fn append(&mut self, tracks: Vec<Track>) -> usize {
        let at = self.entries.len();
        let wrapped = self.wrap(tracks);
        self.entries.extend(wrapped);
        at
    }

    /// 移除条目并修正游标。
    ///
    /// 移除的是当前曲目时，游标留在原位置（即原来的下一首）；
    /// 若它是最后一首则落到新的末尾；队列空了则清空游标。
    pub fn remove(&mut self, index: usize) -> Option<QueueEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        let len = self.entries.len();
        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(pos) if index < pos => Some(pos - 1),
            Some(pos) if index == pos => Some(pos.min(len - 1)),
            other => other,
        };
        Some(removed)
    }

    /// 把条目挪到游标后面；没有游标时挪到队首
    pub fn move_to_next(&mut self, index: usize) -> bool {
        if index >= self.entries.len() || self.cursor == Some(index) {
            return false;
        }
        let entry = self.entries.remove(index);
        let target = match self.cursor {
            Some(pos) if index < pos => {
                self.cursor = Some(pos - 1);
                pos
            }
            Some(pos) => pos + 1,
            None => 0,
        };
        self.entries.insert(target, entry);
        true
    }

    /// 只打乱游标之后的部分（Fisher–Yates）；没有游标时打乱整个队列
    pub fn shuffle_upcoming<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let from = self.cursor.map_or(0, |pos| pos + 1);
        if from >= self.entries.len() {
            return;
        }
        self.entries[from..].shuffle(rng);
    }

    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn wrap(&mut self, tracks: Vec<Track>) -> Vec<QueueEntry> {
        tracks
            .into_iter()
            .map(|track| {
                self.next_entry_id = self.next_entry_id.wrapping_add(1);
                QueueEntry {
                    id: EntryId(self.next_entry_id),
                    track,
                }
            })
            .collect()
    }
}
