//! 请求过期丢弃
//!
//! 同一 key 只保留最新的 req_id，旧请求的响应回来时直接丢弃。

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
pub struct RequestTracker<K> {
    next_id: u64,
    pending: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for RequestTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> RequestTracker<K> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// 发起新请求，覆盖同一 key 上仍未返回的旧请求
    pub fn issue(&mut self, key: K) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.pending.insert(key, id);
        id
    }

    /// 只有 key 上挂着的正是这个 req_id 时才接受，并清掉 pending
    pub fn accept(&mut self, key: &K, req_id: u64) -> bool {
        match self.pending.get(key) {
            Some(&pending_id) if pending_id == req_id => {
                self.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    /// 按 req_id 找回 key 并接受（用于只带 req_id 的错误响应）
    pub fn accept_id(&mut self, req_id: u64) -> Option<K>
    where
        K: Clone,
    {
        let key = self
            .pending
            .iter()
            .find(|(_, id)| **id == req_id)
            .map(|(k, _)| k.clone())?;
        self.pending.remove(&key);
        Some(key)
    }

    #[cfg(test)]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    /// 播放全部 / 随机播放全部，只认最后一次
    Collection,
    /// 按 id 取歌；同一首歌重复请求只认最后一次
    Song(String),
}
