use serde::{Deserialize, Serialize};
use std::fmt;

/// 曲库中的歌曲 id（文档数据库的 ObjectId 字符串，客户端只当作不透明值）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 队列条目 id：入队时分配，本次会话内唯一。
///
/// 同一首歌可以在队列里出现多次，预加载槽位靠它区分"是不是同一个条目"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_id_serializes_as_plain_string() {
        let id = TrackId::new("64b7f0c2e13a");
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, "\"64b7f0c2e13a\"");
        let back: TrackId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn entry_id_display() {
        assert_eq!(EntryId(7).to_string(), "#7");
    }
}
