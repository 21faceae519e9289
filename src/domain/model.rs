use serde::{Deserialize, Serialize};

use super::ids::TrackId;

/// 一个可播放的编码版本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    pub url: String,
    pub mime_type: String,
}

/// 入队的曲目引用，入队后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artists: String,
    pub album: Option<String>,
    pub duration_ms: u64,
    pub sources: Vec<MediaSource>,
}

impl Track {
    pub fn new(id: impl Into<String>, duration_ms: u64, sources: Vec<MediaSource>) -> Self {
        Self {
            id: TrackId::new(id),
            title: String::new(),
            artists: String::new(),
            album: None,
            duration_ms,
            sources,
        }
    }

    /// 按偏好的 MIME 顺序挑选播放源，都不匹配时退回第一个
    pub fn preferred_source(&self, mime_order: &[String]) -> Option<&MediaSource> {
        mime_order
            .iter()
            .find_map(|mime| {
                self.sources
                    .iter()
                    .find(|s| s.mime_type.eq_ignore_ascii_case(mime))
            })
            .or_else(|| self.sources.first())
    }

    pub fn display_title(&self) -> String {
        let title = if self.title.is_empty() {
            self.id.as_str()
        } else {
            self.title.as_str()
        };
        if self.artists.is_empty() {
            title.to_owned()
        } else {
            format!("{} - {}", title, self.artists)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(url: &str, mime: &str) -> MediaSource {
        MediaSource {
            url: url.to_owned(),
            mime_type: mime.to_owned(),
        }
    }

    #[test]
    fn preferred_source_follows_mime_order() {
        let t = Track::new(
            "a",
            1000,
            vec![src("a.mp3", "audio/mpeg"), src("a.ogg", "audio/ogg")],
        );
        let order = vec!["audio/ogg".to_owned(), "audio/mpeg".to_owned()];
        assert_eq!(t.preferred_source(&order).map(|s| s.url.as_str()), Some("a.ogg"));
    }

    #[test]
    fn preferred_source_falls_back_to_first() {
        let t = Track::new("a", 1000, vec![src("a.flac", "audio/flac")]);
        let order = vec!["audio/ogg".to_owned()];
        assert_eq!(t.preferred_source(&order).map(|s| s.url.as_str()), Some("a.flac"));
        assert!(Track::new("b", 0, vec![]).preferred_source(&order).is_none());
    }

    #[test]
    fn display_title_uses_id_when_untitled() {
        let mut t = Track::new("abc", 0, vec![]);
        assert_eq!(t.display_title(), "abc");
        t.title = "Song".to_owned();
        t.artists = "Band".to_owned();
        assert_eq!(t.display_title(), "Song - Band");
    }
}
