//! 曲库 API 的数据结构（camelCase JSON）

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::domain::{MediaSource, Track, TrackId};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDto {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ArtistDto>,
    #[serde(default)]
    pub album: Option<AlbumDto>,
    #[serde(default)]
    pub genres: Vec<GenreDto>,
    #[serde(default, alias = "duration")]
    pub duration_ms: u64,
    #[serde(default)]
    pub files: Vec<SongFileDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongFileDto {
    pub mime_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaythroughDto<'a> {
    pub song_id: &'a TrackId,
    pub timestamp: i64,
}

impl SongDto {
    /// 转成可入队的曲目；相对地址的文件按曲库 base url 解析
    pub fn into_track(self, base: &Url) -> Track {
        let sources = self
            .files
            .into_iter()
            .filter_map(|f| match base.join(&f.url) {
                Ok(url) => Some(MediaSource {
                    url: url.to_string(),
                    mime_type: f.mime_type,
                }),
                Err(e) => {
                    tracing::warn!(song_id = %self.id, url = %f.url, err = %e, "忽略无法解析的文件地址");
                    None
                }
            })
            .collect();

        Track {
            id: TrackId::new(self.id),
            title: self.title,
            artists: self
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join("/"),
            album: self.album.map(|a| a.title),
            duration_ms: self.duration_ms,
            sources,
        }
    }
}
