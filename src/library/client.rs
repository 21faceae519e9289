use reqwest::Url;
use serde::de::DeserializeOwned;

use super::config::LibraryClientConfig;
use super::dto::{PlaythroughDto, SongDto};
use crate::domain::{Track, TrackId};
use crate::error::LibraryError;
use crate::messages::Collection;

/// 曲库 REST API 客户端
#[derive(Debug, Clone)]
pub struct LibraryClient {
    http: reqwest::Client,
    base: Url,
}

impl LibraryClient {
    pub fn new(cfg: &LibraryClientConfig) -> Result<Self, LibraryError> {
        let mut base = Url::parse(&cfg.base_url)
            .map_err(|e| LibraryError::BadUrl(format!("{}: {e}", cfg.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(LibraryError::BadUrl(cfg.base_url.clone()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("jukebox/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.timeout)
            .connect_timeout(cfg.connect_timeout)
            .build()?;

        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, LibraryError> {
        self.song_list(&["api", "playlists", playlist_id, "songs"])
            .await
    }

    pub async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>, LibraryError> {
        self.song_list(&["api", "albums", album_id, "songs"]).await
    }

    pub async fn collection_tracks(&self, c: &Collection) -> Result<Vec<Track>, LibraryError> {
        match c {
            Collection::Playlist(id) => self.playlist_tracks(id).await,
            Collection::Album(id) => self.album_tracks(id).await,
        }
    }

    pub async fn song(&self, song_id: &str) -> Result<Track, LibraryError> {
        let url = self.endpoint(&["api", "songs", song_id])?;
        let dto: SongDto = self.get_json(url).await?;
        Ok(dto.into_track(&self.base))
    }

    /// 记录一次 playthrough。调用方不关心结果，失败也不重试。
    pub async fn record_playthrough(
        &self,
        track_id: &TrackId,
        timestamp_ms: i64,
    ) -> Result<(), LibraryError> {
        let url = self.endpoint(&["api", "playthroughs"])?;
        let resp = self
            .http
            .post(url.clone())
            .json(&PlaythroughDto {
                song_id: track_id,
                timestamp: timestamp_ms,
            })
            .send()
            .await?;
        check_status(&resp, &url)?;
        Ok(())
    }

    async fn song_list(&self, segments: &[&str]) -> Result<Vec<Track>, LibraryError> {
        let url = self.endpoint(segments)?;
        let songs: Vec<SongDto> = self.get_json(url).await?;
        Ok(songs
            .into_iter()
            .map(|s| s.into_track(&self.base))
            .collect())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, LibraryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LibraryError::BadUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LibraryError> {
        tracing::debug!(%url, "GET");
        let resp = self.http.get(url.clone()).send().await?;
        check_status(&resp, &url)?;
        Ok(resp.json::<T>().await?)
    }
}

fn check_status(resp: &reqwest::Response, url: &Url) -> Result<(), LibraryError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    Err(LibraryError::Status {
        status,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> LibraryClient {
        LibraryClient::new(&LibraryClientConfig {
            base_url: base.to_owned(),
            ..LibraryClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn base_path_keeps_prefix() {
        let c = client("http://nas.local/music");
        let url = c.endpoint(&["api", "songs", "a b"]).unwrap();
        assert_eq!(url.as_str(), "http://nas.local/music/api/songs/a%20b");
    }

    #[test]
    fn rejects_invalid_base() {
        let err = LibraryClient::new(&LibraryClientConfig {
            base_url: "not a url".to_owned(),
            ..LibraryClientConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, LibraryError::BadUrl(_)));
    }
}
