use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::LibraryClient;
use crate::domain::Track;
use crate::error::LibraryError;
use crate::messages::Collection;

#[derive(Debug, Clone)]
pub enum LibraryCommand {
    CollectionTracks {
        req_id: u64,
        collection: Collection,
        shuffle: bool,
    },
    Song {
        req_id: u64,
        song_id: String,
        next: bool,
    },
}

#[derive(Debug)]
pub enum LibraryEvent {
    CollectionTracks {
        req_id: u64,
        collection: Collection,
        shuffle: bool,
        tracks: Vec<Track>,
    },
    Song {
        req_id: u64,
        song_id: String,
        next: bool,
        track: Track,
    },
    Error {
        req_id: u64,
        message: String,
    },
}

async fn emit_error(
    tx_evt: &mpsc::Sender<LibraryEvent>,
    req_id: u64,
    ctx: &'static str,
    err: LibraryError,
) {
    tracing::warn!(req_id, ctx, err = %err, "LibraryActor 请求失败");
    let _ = tx_evt
        .send(LibraryEvent::Error {
            req_id,
            message: format!("{ctx}: {err}"),
        })
        .await;
}

/// 读请求遇到可重试错误时再试一次
async fn with_retry<T, F, Fut>(mut f: F) -> Result<T, LibraryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LibraryError>>,
{
    match f().await {
        Err(e) if e.is_retryable() => {
            tracing::debug!(err = %e, "曲库请求失败，重试一次");
            f().await
        }
        other => other,
    }
}

pub fn spawn_library_actor(
    client: Arc<LibraryClient>,
) -> (mpsc::Sender<LibraryCommand>, mpsc::Receiver<LibraryEvent>) {
    let (tx_cmd, mut rx_cmd) = mpsc::channel::<LibraryCommand>(64);
    let (tx_evt, rx_evt) = mpsc::channel::<LibraryEvent>(64);

    tokio::spawn(async move {
        while let Some(cmd) = rx_cmd.recv().await {
            match cmd {
                LibraryCommand::CollectionTracks {
                    req_id,
                    collection,
                    shuffle,
                } => match with_retry(|| client.collection_tracks(&collection)).await {
                    Ok(tracks) => {
                        tracing::debug!(req_id, ?collection, count = tracks.len(), "集合曲目已获取");
                        let _ = tx_evt
                            .send(LibraryEvent::CollectionTracks {
                                req_id,
                                collection,
                                shuffle,
                                tracks,
                            })
                            .await;
                    }
                    Err(e) => emit_error(&tx_evt, req_id, "获取集合曲目", e).await,
                },
                LibraryCommand::Song {
                    req_id,
                    song_id,
                    next,
                } => match with_retry(|| client.song(&song_id)).await {
                    Ok(track) => {
                        let _ = tx_evt
                            .send(LibraryEvent::Song {
                                req_id,
                                song_id,
                                next,
                                track,
                            })
                            .await;
                    }
                    Err(e) => emit_error(&tx_evt, req_id, "获取歌曲", e).await,
                },
            }
        }
        tracing::debug!("LibraryActor 已退出");
    });

    (tx_cmd, rx_evt)
}
