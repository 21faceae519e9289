use crate::domain::Track;
use crate::player::PlayerSnapshot;

/// 曲库里可以"全部播放"的集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    Playlist(String),
    Album(String),
}

#[derive(Debug)]
pub enum AppCommand {
    /// 播放全部 / 随机播放全部
    PlayCollection { collection: Collection, shuffle: bool },
    PlayTracks { tracks: Vec<Track>, start: usize },
    /// 按 id 从曲库取一首歌，插到下一首或追加到队尾；队列为空时直接开始播放
    QueueSong { song_id: String, next: bool },
    InsertNext(Vec<Track>),
    Append(Vec<Track>),
    PlayAt(usize),
    RemoveAt(usize),
    MoveToNext(usize),
    ShuffleUpcoming,
    PlayerTogglePause,
    PlayerNext,
    PlayerPrev,
    PlayerStepSecs(f64),
    /// 按设置里的步长快进 / 快退
    PlayerStepForward,
    PlayerStepBackward,
    PlayerSeekToMs(u64),
    PlayerSetVolume(f32),
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    State(Box<PlayerSnapshot>),
    Toast(String),
    Error(String),
}
