//! 行式控制台：stdin 读命令，stdout 打印正在播放。
//!
//! 队列序号对用户从 1 开始。

use std::io::Write;

use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::domain::EntryId;
use crate::error::{AppError, ParseError};
use crate::messages::{AppCommand, AppEvent, Collection};
use crate::player::{PlaybackStatus, PlayerSnapshot, PlaythroughStatus};

const HELP: &str = "\
命令:
  t | 空格          播放/暂停
  n / p             下一首 / 上一首
  f / b             按步长快进 / 快退
  seek +10 | -5     相对跳转（秒）
  seek 1:23 | 83    跳到绝对位置
  g N               播放第 N 首
  rm N              移除第 N 首
  mv N              把第 N 首移到下一首
  s                 打乱后面的歌曲
  vol 0.8           音量 0~2
  add ID / an ID    按 id 加到队尾 / 下一首
  pl ID [shuffle]   播放歌单
  al ID [shuffle]   播放专辑
  ls / st           队列 / 状态
  q                 退出";

#[derive(Debug)]
pub enum ConsoleInput {
    Command(AppCommand),
    List,
    Status,
    Help,
    Empty,
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, ParseError> {
    // 单独一个空格表示播放/暂停
    if line == " " {
        return Ok(ConsoleInput::Command(AppCommand::PlayerTogglePause));
    }
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(ConsoleInput::Empty);
    };
    let arg = parts.next();

    let cmd = match head {
        "t" | "toggle" | "pause" | "play" => AppCommand::PlayerTogglePause,
        "n" | "next" => AppCommand::PlayerNext,
        "p" | "prev" => AppCommand::PlayerPrev,
        "f" => AppCommand::PlayerStepForward,
        "b" => AppCommand::PlayerStepBackward,
        "seek" => parse_seek(arg.ok_or(ParseError::MissingArg("seek"))?)?,
        "g" | "goto" => AppCommand::PlayAt(parse_position(arg, "goto")?),
        "rm" => AppCommand::RemoveAt(parse_position(arg, "rm")?),
        "mv" => AppCommand::MoveToNext(parse_position(arg, "mv")?),
        "s" | "shuffle" => AppCommand::ShuffleUpcoming,
        "vol" => {
            let raw = arg.ok_or(ParseError::MissingArg("vol"))?;
            let v = raw
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseError::BadArg(raw.to_owned()))?;
            AppCommand::PlayerSetVolume(v)
        }
        "add" | "an" => AppCommand::QueueSong {
            song_id: arg.ok_or(ParseError::MissingArg("add"))?.to_owned(),
            next: head == "an",
        },
        "pl" | "al" => {
            let id = arg.ok_or(ParseError::MissingArg("pl/al"))?.to_owned();
            let collection = if head == "pl" {
                Collection::Playlist(id)
            } else {
                Collection::Album(id)
            };
            AppCommand::PlayCollection {
                collection,
                shuffle: matches!(parts.next(), Some("shuffle" | "s")),
            }
        }
        "ls" => return Ok(ConsoleInput::List),
        "st" => return Ok(ConsoleInput::Status),
        "h" | "help" | "?" => return Ok(ConsoleInput::Help),
        "q" | "quit" | "exit" => AppCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_owned())),
    };
    Ok(ConsoleInput::Command(cmd))
}

/// 1 起的序号转成队列下标
fn parse_position(arg: Option<&str>, ctx: &'static str) -> Result<usize, ParseError> {
    let raw = arg.ok_or(ParseError::MissingArg(ctx))?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::BadArg(raw.to_owned())),
    }
}

fn parse_seek(raw: &str) -> Result<AppCommand, ParseError> {
    let bad = || ParseError::BadArg(raw.to_owned());
    if raw.starts_with('+') || raw.starts_with('-') {
        let secs = raw.parse::<f64>().map_err(|_| bad())?;
        if !secs.is_finite() {
            return Err(bad());
        }
        return Ok(AppCommand::PlayerStepSecs(secs));
    }
    let secs = match raw.split_once(':') {
        Some((m, s)) => {
            let m = m.parse::<u64>().map_err(|_| bad())?;
            let s = s.parse::<u64>().map_err(|_| bad())?;
            if s >= 60 {
                return Err(bad());
            }
            m * 60 + s
        }
        None => raw.parse::<u64>().map_err(|_| bad())?,
    };
    Ok(AppCommand::PlayerSeekToMs(secs * 1000))
}

fn fmt_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn render_status_line(s: &PlayerSnapshot) -> String {
    let icon = match s.status {
        PlaybackStatus::Idle => "■",
        PlaybackStatus::Buffering => "…",
        PlaybackStatus::Playing => "▶",
        PlaybackStatus::Paused => "‖",
    };
    let Some(entry) = s.current() else {
        return format!("{icon} 队列为空");
    };
    let pos = s.cursor.map_or(0, |c| c + 1);
    let counted = match s.playthrough {
        PlaythroughStatus::NotCounted => "",
        PlaythroughStatus::InFlight => " ✓?",
        PlaythroughStatus::Submitted => " ✓",
    };
    let mut line = format!(
        "{icon} [{pos}/{}] {}  {}/{}{counted}",
        s.entries.len(),
        entry.track.display_title(),
        fmt_ms(s.position_ms),
        fmt_ms(s.duration_ms),
    );
    if let Some(err) = s.error.as_deref() {
        line.push_str(&format!("  (错误: {err})"));
    }
    line
}

fn render_queue(s: &PlayerSnapshot) -> String {
    if s.entries.is_empty() {
        return "（队列为空）".to_owned();
    }
    s.entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mark = if Some(i) == s.cursor {
                ">"
            } else if Some(e.id) == s.preloaded {
                "+"
            } else {
                " "
            };
            format!(
                "{mark}{:>3}. {} ({})",
                i + 1,
                e.track.display_title(),
                fmt_ms(e.track.duration_ms)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 文本模式下只在这些字段变化时重打状态行
#[derive(Debug, Clone, PartialEq)]
struct StatusKey {
    cursor: Option<usize>,
    status: PlaybackStatus,
    activation: u64,
    playthrough: PlaythroughStatus,
    preloaded: Option<EntryId>,
    len: usize,
    error: Option<String>,
}

impl From<&PlayerSnapshot> for StatusKey {
    fn from(s: &PlayerSnapshot) -> Self {
        Self {
            cursor: s.cursor,
            status: s.status,
            activation: s.activation,
            playthrough: s.playthrough,
            preloaded: s.preloaded,
            len: s.entries.len(),
            error: s.error.clone(),
        }
    }
}

struct ConsoleView {
    json: bool,
    last: Option<Box<PlayerSnapshot>>,
    last_key: Option<StatusKey>,
}

impl ConsoleView {
    fn on_event(&mut self, evt: AppEvent, out: &mut impl Write) -> Result<(), AppError> {
        match evt {
            AppEvent::State(snapshot) => {
                if self.json {
                    writeln!(out, "{}", serde_json::to_string(&*snapshot)?)?;
                } else {
                    let key = StatusKey::from(&*snapshot);
                    if self.last_key.as_ref() != Some(&key) {
                        writeln!(out, "{}", render_status_line(&snapshot))?;
                        self.last_key = Some(key);
                    }
                }
                self.last = Some(snapshot);
            }
            AppEvent::Toast(msg) => {
                if !self.json {
                    writeln!(out, "· {msg}")?;
                }
            }
            AppEvent::Error(msg) => {
                tracing::warn!(err = %msg, "控制台收到错误");
                eprintln!("! {msg}");
            }
        }
        out.flush()?;
        Ok(())
    }

    fn on_local(&self, input: &ConsoleInput, out: &mut impl Write) -> Result<(), AppError> {
        match (input, self.last.as_deref()) {
            (ConsoleInput::Help, _) => writeln!(out, "{HELP}")?,
            (ConsoleInput::List, Some(s)) => writeln!(out, "{}", render_queue(s))?,
            (ConsoleInput::Status, Some(s)) => writeln!(out, "{}", render_status_line(s))?,
            (ConsoleInput::List | ConsoleInput::Status, None) => writeln!(out, "（尚无状态）")?,
            (ConsoleInput::Command(_) | ConsoleInput::Empty, _) => {}
        }
        out.flush()?;
        Ok(())
    }
}

async fn read_stdin(tx_line: mpsc::Sender<String>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx_line.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(err = %e, "读取 stdin 失败");
                break;
            }
        }
    }
}

/// 控制台主循环；actor 退出（事件通道关闭）时返回。stdin 结束或 Ctrl-C 视为退出。
pub async fn run_console(
    tx: mpsc::Sender<AppCommand>,
    mut rx: mpsc::Receiver<AppEvent>,
    json: bool,
) -> Result<(), AppError> {
    let (tx_line, mut rx_line) = mpsc::channel::<String>(16);
    tokio::spawn(read_stdin(tx_line));

    let mut view = ConsoleView {
        json,
        last: None,
        last_key: None,
    };
    let mut stdin_open = true;
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            maybe_evt = rx.recv() => {
                let Some(evt) = maybe_evt else {
                    break;
                };
                view.on_event(evt, &mut stdout.lock())?;
            }
            maybe_line = rx_line.recv(), if stdin_open => {
                let Some(line) = maybe_line else {
                    stdin_open = false;
                    tracing::info!("stdin 已关闭，退出");
                    let _ = tx.send(AppCommand::Quit).await;
                    continue;
                };
                match parse_line(&line) {
                    Ok(ConsoleInput::Command(cmd)) => {
                        tracing::debug!(?cmd, "控制台命令");
                        if tx.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    Ok(local) => view.on_local(&local, &mut stdout)?,
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到 Ctrl-C，退出");
                let _ = tx.send(AppCommand::Quit).await;
            }
        }
    }
    Ok(())
}
