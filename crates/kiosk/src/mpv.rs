//! mpv IPC driver for the attract-mode video window.
//!
//! ```text
//!   MpvDriver::spawn_and_connect()
//!         │
//!         └── ipc_task   owns the socket
//!               ├── MpvRequest from MpvHandle → JSON line out, reply parked by request id
//!               └── JSON line in → Reply (resolves the parked sender) | Event → event_tx
//! ```
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kiosk_shared::config::MpvConfig;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const SOCKET_POLL: Duration = Duration::from_millis(100);
const SOCKET_ATTEMPTS: usize = 50;

/// observe_property ids, echoed back in property-change events.
pub const OBS_PAUSE: u64 = 1;
pub const OBS_SPEED: u64 = 2;

/// script-message name bound to a left click on the video window.
pub const TAP_MESSAGE: &str = "kiosk-tap";

type Reply = oneshot::Sender<anyhow::Result<Value>>;

struct MpvRequest {
    req_id: u64,
    line: String,
    reply: Reply,
}

/// An unsolicited mpv message: an event or a property change.
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    /// `(observe id, new value)` for property-change events.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.event_name()? != "property-change" {
            return None;
        }
        let id = self.raw.get("id")?.as_u64()?;
        Some((id, self.raw.get("data").unwrap_or(&Value::Null)))
    }

    /// `eof`, `stop`, `quit`, `error` or `redirect` for `end-file`.
    pub fn end_file_reason(&self) -> Option<&str> {
        match self.event_name()? {
            "end-file" => self.raw.get("reason")?.as_str(),
            _ => None,
        }
    }

    pub fn is_tap(&self) -> bool {
        self.event_name() == Some("client-message")
            && self.raw.pointer("/args/0").and_then(Value::as_str) == Some(TAP_MESSAGE)
    }
}

/// One decoded line from the socket.
#[derive(Debug)]
enum Incoming {
    Reply { req_id: u64, result: anyhow::Result<Value> },
    Event(MpvEvent),
}

fn parse_line(line: &str) -> Option<Incoming> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let val: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            debug!("mpv: unparseable line '{}': {}", line, e);
            return None;
        }
    };
    let Some(req_id) = val.get("request_id").and_then(Value::as_u64) else {
        return Some(Incoming::Event(MpvEvent { raw: val }));
    };
    let result = match val.get("error").and_then(Value::as_str) {
        Some("success") => Ok(val),
        other => Err(anyhow::anyhow!("mpv error: {}", other.unwrap_or("unknown"))),
    };
    Some(Incoming::Reply { req_id, result })
}

/// Cloneable sender side of the IPC task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<MpvRequest>,
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&json!({ "command": command, "request_id": req_id }))?;
        line.push('\n');

        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(MpvRequest { req_id, line, reply })
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC task gone"))?;

        match tokio::time::timeout(REPLY_TIMEOUT, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => anyhow::bail!("mpv connection closed before reply to req={}", req_id),
            Err(_) => anyhow::bail!("mpv IPC timeout for req={}", req_id),
        }
    }
}

/// Owns the mpv child process. The core respawns it when it dies.
pub struct MpvDriver {
    process: Option<tokio::process::Child>,
    config: MpvConfig,
}

impl MpvDriver {
    pub fn new(config: MpvConfig) -> Self {
        Self {
            process: None,
            config,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("mpv exited: {}", status);
                false
            }
            Err(e) => {
                warn!("mpv liveness check failed: {}", e);
                false
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill().await;
        }
    }

    /// The window only exists while a file is loaded (`--force-window=no`),
    /// so stopping playback hides it.
    pub fn spawn_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "--idle=yes",
            "--force-window=no",
            "--mute=yes",
            "--no-osc",
            "--no-input-default-bindings",
            "--keep-open=no",
            "--quiet",
        ]
        .iter()
        .map(|a| a.to_string())
        .collect();
        args.push(kiosk_shared::platform::mpv_socket_arg());
        if self.config.fullscreen {
            args.push("--fullscreen".into());
        }
        if !self.config.border {
            args.push("--no-border".into());
        }
        args.extend(self.config.extra_args.iter().cloned());
        args
    }

    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let socket_path = kiosk_shared::platform::mpv_socket_path();
        let _ = tokio::fs::remove_file(&socket_path).await;

        let mpv_binary = kiosk_shared::platform::find_mpv_binary()
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found (set MPV_PATH or install mpv)"))?;

        let data_dir = kiosk_shared::platform::data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let stderr_log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join("mpv-stderr.log"))?;

        let child = tokio::process::Command::new(&mpv_binary)
            .args(self.spawn_args())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr_log)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: spawned {:?} pid {:?}", mpv_binary, child.id());
        self.process = Some(child);

        let stream = connect_when_ready(&socket_path).await?;
        info!("mpv: connected to {:?}", socket_path);
        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(ipc_task(read_half, write_half, rx, event_tx));
        Ok(MpvHandle { tx })
    }
}

/// mpv creates the socket shortly after start; poll for it.
async fn connect_when_ready(socket_path: &Path) -> anyhow::Result<UnixStream> {
    let mut last_err = None;
    for _ in 0..SOCKET_ATTEMPTS {
        tokio::time::sleep(SOCKET_POLL).await;
        if !socket_path.exists() {
            continue;
        }
        match UnixStream::connect(socket_path).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(anyhow::anyhow!("mpv IPC socket refused connection: {}", e)),
        None => anyhow::bail!("mpv IPC socket did not appear at {:?}", socket_path),
    }
}

async fn ipc_task<R, W>(
    read_half: R,
    mut writer: W,
    mut requests: mpsc::Receiver<MpvRequest>,
    event_tx: mpsc::Sender<MpvEvent>,
) where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(read_half).lines();
    let mut pending: HashMap<u64, Reply> = HashMap::new();

    loop {
        tokio::select! {
            req = requests.recv() => {
                let Some(req) = req else { break };
                debug!("mpv: -> {}", req.line.trim_end());
                if let Err(e) = writer.write_all(req.line.as_bytes()).await {
                    warn!("mpv: write failed: {}", e);
                    let _ = req.reply.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
                    break;
                }
                // Replies are read on this task, so parking after the write cannot race.
                pending.insert(req.req_id, req.reply);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("mpv: connection closed");
                        break;
                    }
                    Err(e) => {
                        warn!("mpv: read failed: {}", e);
                        break;
                    }
                };
                match parse_line(&line) {
                    Some(Incoming::Reply { req_id, result }) => match pending.remove(&req_id) {
                        Some(reply) => {
                            let _ = reply.send(result);
                        }
                        None => debug!("mpv: reply for unknown req={}", req_id),
                    },
                    Some(Incoming::Event(event)) => {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    None => {}
                }
            }
        }
    }

    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(anyhow::anyhow!("mpv IPC connection closed")));
    }
    debug!("mpv: IPC task exiting");
}

impl MpvHandle {
    /// Replace the current file.  The position is set by a seek once mpv
    /// reports `file-loaded`.
    pub async fn load_media(&self, path: &str) -> anyhow::Result<()> {
        debug!("mpv: loadfile {}", path);
        self.send(json!(["loadfile", path, "replace"])).await?;
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        let _ = self.send(json!(["stop"])).await;
        Ok(())
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    pub async fn seek_absolute(&self, secs: f64) -> anyhow::Result<()> {
        self.send(json!(["seek", secs.max(0.0), "absolute", "exact"]))
            .await?;
        Ok(())
    }

    pub async fn set_speed(&self, speed: f64) -> anyhow::Result<()> {
        self.send(json!(["set_property", "speed", speed])).await?;
        Ok(())
    }

    /// Current in-file position; `None` while nothing is playing.
    pub async fn time_pos(&self) -> anyhow::Result<Option<f64>> {
        let resp = self.send(json!(["get_property", "time-pos"])).await?;
        Ok(resp["data"].as_f64())
    }

    /// Bind a left click on the video window to a script-message the core
    /// forwards as a screensaver tap.  Must be re-sent after every spawn.
    pub async fn bind_tap(&self) {
        let cmd = format!("script-message {}", TAP_MESSAGE);
        match self.send(json!(["keybind", "MBTN_LEFT", cmd])).await {
            Ok(_) => debug!("mpv: MBTN_LEFT bound to {}", TAP_MESSAGE),
            Err(e) => warn!("mpv: keybind failed: {}", e),
        }
    }

    /// Register observe_property for all properties we care about.
    /// Must be called after every fresh connection.
    pub async fn observe_all_properties(&self) {
        let props = [(OBS_PAUSE, "pause"), (OBS_SPEED, "speed")];
        for (id, name) in &props {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }

    /// Health-check: returns Ok(()) if mpv is responsive.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.send(json!(["get_property", "idle-active"])).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let tap = MpvEvent {
            raw: json!({"event": "client-message", "args": ["kiosk-tap"]}),
        };
        assert!(tap.is_tap());

        let other = MpvEvent {
            raw: json!({"event": "client-message", "args": ["osc-visibility"]}),
        };
        assert!(!other.is_tap());

        let eof = MpvEvent {
            raw: json!({"event": "end-file", "reason": "eof", "playlist_entry_id": 1}),
        };
        assert_eq!(eof.end_file_reason(), Some("eof"));

        let pause = MpvEvent {
            raw: json!({"event": "property-change", "id": OBS_PAUSE, "name": "pause", "data": true}),
        };
        assert_eq!(pause.as_property_change(), Some((OBS_PAUSE, &json!(true))));
    }

    #[test]
    fn test_replies_and_events_are_told_apart() {
        match parse_line(r#"{"request_id":7,"error":"success","data":12.5}"#) {
            Some(Incoming::Reply { req_id: 7, result: Ok(v) }) => assert_eq!(v["data"], 12.5),
            other => panic!("expected ok reply, got {:?}", other),
        }
        match parse_line(r#"{"request_id":8,"error":"property unavailable"}"#) {
            Some(Incoming::Reply { req_id: 8, result: Err(e) }) => {
                assert!(e.to_string().contains("property unavailable"))
            }
            other => panic!("expected error reply, got {:?}", other),
        }
        match parse_line(r#"{"event":"file-loaded"}"#) {
            Some(Incoming::Event(e)) => assert_eq!(e.event_name(), Some("file-loaded")),
            other => panic!("expected event, got {:?}", other),
        }
        assert!(parse_line("   ").is_none());
        assert!(parse_line("not json").is_none());
    }

    #[tokio::test]
    async fn test_ipc_task_matches_reply_to_request() {
        let (client, server) = tokio::io::duplex(4096);
        let (read_half, write_half) = tokio::io::split(client);
        let (tx, rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);
        tokio::spawn(ipc_task(read_half, write_half, rx, event_tx));

        // Fake mpv: emit an event, then answer whatever request arrives.
        let (server_read, mut server_write) = tokio::io::split(server);
        tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            server_write
                .write_all(b"{\"event\":\"client-message\",\"args\":[\"kiosk-tap\"]}\n")
                .await
                .unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                let req: Value = serde_json::from_str(&line).unwrap();
                let reply = json!({"request_id": req["request_id"], "error": "success", "data": 3.0});
                let mut out = reply.to_string();
                out.push('\n');
                server_write.write_all(out.as_bytes()).await.unwrap();
            }
        });

        let handle = MpvHandle { tx };
        let resp = handle.send(json!(["get_property", "time-pos"])).await.unwrap();
        assert_eq!(resp["data"], 3.0);
        assert!(event_rx.recv().await.unwrap().is_tap());
    }

    #[test]
    fn test_spawn_args_follow_config() {
        let driver = MpvDriver::new(MpvConfig {
            fullscreen: true,
            border: false,
            extra_args: vec!["--hwdec=auto".to_string()],
        });
        let args = driver.spawn_args();
        for expected in [
            "--fullscreen",
            "--no-border",
            "--force-window=no",
            "--mute=yes",
            "--no-osc",
            "--no-input-default-bindings",
            "--hwdec=auto",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {}", expected);
        }
        assert!(args.iter().any(|a| a.starts_with("--input-ipc-server=")));

        let windowed = MpvDriver::new(MpvConfig {
            fullscreen: false,
            border: true,
            extra_args: vec![],
        });
        let args = windowed.spawn_args();
        assert!(!args.iter().any(|a| a == "--fullscreen" || a == "--no-border"));
    }
}
