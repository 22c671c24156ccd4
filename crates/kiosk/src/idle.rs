//! Idle/attract-mode countdown.
//!
//! Every recognised input calls [`IdleController::reset`], which restarts a
//! fixed countdown.  When it runs out the idle callback fires once and the
//! countdown goes inert until the next reset.  Each armed timer carries a
//! generation, so a reset racing an expiring timer cannot fire twice.
//!
//! ```text
//!   start/reset ──► armed(gen) ──timeout──► fired ──reset──► armed(gen+1)
//!                       │
//!                       └──stop──► stopped
//! ```
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Kinds of user input the idle controller can count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Tap,
    Release,
    Drag,
    Scroll,
    Move,
    Key,
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tap" | "touchstart" | "click" | "mousedown" => Ok(InputKind::Tap),
            "release" | "mouseup" => Ok(InputKind::Release),
            "drag" => Ok(InputKind::Drag),
            "scroll" => Ok(InputKind::Scroll),
            "move" | "mousemove" => Ok(InputKind::Move),
            "key" | "keypress" => Ok(InputKind::Key),
            other => Err(format!("unknown input kind '{}'", other)),
        }
    }
}

/// Parse the configured reset events, skipping (and logging) unknown names.
/// Falls back to taps only when nothing usable is configured.
pub fn parse_reset_kinds(names: &[String]) -> HashSet<InputKind> {
    let mut kinds: HashSet<InputKind> = names
        .iter()
        .filter_map(|n| match n.parse() {
            Ok(k) => Some(k),
            Err(e) => {
                warn!("idle: {}", e);
                None
            }
        })
        .collect();
    if kinds.is_empty() {
        kinds.insert(InputKind::Tap);
    }
    kinds
}

struct Countdown {
    running: bool,
    generation: u64,
    fired: bool,
    deadline: Option<Instant>,
}

/// Attract-mode countdown.  After `timeout` without recognised input the
/// idle callback runs exactly once; the countdown then stays inert until the
/// next `reset()`.
pub struct IdleController {
    timeout: Duration,
    reset_on: HashSet<InputKind>,
    countdown: Arc<Mutex<Countdown>>,
    on_idle: Arc<dyn Fn() + Send + Sync>,
    task: Option<JoinHandle<()>>,
}

impl IdleController {
    pub fn new(
        timeout: Duration,
        reset_on: HashSet<InputKind>,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            timeout,
            reset_on,
            countdown: Arc::new(Mutex::new(Countdown {
                running: false,
                generation: 0,
                fired: false,
                deadline: None,
            })),
            on_idle: Arc::new(on_idle),
            task: None,
        }
    }

    pub fn start(&mut self) {
        if let Ok(mut c) = self.countdown.lock() {
            c.running = true;
        }
        info!("idle: started, timeout {:?}", self.timeout);
        self.reset();
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Ok(mut c) = self.countdown.lock() {
            c.running = false;
            c.generation += 1;
            c.deadline = None;
        }
    }

    /// Cancel any pending countdown and start a fresh one.
    pub fn reset(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let deadline = Instant::now() + self.timeout;
        let generation = {
            let Ok(mut c) = self.countdown.lock() else {
                return;
            };
            if !c.running {
                return;
            }
            c.generation += 1;
            c.fired = false;
            c.deadline = Some(deadline);
            c.generation
        };

        let countdown = Arc::clone(&self.countdown);
        let on_idle = Arc::clone(&self.on_idle);
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let fire = match countdown.lock() {
                Ok(mut c) if c.running && c.generation == generation && !c.fired => {
                    c.fired = true;
                    c.deadline = None;
                    true
                }
                _ => false,
            };
            if fire {
                info!("idle: timeout reached");
                on_idle();
            }
        }));
    }

    /// Route an input event; resets the countdown when `kind` counts as
    /// activity.  Returns whether it did.
    pub fn notify(&mut self, kind: InputKind) -> bool {
        if !self.reset_on.contains(&kind) {
            return false;
        }
        debug!("idle: reset by {:?}", kind);
        self.reset();
        true
    }

    /// Pending expiry, if a countdown is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.countdown.lock().ok().and_then(|c| c.deadline)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Drop for IdleController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
