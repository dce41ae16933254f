//! Button sources for the CLI: presses scripted on the command line, lines
//! typed on stdin, and (on the Pi) the physical buttons underneath.

use bench_traits::{ButtonLatch, ButtonSource, Clock};
use crossbeam_channel as xch;
use std::collections::VecDeque;
use std::io::BufRead;
use std::str::FromStr;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Primary,
    Secondary,
    Long,
    NextMode,
}

impl PressKind {
    pub fn latch(self) -> ButtonLatch {
        let mut l = ButtonLatch::default();
        match self {
            Self::Primary => l.primary = true,
            Self::Secondary => l.secondary = true,
            Self::Long => l.secondary_long = true,
            Self::NextMode => l.next_mode = true,
        }
        l
    }
}

impl FromStr for PressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "primary" => Ok(Self::Primary),
            "s" | "secondary" => Ok(Self::Secondary),
            "l" | "long" => Ok(Self::Long),
            "m" | "next" | "mode" => Ok(Self::NextMode),
            other => Err(format!(
                "unknown button '{other}' (primary|secondary|long|next)"
            )),
        }
    }
}

/// `MS:EVENT`, a press delivered once `MS` milliseconds into the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    pub at_ms: u64,
    pub kind: PressKind,
}

impl FromStr for Press {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ms, kind) = s
            .split_once(':')
            .ok_or_else(|| format!("expected MS:EVENT, got '{s}'"))?;
        let at_ms = ms
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("bad press time '{ms}': {e}"))?;
        Ok(Self {
            at_ms,
            kind: kind.parse()?,
        })
    }
}

/// Merges scripted presses, stdin events and an optional physical source.
pub struct ScheduledButtons<C: Clock> {
    clock: C,
    epoch: Instant,
    presses: VecDeque<Press>,
    stdin: Option<xch::Receiver<ButtonLatch>>,
    inner: Option<Box<dyn ButtonSource>>,
}

impl<C: Clock> ScheduledButtons<C> {
    pub fn new(clock: C, mut presses: Vec<Press>) -> Self {
        presses.sort_by_key(|p| p.at_ms);
        let epoch = clock.now();
        Self {
            clock,
            epoch,
            presses: presses.into(),
            stdin: None,
            inner: None,
        }
    }

    pub fn with_stdin(mut self, rx: xch::Receiver<ButtonLatch>) -> Self {
        self.stdin = Some(rx);
        self
    }

    pub fn with_inner(mut self, inner: Box<dyn ButtonSource>) -> Self {
        self.inner = Some(inner);
        self
    }
}

impl<C: Clock> ButtonSource for ScheduledButtons<C> {
    fn poll(&mut self) -> ButtonLatch {
        let now_ms = self.clock.ms_since(self.epoch);
        let mut latch = ButtonLatch::default();
        while self.presses.front().is_some_and(|p| p.at_ms <= now_ms) {
            if let Some(p) = self.presses.pop_front() {
                tracing::debug!(at_ms = p.at_ms, kind = ?p.kind, "scripted press");
                latch.merge(p.kind.latch());
            }
        }
        if let Some(rx) = &self.stdin {
            while let Ok(l) = rx.try_recv() {
                latch.merge(l);
            }
        }
        if let Some(inner) = self.inner.as_mut() {
            latch.merge(inner.poll());
        }
        latch
    }
}

/// Reader thread turning stdin lines (`p`, `s`, `l`, `m`) into latches.
/// The thread ends at EOF or once the receiver is dropped.
pub fn spawn_stdin_reader() -> xch::Receiver<ButtonLatch> {
    let (tx, rx) = xch::unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<PressKind>() {
                Ok(kind) => {
                    if tx.send(kind.latch()).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "ignored stdin input"),
            }
        }
        tracing::trace!("stdin reader exiting");
    });
    rx
}
