//! Two-party strict-alternation handoff.
//!
//! # Design
//!
//! A control channel connects exactly one engine end and one task end.  Each
//! direction is a `crossbeam_channel::bounded(1)` queue: a side yields by
//! sending its message and takes control by blocking on the other queue.
//!
//! Two layers of checking keep the "exactly one runnable side" invariant:
//!
//! - each end tracks locally whether it holds control, so a second
//!   `take_control` before yielding (`DoubleTake`) or a `yield_control`
//!   without holding (`YieldWithoutControl`) is caught on the offending side;
//! - a shared holder flag is flipped by the yielding side *before* it sends,
//!   and checked by the receiving side after it wakes (`HandoffMismatch`).
//!
//! Dropping either end disconnects the channel; the other side's next
//! blocking call returns `Disconnected`.  The engine uses this to tear down
//! suspended tasks at the end of a run.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::error::{ChannelError, ChannelResult};

/// One party of a control channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Engine,
    Task,
}

impl Side {
    #[inline]
    fn other(self) -> Side {
        match self {
            Side::Engine => Side::Task,
            Side::Task => Side::Engine,
        }
    }

    #[inline]
    fn to_flag(self) -> u8 {
        match self {
            Side::Engine => 0,
            Side::Task => 1,
        }
    }

    #[inline]
    fn from_flag(flag: u8) -> Side {
        if flag == 0 { Side::Engine } else { Side::Task }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Engine => f.write_str("engine"),
            Side::Task => f.write_str("task"),
        }
    }
}

// ── Shared half-duplex endpoint ───────────────────────────────────────────────

/// The machinery common to both ends: `S` is what this side sends, `R` what
/// it receives.
struct Endpoint<S, R> {
    side:    Side,
    tx:      Sender<S>,
    rx:      Receiver<R>,
    holder:  Arc<AtomicU8>,
    holding: bool,
}

impl<S, R> Endpoint<S, R> {
    fn take_control(&mut self) -> ChannelResult<R> {
        if self.holding {
            return Err(ChannelError::DoubleTake { side: self.side });
        }
        let msg = self.rx.recv().map_err(|_| ChannelError::Disconnected { side: self.side.other() })?;
        let holder = Side::from_flag(self.holder.load(Ordering::Acquire));
        if holder != self.side {
            return Err(ChannelError::HandoffMismatch { side: self.side, holder });
        }
        self.holding = true;
        Ok(msg)
    }

    fn yield_control(&mut self, msg: S) -> ChannelResult<()> {
        if !self.holding {
            return Err(ChannelError::YieldWithoutControl { side: self.side });
        }
        self.holding = false;
        self.holder.store(self.side.other().to_flag(), Ordering::Release);
        self.tx.send(msg).map_err(|_| ChannelError::Disconnected { side: self.side.other() })
    }
}

// ── Public ends ───────────────────────────────────────────────────────────────

/// The engine's end.  `D` flows down to the task, `U` comes back up.
pub struct EngineEnd<D, U> {
    inner: Endpoint<D, U>,
}

/// The task's end.
pub struct TaskEnd<D, U> {
    inner: Endpoint<U, D>,
}

/// Create a connected pair.  The engine starts out holding control.
pub fn control_channel<D, U>() -> (EngineEnd<D, U>, TaskEnd<D, U>) {
    let (down_tx, down_rx) = bounded::<D>(1);
    let (up_tx, up_rx) = bounded::<U>(1);
    let holder = Arc::new(AtomicU8::new(Side::Engine.to_flag()));

    let engine = EngineEnd {
        inner: Endpoint { side: Side::Engine, tx: down_tx, rx: up_rx, holder: Arc::clone(&holder), holding: true },
    };
    let task = TaskEnd {
        inner: Endpoint { side: Side::Task, tx: up_tx, rx: down_rx, holder, holding: false },
    };
    (engine, task)
}

impl<D, U> EngineEnd<D, U> {
    /// Hand control to the task.
    pub fn yield_control(&mut self, msg: D) -> ChannelResult<()> {
        self.inner.yield_control(msg)
    }

    /// Block until the task hands control back.
    pub fn take_control(&mut self) -> ChannelResult<U> {
        self.inner.take_control()
    }

    /// One full turn: yield to the task and wait for it to yield back.
    pub fn resume(&mut self, msg: D) -> ChannelResult<U> {
        self.yield_control(msg)?;
        self.take_control()
    }

    pub fn holds_control(&self) -> bool {
        self.inner.holding
    }

    /// Which side the shared flag says is runnable.
    pub fn holder(&self) -> Side {
        Side::from_flag(self.inner.holder.load(Ordering::Acquire))
    }
}

impl<D, U> TaskEnd<D, U> {
    /// Block until the engine hands over control.
    pub fn take_control(&mut self) -> ChannelResult<D> {
        self.inner.take_control()
    }

    /// Hand control back to the engine.
    pub fn yield_control(&mut self, msg: U) -> ChannelResult<()> {
        self.inner.yield_control(msg)
    }

    pub fn holds_control(&self) -> bool {
        self.inner.holding
    }
}
