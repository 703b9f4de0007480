//! Mutex and condition variable rendezvous channel.
//!
//! # Examples
//!
//! ```
//! use handoff::RendezvousChannel;
//!
//! let channel = RendezvousChannel::new();
//! std::thread::scope(|s| {
//!     s.spawn(|| channel.send(7).unwrap());
//!     assert_eq!(channel.recv(), Ok(7));
//! });
//! channel.destroy();
//! ```
//!
//! Closing releases a blocked receiver.
//!
//! ```
//! use handoff::{ChannelError, RendezvousChannel};
//!
//! let channel = RendezvousChannel::new();
//! std::thread::scope(|s| {
//!     let rx = s.spawn(|| channel.recv());
//!     channel.close();
//!     assert_eq!(rx.join().unwrap(), Err(ChannelError::Closed));
//! });
//! ```

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Instant;

use super::Handoff;
use crate::error::{ChannelError, TryRecvError};
use crate::time::Timeout;
use crate::trace::{debug, trace};

struct State {
    slot: Option<i32>,
    closed: bool,
    /// Number of values consumed so far.
    taken: u64,
}

/// Synchronous channel handing one `i32` at a time from a sender to a
/// receiver.
///
/// [`send`](Self::send) returns only once a receiver took the value. Meant
/// for exactly one sending and one receiving thread at a time; more callers
/// on either side is a usage error.
pub struct RendezvousChannel {
    state: Mutex<State>,
    /// Signaled when the slot becomes full.
    not_empty: Condvar,
    /// Signaled when the slot becomes empty.
    not_full: Condvar,
}

impl RendezvousChannel {
    pub const fn new() -> Self {
        RendezvousChannel {
            state: Mutex::new(State {
                slot: None,
                closed: false,
                taken: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Nothing panics while holding the lock, the state is consistent
        // even if poisoned.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `value` and block until a receiver has taken it.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] if the channel is closed before the value
    /// was taken. The value is never delivered in that case.
    pub fn send(&self, value: i32) -> Result<(), ChannelError> {
        self.send_timeout(value, Timeout::Infinite)
    }

    /// Like [`send`](Self::send), giving up once `timeout` passes.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Timeout`] on expiry. A value published before expiry
    /// is taken back, so the slot looks as if the call never happened.
    pub fn send_timeout(&self, value: i32, timeout: impl Into<Timeout>) -> Result<(), ChannelError> {
        let deadline = timeout.into().deadline();

        let mut state = wait_while(&self.not_full, self.lock(), deadline, |s| {
            s.slot.is_some() && !s.closed
        });
        if state.closed {
            return Err(ChannelError::Closed);
        }
        if state.slot.is_some() {
            debug!(value, "send timed out waiting for an empty slot");
            return Err(ChannelError::Timeout);
        }

        state.slot = Some(value);
        let ticket = state.taken + 1;
        trace!(value, ticket, "published");
        self.not_empty.notify_one();

        let mut state = wait_while(&self.not_full, state, deadline, |s| {
            s.taken < ticket && !s.closed
        });
        if state.taken >= ticket {
            return Ok(());
        }

        // Only a receiver clears the slot and it bumps `taken` when it does,
        // so the value is still ours.
        state.slot = None;
        self.not_full.notify_all();
        trace!(value, ticket, "retracted");
        if state.closed {
            Err(ChannelError::Closed)
        } else {
            debug!(value, "send timed out waiting for a receiver");
            Err(ChannelError::Timeout)
        }
    }

    /// Block until a value is published and take it.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] once the channel is closed and no value is
    /// left in the slot.
    pub fn recv(&self) -> Result<i32, ChannelError> {
        self.recv_timeout(Timeout::Infinite)
    }

    /// Like [`recv`](Self::recv), giving up once `timeout` passes.
    pub fn recv_timeout(&self, timeout: impl Into<Timeout>) -> Result<i32, ChannelError> {
        let deadline = timeout.into().deadline();
        let state = wait_while(&self.not_empty, self.lock(), deadline, |s| {
            s.slot.is_none() && !s.closed
        });
        self.take(state).map_err(|err| match err {
            TryRecvError::Empty => {
                debug!("recv timed out");
                ChannelError::Timeout
            }
            TryRecvError::Closed => ChannelError::Closed,
        })
    }

    /// Take a published value without blocking.
    pub fn try_recv(&self) -> Result<i32, TryRecvError> {
        self.take(self.lock())
    }

    fn take(&self, mut state: MutexGuard<'_, State>) -> Result<i32, TryRecvError> {
        match state.slot.take() {
            Some(value) => {
                state.taken += 1;
                trace!(value, taken = state.taken, "taken");
                // Wakes a sender awaiting consumption as well as one waiting
                // to publish.
                self.not_full.notify_all();
                Ok(value)
            }
            None if state.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Close the channel, releasing every blocked sender and receiver.
    ///
    /// A value already taken by a receiver still counts as delivered.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            debug!(taken = state.taken, "closing rendezvous channel");
            state.closed = true;
        }
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Upper bound on values a receiver can still get, `None` while open.
    ///
    /// A value published before the close may still be taken.
    pub(crate) fn remaining(&self) -> Option<usize> {
        let state = self.lock();
        state.closed.then(|| usize::from(state.slot.is_some()))
    }

    /// Release the channel.
    ///
    /// Taking `self` by value guarantees no thread is still blocked on it.
    pub fn destroy(self) {}
}

impl Default for RendezvousChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RendezvousChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("RendezvousChannel");
        let state = match self.state.try_lock() {
            Ok(state) => Some(state),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };
        match state {
            Some(state) => {
                d.field("slot", &state.slot)
                    .field("closed", &state.closed)
                    .field("taken", &state.taken);
            }
            None => {
                d.field("state", &format_args!("<locked>"));
            }
        }
        d.finish()
    }
}

impl Handoff for RendezvousChannel {
    fn send_timeout(&self, value: i32, timeout: Timeout) -> Result<(), ChannelError> {
        RendezvousChannel::send_timeout(self, value, timeout)
    }

    fn recv_timeout(&self, timeout: Timeout) -> Result<i32, ChannelError> {
        RendezvousChannel::recv_timeout(self, timeout)
    }

    fn close(&self) {
        RendezvousChannel::close(self)
    }

    fn is_closed(&self) -> bool {
        RendezvousChannel::is_closed(self)
    }
}

/// Wait on `cond` while `blocked` holds, up to `deadline`.
///
/// Callers re-inspect the state afterwards to tell expiry from success.
fn wait_while<'a, F>(
    cond: &Condvar,
    guard: MutexGuard<'a, State>,
    deadline: Option<Instant>,
    blocked: F,
) -> MutexGuard<'a, State>
where
    F: FnMut(&mut State) -> bool,
{
    match deadline {
        None => cond
            .wait_while(guard, blocked)
            .unwrap_or_else(PoisonError::into_inner),
        Some(deadline) => {
            let timeout = deadline.saturating_duration_since(Instant::now());
            cond.wait_timeout_while(guard, timeout, blocked)
                .unwrap_or_else(PoisonError::into_inner)
                .0
        }
    }
}
