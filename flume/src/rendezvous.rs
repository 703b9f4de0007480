//! Rendezvous channel built from `flume::bounded(0)`.
//!
//! flume has no explicit close, it disconnects when one side is dropped.
//! Closing is modeled with a second channel nobody ever sends on: dropping
//! its only sender disconnects it, and every blocking operation selects
//! over it next to the data channel.
//!
//! A selector that gives up on a send removes the pending message only
//! after deciding, so a receiver can still take it in between. Every
//! message carries a ticket, and sender and receiver settle the ticket
//! under one lock: a ticket the sender gave up on is dropped by the
//! receiver, a ticket the receiver accepted turns the sender's failure
//! into success.
//!
//! # Examples
//!
//! ```
//! use handoff::{ChannelError, Handoff};
//! use handoff_flume::FlumeRendezvous;
//!
//! let channel = FlumeRendezvous::new();
//! std::thread::scope(|s| {
//!     s.spawn(|| channel.send(3).unwrap());
//!     assert_eq!(channel.recv(), Ok(3));
//! });
//! channel.close();
//! assert_eq!(channel.recv(), Err(ChannelError::Closed));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use handoff::{ChannelError, Handoff, Timeout};

type Message = (u64, i32);

#[derive(Debug, Default)]
struct Tickets {
    issued: u64,
    accepted: u64,
    /// Given up by the sender, possibly still in flight.
    retracted: BTreeSet<u64>,
}

pub struct FlumeRendezvous {
    tx: flume::Sender<Message>,
    rx: flume::Receiver<Message>,
    tickets: Mutex<Tickets>,
    /// Dropped on close.
    shutdown: Mutex<Option<flume::Sender<()>>>,
    closed: flume::Receiver<()>,
}

impl FlumeRendezvous {
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(0);
        let (shutdown, closed) = flume::bounded(0);
        FlumeRendezvous {
            tx,
            rx,
            tickets: Mutex::new(Tickets::default()),
            shutdown: Mutex::new(Some(shutdown)),
            closed,
        }
    }

    fn tickets(&self) -> MutexGuard<'_, Tickets> {
        // Nothing panics while holding the lock
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FlumeRendezvous {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FlumeRendezvous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlumeRendezvous")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Handoff for FlumeRendezvous {
    fn send_timeout(&self, value: i32, timeout: Timeout) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        let ticket = {
            let mut tickets = self.tickets();
            tickets.issued += 1;
            tickets.issued
        };
        let selector = flume::Selector::new()
            .send(&self.tx, (ticket, value), |res| {
                res.map_err(|_| ChannelError::Closed)
            })
            .recv(&self.closed, |_| Err(ChannelError::Closed));

        let err = match wait(selector, timeout.deadline()) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let mut tickets = self.tickets();
        if tickets.accepted == ticket {
            return Ok(());
        }
        tickets.retracted.insert(ticket);
        Err(err)
    }

    fn recv_timeout(&self, timeout: Timeout) -> Result<i32, ChannelError> {
        let deadline = timeout.deadline();
        loop {
            if self.is_closed() {
                return Err(ChannelError::Closed);
            }
            let selector = flume::Selector::new()
                .recv(&self.rx, |res| res.map_err(|_| ChannelError::Closed))
                .recv(&self.closed, |_| Err(ChannelError::Closed));
            let (ticket, value) = wait(selector, deadline)?;

            let mut tickets = self.tickets();
            if tickets.retracted.remove(&ticket) {
                continue;
            }
            tickets.accepted = ticket;
            // Older tickets can no longer arrive.
            tickets.retracted.retain(|&t| t > ticket);
            return Ok(value);
        }
    }

    fn close(&self) {
        // Error means a waiter panicked, the option is still valid
        drop(
            self.shutdown
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }

    fn is_closed(&self) -> bool {
        self.closed.is_disconnected()
    }
}

fn wait<T>(
    selector: flume::Selector<'_, Result<T, ChannelError>>,
    deadline: Option<Instant>,
) -> Result<T, ChannelError> {
    match deadline {
        None => selector.wait(),
        Some(deadline) => selector
            .wait_deadline(deadline)
            .unwrap_or(Err(ChannelError::Timeout)),
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn conforms() {
        handoff::conformance::run_all(FlumeRendezvous::new);
    }

    #[test]
    fn close_race_is_exactly_once() {
        for round in 0..500 {
            let channel = FlumeRendezvous::new();
            thread::scope(|s| {
                let sender = s.spawn(|| channel.send(round));
                let receiver = s.spawn(|| channel.recv());
                channel.close();
                let sent = sender.join().unwrap();
                let received = receiver.join().unwrap();
                assert_eq!(sent.is_ok(), received == Ok(round), "{sent:?} {received:?}");
            });
        }
    }

    #[test]
    fn retracted_ticket_is_dropped_by_receiver() {
        let channel = FlumeRendezvous::new();
        // Simulate a message the sender gave up on but flume still handed over.
        channel.tickets().retracted.insert(1);
        channel.tickets().issued = 1;
        thread::scope(|s| {
            s.spawn(|| {
                channel.tx.send((1, 10)).unwrap();
                channel.send(20).unwrap();
            });
            assert_eq!(channel.recv(), Ok(20));
        });
        let tickets = channel.tickets();
        assert_eq!(tickets.accepted, 2);
        assert!(tickets.retracted.is_empty());
    }

    #[test]
    fn timed_out_send_is_remembered_until_overtaken() {
        let channel = FlumeRendezvous::new();
        let short = Timeout::Duration(Duration::from_millis(20));
        assert_eq!(channel.send_timeout(1, short), Err(ChannelError::Timeout));
        assert!(channel.tickets().retracted.contains(&1));

        thread::scope(|s| {
            s.spawn(|| channel.send(2).unwrap());
            assert_eq!(channel.recv(), Ok(2));
        });
        assert!(channel.tickets().retracted.is_empty());
    }

    #[test]
    fn debug_reports_closed() {
        let channel = FlumeRendezvous::default();
        assert_eq!(format!("{channel:?}"), "FlumeRendezvous { closed: false, .. }");
        channel.close();
        assert_eq!(format!("{channel:?}"), "FlumeRendezvous { closed: true, .. }");
    }

    #[test]
    fn matches_core_channel_on_a_stream() {
        let flume = FlumeRendezvous::new();
        let core = handoff::RendezvousChannel::new();
        let values = [5, -1, 5, i32::MAX, 0];

        let collect = |channel: &dyn Handoff| {
            thread::scope(|s| {
                s.spawn(|| {
                    for value in values {
                        channel.send(value).unwrap();
                    }
                    channel.close();
                });
                std::iter::from_fn(|| channel.recv().ok()).collect::<Vec<_>>()
            })
        };
        assert_eq!(collect(&flume), collect(&core));
        assert_eq!(collect(&FlumeRendezvous::new()), values);
    }
}
