//! Owned sending and receiving halves of one [`RendezvousChannel`].
//!
//! Each half closes the channel on drop, so a peer blocked on the other
//! half is released instead of waiting forever.
//!
//! ```
//! use handoff::{channel, thread};
//!
//! let (tx, rx) = channel();
//! let worker = thread::spawn("summer", move || rx.into_iter().sum::<i32>()).unwrap();
//! for value in 1..=4 {
//!     tx.send(value).unwrap();
//! }
//! drop(tx);
//! assert_eq!(worker.join().unwrap(), 10);
//! ```
//!
//! Halves can be moved to another thread but not shared:
//!
//! ```compile_fail
//! use handoff::channel;
//!
//! let (tx, _rx) = channel();
//! std::thread::scope(|s| {
//!     s.spawn(|| tx.send(1));
//!     s.spawn(|| tx.send(2));
//! });
//! ```

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;

use super::RendezvousChannel;
use crate::error::{ChannelError, TryRecvError};
use crate::time::Timeout;

/// Marker type to opt-out of `Sync` while remaining `Send`.
type PhantomUnsync = PhantomData<Cell<&'static ()>>;

/// Create a channel and split it into its two halves.
#[must_use]
pub fn channel() -> (Sender, Receiver) {
    let channel = Arc::new(RendezvousChannel::new());
    (
        Sender {
            channel: Arc::clone(&channel),
            _unsync: PhantomData,
        },
        Receiver {
            channel,
            _unsync: PhantomData,
        },
    )
}

/// Sending half. Closes the channel on drop.
#[derive(Debug)]
pub struct Sender {
    channel: Arc<RendezvousChannel>,
    _unsync: PhantomUnsync,
}

impl Sender {
    /// See [`RendezvousChannel::send`].
    pub fn send(&self, value: i32) -> Result<(), ChannelError> {
        self.channel.send(value)
    }

    pub fn send_timeout(&self, value: i32, timeout: impl Into<Timeout>) -> Result<(), ChannelError> {
        self.channel.send_timeout(value, timeout)
    }

    pub fn close(&self) {
        self.channel.close()
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        self.channel.close();
    }
}

/// Receiving half. Closes the channel on drop.
#[derive(Debug)]
pub struct Receiver {
    channel: Arc<RendezvousChannel>,
    _unsync: PhantomUnsync,
}

impl Receiver {
    /// See [`RendezvousChannel::recv`].
    pub fn recv(&self) -> Result<i32, ChannelError> {
        self.channel.recv()
    }

    pub fn recv_timeout(&self, timeout: impl Into<Timeout>) -> Result<i32, ChannelError> {
        self.channel.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<i32, TryRecvError> {
        self.channel.try_recv()
    }

    pub fn close(&self) {
        self.channel.close()
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Iterate over received values until the channel closes.
    pub fn iter(&self) -> Iter<'_> {
        Iter { receiver: self }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.channel.close();
    }
}

impl<'a> IntoIterator for &'a Receiver {
    type Item = i32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Receiver {
    type Item = i32;
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { receiver: self }
    }
}

pub struct Iter<'a> {
    receiver: &'a Receiver,
}

impl Iterator for Iter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.receiver.channel.remaining())
    }
}

pub struct IntoIter {
    receiver: Receiver,
}

impl Iterator for IntoIter {
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.receiver.channel.remaining())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn dropping_sender_ends_iteration() {
        let (tx, rx) = channel();
        let consumer = thread::spawn(move || rx.iter().collect::<Vec<_>>());
        for value in [4, 5, 6] {
            tx.send(value).unwrap();
        }
        drop(tx);
        assert_eq!(consumer.join().unwrap(), vec![4, 5, 6]);
    }

    #[test]
    fn dropping_receiver_releases_sender() {
        let (tx, rx) = channel();
        let producer = thread::spawn(move || tx.send(1));
        thread::sleep(Duration::from_millis(20));
        drop(rx);
        assert_eq!(producer.join().unwrap(), Err(ChannelError::Closed));
    }

    #[test]
    fn closed_iterator_hints_empty() {
        let (tx, rx) = channel();
        assert_eq!(rx.iter().size_hint(), (0, None));
        tx.close();
        assert!(rx.is_closed());
        assert_eq!(rx.iter().size_hint(), (0, Some(0)));
        assert_eq!(rx.into_iter().next(), None);
    }

    #[test]
    fn closed_iterator_hint_covers_resident_value() {
        for _ in 0..200 {
            let (tx, rx) = channel();
            let producer = thread::spawn(move || tx.send(5));
            while !format!("{rx:?}").contains("Some(5)") {
                thread::yield_now();
            }
            rx.close();
            let (_, upper) = rx.iter().size_hint();
            let next = rx.iter().next();
            if next.is_some() {
                assert!(upper.is_some_and(|max| max >= 1), "hint {upper:?} before {next:?}");
            }
            assert_eq!(producer.join().unwrap().is_ok(), next == Some(5));
            assert_eq!(rx.iter().size_hint(), (0, Some(0)));
        }
    }

    #[test]
    fn halves_time_out_independently() {
        let (tx, rx) = channel();
        let short = Duration::from_millis(20);
        assert_eq!(tx.send_timeout(1, short), Err(ChannelError::Timeout));
        assert_eq!(rx.recv_timeout(short), Err(ChannelError::Timeout));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert!(!tx.is_closed());
    }
}
