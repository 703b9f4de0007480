//! Synchronous rendezvous channels for handing `i32` values between threads.
//!
//! A send completes only once the receiver has taken the value, there is no
//! buffering beyond the single in-flight value.
//!
//! ## Shared channel
//!
//! ```
//! use handoff::RendezvousChannel;
//!
//! let channel = RendezvousChannel::new();
//! let received = std::thread::scope(|s| {
//!     s.spawn(|| {
//!         for value in [1, 2, 3] {
//!             channel.send(value).unwrap();
//!         }
//!         channel.close();
//!     });
//!     std::iter::from_fn(|| channel.recv().ok()).collect::<Vec<_>>()
//! });
//! assert_eq!(received, [1, 2, 3]);
//! ```
//!
//! ## Split halves
//!
//! ```
//! use std::time::Duration;
//! use handoff::{channel, ChannelError};
//!
//! let (tx, rx) = channel();
//! assert_eq!(tx.send_timeout(1, Duration::from_millis(10)), Err(ChannelError::Timeout));
//! drop(rx);
//! assert_eq!(tx.send(1), Err(ChannelError::Closed));
//! ```
//!
//! ## Features
//!
//! - `tracing`: log channel events through [`tracing`](https://docs.rs/tracing),
//!   see [`init_tracing`].
//! - `conformance`: the `conformance` module of checks for [`Handoff`]
//!   implementations.

pub use error::{ChannelError, TryRecvError};
pub use sync::{channel, Handoff, Receiver, RendezvousChannel, Sender};
pub use time::Timeout;
pub use trace::init_tracing;

#[cfg(any(test, feature = "conformance"))]
pub mod conformance;
mod error;
pub mod sync;
pub mod thread;
pub mod time;
mod trace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendezvous_channel_conforms() {
        conformance::run_all(RendezvousChannel::new);
    }

    #[test]
    fn close_race_is_exactly_once() {
        for round in 0..200 {
            let channel = RendezvousChannel::new();
            std::thread::scope(|s| {
                let sender = s.spawn(|| channel.send(round));
                let receiver = s.spawn(|| channel.recv());
                channel.close();
                let sent = sender.join().unwrap();
                let received = receiver.join().unwrap();
                assert_eq!(sent.is_ok(), received == Ok(round), "{sent:?} {received:?}");
            });
        }
    }
}
