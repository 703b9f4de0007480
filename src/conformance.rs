//! Behavioral checks any [`Handoff`] implementation must pass.
//!
//! Enabled with the `conformance` feature. Every check panics on violation,
//! so they are meant to be called from tests:
//!
//! ```
//! handoff::conformance::run_all(handoff::RendezvousChannel::new);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::error::ChannelError;
use crate::sync::Handoff;
use crate::time::Timeout;

/// Long enough for a blocked peer to actually be parked.
const SETTLE: Duration = Duration::from_millis(30);

/// Run every check, each against a fresh channel from `make`.
pub fn run_all<H, F>(make: F)
where
    H: Handoff,
    F: Fn() -> H,
{
    ordered_delivery(&make(), 200);
    send_waits_for_receiver(&make());
    close_before_send(&make());
    close_releases_receiver(&make());
    close_releases_sender(&make());
    close_races_pending_send(&make);
    send_timeout_leaves_nothing_behind(&make());
    recv_timeout_without_sender(&make());
}

/// One producer sending `0..count` is seen by one consumer in order.
pub fn ordered_delivery<H: Handoff>(channel: &H, count: i32) {
    let received = thread::scope(|s| {
        s.spawn(|| {
            for value in 0..count {
                channel.send(value).expect("send to open channel");
            }
        });
        (0..count)
            .map(|_| channel.recv().expect("recv from open channel"))
            .collect::<Vec<_>>()
    });
    assert_eq!(received, (0..count).collect::<Vec<_>>());
}

/// `send(v)` does not return before a `recv` has been entered for `v`.
///
/// Sends 1, 2, 3 against a deliberately slow receiver.
pub fn send_waits_for_receiver<H: Handoff>(channel: &H) {
    let recv_calls = AtomicUsize::new(0);
    thread::scope(|s| {
        let receiver = s.spawn(|| {
            let mut received = Vec::new();
            for _ in 0..3 {
                thread::sleep(SETTLE);
                recv_calls.fetch_add(1, Ordering::SeqCst);
                received.push(channel.recv().expect("recv from open channel"));
            }
            received
        });

        for value in 1..=3 {
            channel.send(value).expect("send to open channel");
            let calls = recv_calls.load(Ordering::SeqCst);
            assert!(
                calls >= value as usize,
                "send({value}) returned after only {calls} recv calls"
            );
        }
        assert_eq!(receiver.join().unwrap(), vec![1, 2, 3]);
    });
}

/// A receive on a channel closed before any send fails right away.
pub fn close_before_send<H: Handoff>(channel: &H) {
    channel.close();
    assert!(channel.is_closed());
    assert_eq!(channel.recv(), Err(ChannelError::Closed));
    assert_eq!(channel.send(1), Err(ChannelError::Closed));
    channel.close();
    assert_eq!(
        channel.recv_timeout(Timeout::Duration(SETTLE)),
        Err(ChannelError::Closed)
    );
}

pub fn close_releases_receiver<H: Handoff>(channel: &H) {
    thread::scope(|s| {
        let receiver = s.spawn(|| channel.recv());
        thread::sleep(SETTLE);
        channel.close();
        assert_eq!(receiver.join().unwrap(), Err(ChannelError::Closed));
    });
}

/// A send published but never consumed is released by close.
pub fn close_releases_sender<H: Handoff>(channel: &H) {
    thread::scope(|s| {
        let sender = s.spawn(|| channel.send(42));
        thread::sleep(SETTLE);
        channel.close();
        assert_eq!(sender.join().unwrap(), Err(ChannelError::Closed));
    });
    assert_eq!(channel.recv(), Err(ChannelError::Closed));
}

/// Close racing a send and a receive never hangs either side, and the
/// sender reports success exactly when the receiver got the value.
pub fn close_races_pending_send<H, F>(make: F)
where
    H: Handoff,
    F: Fn() -> H,
{
    for round in 0..200 {
        let channel = make();
        thread::scope(|s| {
            let sender = s.spawn(|| channel.send(round));
            let receiver = s.spawn(|| channel.recv());
            if round % 2 == 0 {
                thread::yield_now();
            }
            channel.close();

            let sent = sender.join().unwrap();
            let received = receiver.join().unwrap();
            assert!(
                matches!(sent, Ok(()) | Err(ChannelError::Closed)),
                "unexpected send result {sent:?}"
            );
            assert!(
                matches!(received, Ok(v) if v == round) || received == Err(ChannelError::Closed),
                "unexpected recv result {received:?}"
            );
            // Delivered exactly when the sender reports success.
            assert_eq!(
                sent.is_ok(),
                received == Ok(round),
                "send {sent:?} disagrees with recv {received:?}"
            );
        });
    }
}

/// An expired send leaves no value for a later receiver.
pub fn send_timeout_leaves_nothing_behind<H: Handoff>(channel: &H) {
    assert_eq!(
        channel.send_timeout(7, Timeout::Duration(SETTLE)),
        Err(ChannelError::Timeout)
    );
    assert_eq!(
        channel.recv_timeout(Timeout::Duration(SETTLE)),
        Err(ChannelError::Timeout)
    );
    assert!(!channel.is_closed());
}

pub fn recv_timeout_without_sender<H: Handoff>(channel: &H) {
    assert_eq!(
        channel.recv_timeout(Timeout::Duration(Duration::ZERO)),
        Err(ChannelError::Timeout)
    );
    assert_eq!(
        channel.recv_timeout(Timeout::Duration(SETTLE)),
        Err(ChannelError::Timeout)
    );
}
