//! Worker threads that are joined when their handle goes away.
//!
//! Paired with the halves from [`channel`](crate::channel) this gives the
//! close-then-join shutdown: dropping a half closes the channel, which lets
//! the worker blocked on the other half return, and dropping its
//! [`JoinGuard`] waits for that.
//!
//! ```
//! use handoff::{channel, thread};
//!
//! let (tx, rx) = channel();
//! let worker = thread::spawn("echo", move || {
//!     while let Ok(value) = rx.recv() {
//!         println!("got {value}");
//!     }
//! })
//! .unwrap();
//! tx.send(1).unwrap();
//! drop(tx);
//! drop(worker);
//! ```

use std::io;
use std::mem::{self, ManuallyDrop};
use std::thread::{self, JoinHandle};

use crate::trace::trace;

/// Spawn a named thread, joined when the returned guard drops.
///
/// # Errors
///
/// Fails if the OS refuses to create the thread.
pub fn spawn<F, T>(name: impl Into<String>, f: F) -> io::Result<JoinGuard<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let child = thread::Builder::new().name(name.into()).spawn(f)?;
    Ok(JoinGuard {
        child: ManuallyDrop::new(child),
    })
}

/// Handle to a thread, which joins on drop.
///
/// To spawn use [`spawn`].
#[derive(Debug)]
pub struct JoinGuard<T> {
    child: ManuallyDrop<JoinHandle<T>>,
}

impl<T> JoinGuard<T> {
    pub fn join(mut self) -> thread::Result<T> {
        // SAFETY: `self` is forgotten right after, `child` is never used again
        let child = unsafe { ManuallyDrop::take(&mut self.child) };
        mem::forget(self);
        child.join()
    }

    pub fn thread(&self) -> &thread::Thread {
        self.child.thread()
    }

    pub fn is_finished(&self) -> bool {
        self.child.is_finished()
    }

    /// Give up joining on drop.
    pub fn into_handle(mut self) -> JoinHandle<T> {
        // SAFETY: same as in `join`
        let child = unsafe { ManuallyDrop::take(&mut self.child) };
        mem::forget(self);
        child
    }
}

impl<T> Drop for JoinGuard<T> {
    fn drop(&mut self) {
        // SAFETY: drop runs once and `child` is not touched afterwards
        let join_handle = unsafe { ManuallyDrop::take(&mut self.child) };
        let child = join_handle.thread().clone();
        trace!(thread = ?child.name(), "joining worker");
        let res = join_handle.join();
        // Propagate the child's panic, unless already unwinding.
        if res.is_err() && !thread::panicking() {
            panic!("child thread {child:?} panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn drop_waits_for_child() {
        let done = Arc::new(AtomicBool::new(false));
        let guard = spawn("sleeper", {
            let done = Arc::clone(&done);
            move || {
                thread::sleep(std::time::Duration::from_millis(20));
                done.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();
        assert_eq!(guard.thread().name(), Some("sleeper"));
        drop(guard);
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn join_returns_value() {
        let guard = spawn("answer", || 42).unwrap();
        assert_eq!(guard.join().unwrap(), 42);
    }

    #[test]
    fn join_reports_panic() {
        let guard = spawn("doomed", || panic!("boom")).unwrap();
        assert!(guard.join().is_err());
    }

    #[test]
    #[should_panic(expected = "panicked")]
    fn drop_propagates_panic() {
        let guard = spawn("doomed", || panic!("boom")).unwrap();
        drop(guard);
    }

    #[test]
    fn into_handle_detaches() {
        let handle = spawn("detached", || 1).unwrap().into_handle();
        assert_eq!(handle.join().unwrap(), 1);
    }
}
