//! Blocking handoffs driven from async code.
//!
//! Each call runs the blocking operation on tokio's blocking thread pool,
//! so a task can wait for its peer without stalling a runtime worker.
//!
//! Dropping a pending future does not cancel the blocking call behind it.
//! Close the channel to release it.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use handoff::RendezvousChannel;
//! use handoff_tokio::AsyncHandoff;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let channel = AsyncHandoff::new(Arc::new(RendezvousChannel::new()));
//! let tx = channel.clone();
//! let sent = tokio::spawn(async move { tx.send(8).await });
//! assert_eq!(channel.recv().await.unwrap(), 8);
//! sent.await.unwrap().unwrap();
//! # });
//! ```

use std::sync::Arc;

use handoff::{ChannelError, Handoff, Timeout};
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum AsyncHandoffError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    /// The blocking call panicked or the runtime shut down under it.
    #[error("blocking handoff task failed: {0}")]
    Join(#[from] JoinError),
}

impl AsyncHandoffError {
    /// The channel error, if the blocking call ran to completion.
    pub fn channel_error(&self) -> Option<ChannelError> {
        match self {
            AsyncHandoffError::Channel(err) => Some(*err),
            AsyncHandoffError::Join(_) => None,
        }
    }
}

/// Async front for a shared [`Handoff`] channel.
///
/// Cloning shares the channel. The one-sender one-receiver rule of the
/// channel still applies across all clones.
#[derive(Debug)]
pub struct AsyncHandoff<H> {
    inner: Arc<H>,
}

impl<H> Clone for AsyncHandoff<H> {
    fn clone(&self) -> Self {
        AsyncHandoff {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: Handoff + 'static> AsyncHandoff<H> {
    pub fn new(inner: Arc<H>) -> Self {
        AsyncHandoff { inner }
    }

    pub fn inner(&self) -> &Arc<H> {
        &self.inner
    }

    pub async fn send(&self, value: i32) -> Result<(), AsyncHandoffError> {
        self.send_timeout(value, Timeout::Infinite).await
    }

    pub async fn send_timeout(
        &self,
        value: i32,
        timeout: impl Into<Timeout>,
    ) -> Result<(), AsyncHandoffError> {
        let inner = Arc::clone(&self.inner);
        let timeout = timeout.into();
        tokio::task::spawn_blocking(move || inner.send_timeout(value, timeout)).await??;
        Ok(())
    }

    pub async fn recv(&self) -> Result<i32, AsyncHandoffError> {
        self.recv_timeout(Timeout::Infinite).await
    }

    pub async fn recv_timeout(&self, timeout: impl Into<Timeout>) -> Result<i32, AsyncHandoffError> {
        let inner = Arc::clone(&self.inner);
        let timeout = timeout.into();
        let value = tokio::task::spawn_blocking(move || inner.recv_timeout(timeout)).await??;
        Ok(value)
    }

    /// Never blocks long enough to need the blocking pool.
    pub fn close(&self) {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
