//! Deadlines for blocking operations.

use std::time::{Duration, Instant};

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timeout {
    /// Wait indefinitely.
    #[default]
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl Timeout {
    /// The instant at which a wait started now should give up.
    ///
    /// Durations too large to represent are treated as [`Timeout::Infinite`].
    pub fn deadline(self) -> Option<Instant> {
        match self {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Instant::now().checked_add(d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_has_no_deadline() {
        assert_eq!(Timeout::Infinite.deadline(), None);
        assert_eq!(Timeout::default(), Timeout::Infinite);
    }

    #[test]
    fn huge_duration_saturates_to_infinite() {
        assert_eq!(Timeout::from(Duration::MAX).deadline(), None);
    }

    #[test]
    fn duration_deadline_is_in_the_future() {
        let before = Instant::now();
        let deadline = Timeout::from(Duration::from_secs(5)).deadline().unwrap();
        assert!(deadline >= before + Duration::from_secs(5));
    }
}
