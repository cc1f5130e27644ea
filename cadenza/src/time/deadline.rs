use std::time::{Duration, Instant};

/// Returns the current point in monotonic time.
///
/// Every deadline in the runtime is expressed against this clock.
pub fn now() -> Instant {
    Instant::now()
}

/// An absolute point in time after which a blocking operation gives up.
///
/// Variants are ordered from the earliest to the latest possible deadline,
/// so `Immediate < At(_) < Never`.
///
/// # Examples
///
/// ```rust,ignore
/// use cadenza::Deadline;
/// use std::time::Duration;
///
/// let soon = Deadline::after(Duration::from_millis(10));
/// assert!(soon < Deadline::Never);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Deadline {
    /// Already elapsed: perform a single non-blocking attempt.
    Immediate,

    /// Elapses once the monotonic clock reaches the instant.
    At(Instant),

    /// Never elapses: block until the operation completes or the task is
    /// canceled.
    Never,
}

impl Deadline {
    /// A deadline `duration` from now.
    ///
    /// Saturates to [`Deadline::Never`] if the instant cannot be represented.
    pub fn after(duration: Duration) -> Self {
        match now().checked_add(duration) {
            Some(instant) => Self::At(instant),
            None => Self::Never,
        }
    }

    /// A deadline at `instant`.
    pub fn at(instant: Instant) -> Self {
        Self::At(instant)
    }

    /// The instant this deadline elapses at, if it is a finite point in time.
    pub fn instant(&self) -> Option<Instant> {
        match self {
            Self::At(instant) => Some(*instant),
            Self::Immediate | Self::Never => None,
        }
    }

    /// Returns `true` if the deadline is not after `at`.
    pub fn has_elapsed_at(&self, at: Instant) -> bool {
        match self {
            Self::Immediate => true,
            Self::At(instant) => *instant <= at,
            Self::Never => false,
        }
    }

    /// Returns `true` if the deadline is not after [`now`].
    pub fn has_elapsed(&self) -> bool {
        self.has_elapsed_at(now())
    }

    /// Time left until the deadline, or `None` if it never elapses.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Immediate => Some(Duration::ZERO),
            Self::At(instant) => Some(instant.saturating_duration_since(now())),
            Self::Never => None,
        }
    }
}

impl From<Instant> for Deadline {
    fn from(instant: Instant) -> Self {
        Self::At(instant)
    }
}

impl From<Option<Instant>> for Deadline {
    /// `None` means no deadline at all.
    fn from(instant: Option<Instant>) -> Self {
        instant.map_or(Self::Never, Self::At)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_puts_never_last() {
        let at = Deadline::after(Duration::from_secs(1));

        assert!(Deadline::Immediate < at);
        assert!(at < Deadline::Never);
        assert!(Deadline::at(now()) < Deadline::after(Duration::from_secs(60)));
    }

    #[test]
    fn immediate_and_past_deadlines_have_elapsed() {
        let start = now();

        assert!(Deadline::Immediate.has_elapsed());
        assert!(Deadline::at(start).has_elapsed());
        assert!(!Deadline::Never.has_elapsed());
        assert!(!Deadline::after(Duration::from_secs(60)).has_elapsed());
    }

    #[test]
    fn overflowing_duration_never_elapses() {
        assert_eq!(Deadline::after(Duration::MAX), Deadline::Never);
    }

    #[test]
    fn remaining_time() {
        assert_eq!(Deadline::Immediate.remaining(), Some(Duration::ZERO));
        assert_eq!(Deadline::Never.remaining(), None);

        let remaining = Deadline::after(Duration::from_secs(60))
            .remaining()
            .unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(59));
    }

    #[test]
    fn conversions() {
        let instant = now();

        assert_eq!(Deadline::from(instant), Deadline::At(instant));
        assert_eq!(Deadline::from(None), Deadline::Never);
        assert_eq!(Deadline::at(instant).instant(), Some(instant));
        assert_eq!(Deadline::Never.instant(), None);
    }
}
