use std::time::{Duration, Instant};

/// Holds back a rapidly changing value until it has been stable for `delay`.
///
/// The debouncer never sleeps on its own: callers feed it values with
/// [`Debouncer::push`] and ask for the settled value with
/// [`Debouncer::poll`] from their tick, using [`Debouncer::deadline`] to know
/// how long they may wait. Dropping it (or calling [`Debouncer::cancel`])
/// discards whatever was pending, so nothing is emitted after teardown.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a new input value, replacing any stale pending one and
    /// restarting the timer.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    /// Returns the pending value once its quiet period has fully elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .map(|pending| now >= pending.deadline)
            .unwrap_or(false);
        if !ready {
            return None;
        }
        self.pending.take().map(|pending| pending.value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn emits_only_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push("a", start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert_eq!(debouncer.poll(start + DELAY), Some("a"));
        assert_eq!(debouncer.poll(start + DELAY * 2), None);
    }

    #[test]
    fn burst_of_inputs_yields_last_value_once() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        for (offset, value) in [(0, "n"), (100, "no"), (200, "not"), (350, "note")] {
            let now = start + Duration::from_millis(offset);
            assert_eq!(debouncer.poll(now), None);
            debouncer.push(value, now);
        }
        // 300ms after "not" would have fired, but "note" restarted the timer.
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(650))
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(650)), Some("note"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn cancel_discards_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.push(1, start);
        assert_eq!(debouncer.cancel(), Some(1));
        assert_eq!(debouncer.poll(start + DELAY), None);
        assert_eq!(debouncer.deadline(), None);
    }
}
