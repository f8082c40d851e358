//! Wall clock and cooperative yield hook
//!
//! Refresh stages run for hundreds of milliseconds. The sequencer measures
//! them against [`Scheduler::now_ms`] and hands control back through
//! [`Scheduler::yield_now`] once per outer stage iteration, never in the
//! middle of a line.

/// Clock and yield hook used by the refresh loops
pub trait Scheduler {
    /// Monotonic milliseconds; wrapping is fine
    fn now_ms(&mut self) -> u32;

    /// Called between stage iterations
    ///
    /// The default does nothing.
    fn yield_now(&mut self) {}

    /// Milliseconds since `start`, tolerant of wrap-around
    fn elapsed_ms(&mut self, start: u32) -> u32 {
        self.now_ms().wrapping_sub(start)
    }
}

impl<S: Scheduler + ?Sized> Scheduler for &mut S {
    fn now_ms(&mut self) -> u32 {
        (**self).now_ms()
    }

    fn yield_now(&mut self) {
        (**self).yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wrapping(u32);

    impl Scheduler for Wrapping {
        fn now_ms(&mut self) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let mut clock = Wrapping(5);
        assert_eq!(clock.elapsed_ms(u32::MAX - 4), 10);
    }

    #[test]
    fn test_forwarding_through_reference() {
        fn sample<S: Scheduler>(mut scheduler: S) -> u32 {
            scheduler.yield_now();
            scheduler.now_ms()
        }

        let mut clock = Wrapping(42);
        assert_eq!(sample(&mut clock), 42);
        assert_eq!(clock.now_ms(), 42);
    }
}
