//! Fixed-interval rate limiter
//!
//! Leading-edge only: the first call in a window runs, the rest are dropped.
//! Nothing is queued for the end of the window.

use std::rc::Rc;

use crate::host::Clock;

pub struct Throttle {
    clock: Rc<dyn Clock>,
    interval_ms: f64,
    last_admitted: Option<f64>,
}

impl Throttle {
    pub fn new(clock: Rc<dyn Clock>, interval_ms: f64) -> Self {
        Self {
            clock,
            interval_ms: interval_ms.max(0.0),
            last_admitted: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Whether an invocation at the current time may run. Admitting starts
    /// a new window.
    pub fn admit(&mut self) -> bool {
        let now = self.clock.now_ms();
        match self.last_admitted {
            Some(last) if now - last < self.interval_ms => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }

    /// Wrap `f` so it runs at most once per interval
    pub fn wrap(mut self, mut f: impl FnMut() + 'static) -> impl FnMut() + 'static {
        move || {
            if self.admit() {
                f();
            }
        }
    }
}
