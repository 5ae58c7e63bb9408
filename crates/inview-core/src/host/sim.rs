//! Deterministic simulation: a page host driven by a manual clock

use std::rc::Rc;

use super::{Clock, ElementHandle, Environment, ManualClock, PageHost};
use crate::config::AnimationConfig;
use crate::geometry::{Rect, Size};

/// A [`PageHost`] whose time only moves through [`Simulation::advance`]
#[derive(Clone)]
pub struct Simulation {
    page: PageHost,
    clock: ManualClock,
    frame_interval_ms: f64,
}

impl Simulation {
    pub fn new(viewport: Size) -> Self {
        Self::with_frame_interval(viewport, AnimationConfig::default().frame_interval_ms)
    }

    pub fn with_frame_interval(viewport: Size, frame_interval_ms: f64) -> Self {
        let clock = ManualClock::new();
        Self {
            page: PageHost::new(Rc::new(clock.clone()), viewport),
            clock,
            frame_interval_ms: frame_interval_ms.max(1.0),
        }
    }

    pub fn page(&self) -> &PageHost {
        &self.page
    }

    pub fn environment(&self) -> Environment {
        self.page.environment()
    }

    pub fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    pub fn add_element(&self, rect: Rect) -> ElementHandle {
        self.page.add_element(rect)
    }

    /// One host turn without moving the clock
    pub fn pump(&self) {
        self.page.pump();
    }

    /// Move time forward by `ms`, one frame interval at a time, with a host
    /// turn after every step. The last step lands exactly on the target.
    pub fn advance(&self, ms: f64) {
        let target = self.clock.now_ms() + ms.max(0.0);
        loop {
            let now = self.clock.now_ms();
            if now >= target {
                break;
            }
            self.clock.set((now + self.frame_interval_ms).min(target));
            self.page.pump();
        }
    }

    /// Scroll and let one frame pass so listeners observe the new offset
    pub fn scroll_to(&self, offset: f64) -> f64 {
        let clamped = self.page.scroll_to(offset);
        self.advance(self.frame_interval_ms);
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_lands_on_target() {
        let sim = Simulation::new(Size::new(100.0, 100.0));
        sim.advance(1000.0);
        assert_eq!(sim.now(), 1000.0);
        sim.advance(5.0);
        assert_eq!(sim.now(), 1005.0);
    }

    #[test]
    fn test_scroll_to_moves_one_frame() {
        let sim = Simulation::new(Size::new(100.0, 100.0));
        sim.add_element(Rect::new(0.0, 0.0, 100.0, 1000.0));
        assert_eq!(sim.scroll_to(250.0), 250.0);
        assert_eq!(sim.now(), 16.0);
    }
}
