//! Count-up animator
//!
//! Animates a number from a start value to a target over a duration, one
//! host frame at a time. `start()` runs at most once per lifecycle until
//! `reset()`; calling it while a run is in flight or after a completed run
//! does nothing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::AnimationConfig;
use crate::host::{Environment, Subscription};
use crate::motion::easing::EasingType;
use crate::motion::timing::{lerp, progress};

#[derive(Debug, Clone, PartialEq)]
pub struct CountUpOptions {
    pub start: f64,
    pub duration_ms: f64,
    pub delay_ms: f64,
    /// Easing name, resolved through the animation config
    pub easing: Option<String>,
}

impl From<&AnimationConfig> for CountUpOptions {
    fn from(config: &AnimationConfig) -> Self {
        Self {
            start: 0.0,
            duration_ms: config.duration_ms,
            delay_ms: config.delay_ms,
            easing: None,
        }
    }
}

impl Default for CountUpOptions {
    fn default() -> Self {
        Self::from(&AnimationConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountUpState {
    pub count: f64,
    pub is_animating: bool,
    pub has_animated: bool,
}

/// One animation run, owned by its animator
#[derive(Debug, Clone)]
struct AnimationRun {
    id: u64,
    start_value: f64,
    end_value: f64,
    duration_ms: f64,
    easing: EasingType,
    /// Set when the frame loop begins (after any delay)
    origin: Option<f64>,
    cancelled: bool,
}

struct CountUpInner {
    state: CountUpState,
    run: Option<AnimationRun>,
    /// Pending delay timer or frame request of the live run
    pending: Option<Subscription>,
    next_run: u64,
    mounted: bool,
}

pub struct CountUp {
    env: Environment,
    target: f64,
    options: CountUpOptions,
    easing: EasingType,
    inner: Rc<RefCell<CountUpInner>>,
}

impl CountUp {
    pub fn new(
        env: &Environment,
        target: f64,
        options: CountUpOptions,
        config: &AnimationConfig,
    ) -> Self {
        let easing = config.resolve_easing(options.easing.as_deref());
        Self {
            env: env.clone(),
            target,
            easing,
            inner: Rc::new(RefCell::new(CountUpInner {
                state: CountUpState {
                    count: options.start,
                    is_animating: false,
                    has_animated: false,
                },
                run: None,
                pending: None,
                next_run: 0,
                mounted: true,
            })),
            options,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn easing(&self) -> EasingType {
        self.easing
    }

    pub fn state(&self) -> CountUpState {
        self.inner.borrow().state
    }

    #[inline]
    pub fn count(&self) -> f64 {
        self.state().count
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.state().is_animating
    }

    #[inline]
    pub fn has_animated(&self) -> bool {
        self.state().has_animated
    }

    /// Begin the animation unless one is running or has already completed
    pub fn start(&self) {
        let run_id = {
            let mut inner = self.inner.borrow_mut();
            if !inner.mounted || inner.state.is_animating || inner.state.has_animated {
                trace!(target_value = self.target, "Count-up start ignored");
                return;
            }
            inner.next_run += 1;
            let id = inner.next_run;
            inner.run = Some(AnimationRun {
                id,
                start_value: self.options.start,
                end_value: self.target,
                duration_ms: self.options.duration_ms,
                easing: self.easing,
                origin: None,
                cancelled: false,
            });
            inner.state.is_animating = true;
            id
        };
        debug!(
            run = run_id,
            target_value = self.target,
            duration_ms = self.options.duration_ms,
            "Count-up started"
        );

        let weak = Rc::downgrade(&self.inner);
        match self.env.timers() {
            Some(timers) if self.options.delay_ms > 0.0 => {
                let env = self.env.clone();
                let timer = timers.set_timeout(
                    self.options.delay_ms,
                    Box::new(move || begin_loop(&weak, &env, run_id)),
                );
                store_pending(&self.inner, run_id, timer);
            }
            _ => begin_loop(&weak, &self.env, run_id),
        }
    }

    /// Cancel any run and return to the start value. Safe to call anytime.
    pub fn reset(&self) {
        let released = {
            let mut inner = self.inner.borrow_mut();
            if !inner.mounted {
                return;
            }
            if let Some(run) = inner.run.as_mut() {
                run.cancelled = true;
            }
            inner.run = None;
            inner.state = CountUpState {
                count: self.options.start,
                is_animating: false,
                has_animated: false,
            };
            inner.pending.take()
        };
        drop(released);
    }

    /// Cancel the frame loop for good; no callback touches state afterwards
    pub fn unmount(&mut self) {
        let released = {
            let mut inner = self.inner.borrow_mut();
            if !inner.mounted {
                return;
            }
            inner.mounted = false;
            if let Some(run) = inner.run.as_mut() {
                run.cancelled = true;
            }
            inner.pending.take()
        };
        if released.is_some() {
            debug!(target_value = self.target, "Count-up unmounted mid-run");
        }
    }
}

impl Drop for CountUp {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Whether `run_id` is the live, uncancelled run of a mounted animator
fn is_live(inner: &CountUpInner, run_id: u64) -> bool {
    inner.mounted && inner.run.as_ref().is_some_and(|run| run.id == run_id && !run.cancelled)
}

fn store_pending(inner: &Rc<RefCell<CountUpInner>>, run_id: u64, subscription: Subscription) {
    let stale = {
        let mut inner = inner.borrow_mut();
        if is_live(&inner, run_id) {
            inner.pending.replace(subscription)
        } else {
            Some(subscription)
        }
    };
    drop(stale);
}

fn begin_loop(weak: &Weak<RefCell<CountUpInner>>, env: &Environment, run_id: u64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    {
        let mut guard = inner.borrow_mut();
        if !is_live(&guard, run_id) {
            return;
        }
        let now = env.now_ms();
        if let Some(run) = guard.run.as_mut() {
            run.origin = Some(now);
        }
    }
    request_frame(&inner, env, run_id);
}

fn request_frame(inner: &Rc<RefCell<CountUpInner>>, env: &Environment, run_id: u64) {
    let Some(frames) = env.frames() else {
        // No frame scheduling: jump straight to the end
        finish(inner, run_id);
        return;
    };
    let weak = Rc::downgrade(inner);
    let frame_env = env.clone();
    let frame = frames.request_frame(Box::new(move |timestamp| {
        on_frame(&weak, &frame_env, run_id, timestamp)
    }));
    store_pending(inner, run_id, frame);
}

fn on_frame(weak: &Weak<RefCell<CountUpInner>>, env: &Environment, run_id: u64, timestamp: f64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let done = {
        let mut guard = inner.borrow_mut();
        if !is_live(&guard, run_id) {
            return;
        }
        let Some(run) = guard.run.clone() else {
            return;
        };
        let origin = run.origin.unwrap_or(timestamp);
        let t = progress(timestamp - origin, run.duration_ms);
        if t >= 1.0 {
            true
        } else {
            let value = lerp(run.start_value, run.end_value, run.easing.apply(t)).floor();
            trace!(run = run_id, progress = t, count = value, "Count-up frame");
            guard.state.count = value;
            false
        }
    };
    if done {
        finish(&inner, run_id);
    } else {
        request_frame(&inner, env, run_id);
    }
}

fn finish(inner: &Rc<RefCell<CountUpInner>>, run_id: u64) {
    let released = {
        let mut guard = inner.borrow_mut();
        if !is_live(&guard, run_id) {
            return;
        }
        let Some(run) = guard.run.take() else {
            return;
        };
        // Pin to the exact end value, not a floored approximation
        guard.state = CountUpState {
            count: run.end_value,
            is_animating: false,
            has_animated: true,
        };
        guard.pending.take()
    };
    drop(released);
    debug!(run = run_id, "Count-up complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::host::{FrameCapability, ManualClock, Simulation, TimerCapability};
    use std::cell::Cell;

    fn sim() -> Simulation {
        Simulation::new(Size::new(100.0, 100.0))
    }

    fn counter(sim: &Simulation, target: f64, duration_ms: f64, delay_ms: f64) -> CountUp {
        CountUp::new(
            &sim.environment(),
            target,
            CountUpOptions {
                start: 0.0,
                duration_ms,
                delay_ms,
                easing: None,
            },
            &AnimationConfig::default(),
        )
    }

    #[test]
    fn test_reaches_target_exactly() {
        let sim = sim();
        let counter = counter(&sim, 100.0, 1000.0, 0.0);
        counter.start();
        assert!(counter.is_animating());
        sim.advance(1000.0);
        assert_eq!(counter.count(), 100.0);
        assert!(counter.has_animated());
        assert!(!counter.is_animating());

        // A second start after completion is ignored
        counter.start();
        sim.advance(500.0);
        assert_eq!(counter.count(), 100.0);
        assert!(!counter.is_animating());
    }

    #[test]
    fn test_double_start_runs_once() {
        let sim = sim();
        let counter = counter(&sim, 100.0, 1000.0, 0.0);
        counter.start();
        sim.advance(100.0);
        let mid = counter.count();
        counter.start();
        assert_eq!(sim.page().pending_frames(), 1);
        sim.advance(10.0);
        assert!(counter.count() >= mid);
        sim.advance(1000.0);
        assert_eq!(counter.count(), 100.0);
        assert_eq!(sim.page().pending_frames(), 0);
    }

    #[test]
    fn test_intermediate_values_are_floored_and_increasing() {
        let sim = sim();
        let config = AnimationConfig::default();
        let counter = CountUp::new(
            &sim.environment(),
            1234.0,
            CountUpOptions {
                easing: Some("linear".into()),
                ..CountUpOptions::from(&config)
            },
            &config,
        );
        counter.start();
        let mut last = 0.0;
        for _ in 0..50 {
            sim.advance(16.0);
            let count = counter.count();
            assert_eq!(count, count.floor());
            assert!(count >= last);
            last = count;
        }
        // Linear at 800ms of 2000ms
        assert_eq!(counter.count(), (1234.0_f64 * 0.4).floor());
    }

    #[test]
    fn test_delay_holds_count() {
        let sim = sim();
        let counter = counter(&sim, 50.0, 100.0, 200.0);
        counter.start();
        assert!(counter.is_animating());
        sim.advance(190.0);
        assert_eq!(counter.count(), 0.0);
        assert!(counter.is_animating());
        sim.advance(400.0);
        assert_eq!(counter.count(), 50.0);
        assert!(counter.has_animated());
    }

    #[test]
    fn test_reset_restores_initial_state_and_allows_one_more_run() {
        let sim = sim();
        let counter = counter(&sim, 10.0, 100.0, 0.0);
        counter.start();
        sim.advance(200.0);
        assert!(counter.has_animated());

        counter.reset();
        assert_eq!(
            counter.state(),
            CountUpState {
                count: 0.0,
                is_animating: false,
                has_animated: false,
            }
        );

        counter.start();
        sim.advance(200.0);
        assert_eq!(counter.count(), 10.0);
        assert!(counter.has_animated());
    }

    #[test]
    fn test_reset_mid_run_cancels_frames() {
        let sim = sim();
        let counter = counter(&sim, 100.0, 1000.0, 0.0);
        counter.start();
        sim.advance(300.0);
        counter.reset();
        counter.reset();
        assert_eq!(sim.page().pending_frames(), 0);
        sim.advance(1000.0);
        assert_eq!(counter.count(), 0.0);
        assert!(!counter.has_animated());
    }

    #[test]
    fn test_reset_during_delay_cancels_timer() {
        let sim = sim();
        let counter = counter(&sim, 100.0, 100.0, 500.0);
        counter.start();
        counter.reset();
        assert_eq!(sim.page().pending_timers(), 0);
        sim.advance(1000.0);
        assert_eq!(counter.count(), 0.0);
    }

    #[test]
    fn test_unmount_stops_callbacks() {
        let sim = sim();
        let mut counter = counter(&sim, 100.0, 1000.0, 0.0);
        counter.start();
        sim.advance(200.0);
        let frozen = counter.state();
        counter.unmount();
        assert_eq!(sim.page().pending_frames(), 0);
        sim.advance(2000.0);
        assert_eq!(counter.state(), frozen);
        counter.start();
        assert_eq!(sim.page().pending_frames(), 0);
    }

    #[test]
    fn test_counts_down_when_target_below_start() {
        let sim = sim();
        let counter = CountUp::new(
            &sim.environment(),
            0.0,
            CountUpOptions {
                start: 10.0,
                duration_ms: 100.0,
                delay_ms: 0.0,
                easing: None,
            },
            &AnimationConfig::default(),
        );
        counter.start();
        sim.advance(50.0);
        assert!(counter.count() < 10.0);
        sim.advance(100.0);
        assert_eq!(counter.count(), 0.0);
    }

    #[test]
    fn test_unknown_easing_falls_back() {
        let sim = sim();
        let counter = CountUp::new(
            &sim.environment(),
            1.0,
            CountUpOptions {
                easing: Some("springy".into()),
                ..CountUpOptions::default()
            },
            &AnimationConfig::default(),
        );
        assert_eq!(counter.easing(), EasingType::EaseOutExpo);
    }

    #[test]
    fn test_without_frames_completes_immediately() {
        let env = Environment::builder(Rc::new(ManualClock::new())).build();
        let config = AnimationConfig::default();
        let counter = CountUp::new(&env, 42.0, CountUpOptions::from(&config), &config);
        counter.start();
        assert_eq!(counter.count(), 42.0);
        assert!(counter.has_animated());
        assert!(!counter.is_animating());
    }

    /// Frame and timer host that still runs callbacks whose handles were released
    #[derive(Default)]
    struct ScriptedFrames {
        frames: RefCell<Vec<Box<dyn FnOnce(f64)>>>,
        timers: RefCell<Vec<Box<dyn FnOnce()>>>,
        released: Rc<Cell<usize>>,
    }

    impl ScriptedFrames {
        fn fire_frames(&self, timestamp: f64) {
            let frames = std::mem::take(&mut *self.frames.borrow_mut());
            for frame in frames {
                frame(timestamp);
            }
        }

        fn fire_timers(&self) {
            let timers = std::mem::take(&mut *self.timers.borrow_mut());
            for timer in timers {
                timer();
            }
        }

        fn subscription(&self) -> Subscription {
            let released = Rc::clone(&self.released);
            Subscription::new(move || released.set(released.get() + 1))
        }
    }

    impl FrameCapability for ScriptedFrames {
        fn request_frame(&self, callback: Box<dyn FnOnce(f64)>) -> Subscription {
            self.frames.borrow_mut().push(callback);
            self.subscription()
        }
    }

    impl TimerCapability for ScriptedFrames {
        fn set_timeout(&self, _delay_ms: f64, callback: Box<dyn FnOnce()>) -> Subscription {
            self.timers.borrow_mut().push(callback);
            self.subscription()
        }
    }

    fn scripted() -> (Environment, Rc<ScriptedFrames>) {
        let scripted = Rc::new(ScriptedFrames::default());
        let env = Environment::builder(Rc::new(ManualClock::new()))
            .frames(Rc::clone(&scripted) as Rc<dyn FrameCapability>)
            .timers(Rc::clone(&scripted) as Rc<dyn TimerCapability>)
            .build();
        (env, scripted)
    }

    #[test]
    fn test_late_frame_ignored_after_unmount() {
        let (env, scripted) = scripted();
        let mut counter = CountUp::new(
            &env,
            100.0,
            CountUpOptions {
                start: 0.0,
                duration_ms: 1000.0,
                delay_ms: 0.0,
                easing: Some("linear".into()),
            },
            &AnimationConfig::default(),
        );
        counter.start();
        scripted.fire_frames(100.0);
        assert_eq!(counter.count(), 10.0);

        let frozen = counter.state();
        let released = scripted.released.get();
        counter.unmount();
        assert_eq!(scripted.released.get(), released + 1);

        // The host runs the released frame anyway
        scripted.fire_frames(2000.0);
        assert_eq!(counter.state(), frozen);
        assert!(scripted.frames.borrow().is_empty());
    }

    #[test]
    fn test_late_delay_timer_ignored_after_unmount() {
        let (env, scripted) = scripted();
        let mut counter = CountUp::new(
            &env,
            100.0,
            CountUpOptions {
                delay_ms: 300.0,
                ..CountUpOptions::default()
            },
            &AnimationConfig::default(),
        );
        counter.start();
        let frozen = counter.state();
        counter.unmount();
        assert_eq!(scripted.released.get(), 1);

        scripted.fire_timers();
        assert!(scripted.frames.borrow().is_empty());
        assert_eq!(counter.state(), frozen);
    }
}
