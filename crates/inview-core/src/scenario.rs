//! Scripted scenarios replayed on a simulated page
//!
//! A scenario describes a viewport, named elements, named runtime units and a
//! list of steps. Replaying it yields one [`TraceRecord`] per step with a
//! snapshot of every unit, which makes runtime behaviour inspectable without
//! a renderer.
//!
//! ```toml
//! [viewport]
//! width = 1280
//! height = 800
//!
//! [elements]
//! page = { x = 0, y = 0, width = 1280, height = 4000 }
//! stats = { x = 0, y = 1400, width = 1280, height = 300 }
//!
//! [units.stats-seen]
//! kind = "visibility"
//! element = "stats"
//!
//! [units.readers]
//! kind = "count-up"
//! target = 12000
//! duration_ms = 1000
//! start_when_visible = "stats-seen"
//!
//! [[steps]]
//! action = "scroll"
//! offset = 1000
//!
//! [[steps]]
//! action = "advance"
//! ms = 1000
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::activation::{Activation, ActivationOptions, ActivationRecord};
use crate::config::AppConfig;
use crate::count_up::{CountUp, CountUpOptions, CountUpState};
use crate::geometry::{Rect, RootMargin, Size, Thresholds};
use crate::host::{ElementHandle, Simulation};
use crate::perf::SectionMark;
use crate::scroll::{ScrollState, ScrollTracker, ScrollTrackerOptions};
use crate::visibility::{VisibilityObserver, VisibilityOptions, VisibilityState};
use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub viewport: Size,
    #[serde(default)]
    pub elements: BTreeMap<String, Rect>,
    #[serde(default)]
    pub units: BTreeMap<String, UnitSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UnitSpec {
    Visibility {
        element: String,
        threshold: Option<Thresholds>,
        root_margin: Option<RootMargin>,
        trigger_once: Option<bool>,
    },
    Scroll {
        threshold: Option<f64>,
        element: Option<String>,
    },
    CountUp {
        target: f64,
        start: Option<f64>,
        duration_ms: Option<f64>,
        delay_ms: Option<f64>,
        easing: Option<String>,
        /// Name of a visibility unit that triggers `start`
        start_when_visible: Option<String>,
    },
    Activation {
        element: String,
        root_margin: Option<RootMargin>,
        threshold: Option<Thresholds>,
    },
    Section {},
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Scroll { offset: f64 },
    Advance { ms: f64 },
    Start { unit: String },
    Reset { unit: String },
    Unmount { unit: String },
    Resize { width: f64, height: f64 },
    Move { element: String, y: f64 },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Scroll { offset } => write!(f, "scroll {}", offset),
            Step::Advance { ms } => write!(f, "advance {}ms", ms),
            Step::Start { unit } => write!(f, "start {}", unit),
            Step::Reset { unit } => write!(f, "reset {}", unit),
            Step::Unmount { unit } => write!(f, "unmount {}", unit),
            Step::Resize { width, height } => write!(f, "resize {}x{}", width, height),
            Step::Move { element, y } => write!(f, "move {} to y={}", element, y),
        }
    }
}

/// State of one unit after a step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UnitSnapshot {
    Visibility(VisibilityState),
    Scroll(ScrollState),
    CountUp(CountUpState),
    Activation(ActivationRecord),
    Section { name: String, duration_ms: Option<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    pub step: usize,
    pub time_ms: f64,
    pub action: String,
    pub units: BTreeMap<String, UnitSnapshot>,
}

impl TraceRecord {
    /// One line of the JSON-lines trace
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

enum Unit {
    Visibility(VisibilityObserver),
    Scroll(ScrollTracker),
    CountUp {
        counter: CountUp,
        gate: Option<String>,
    },
    Activation(Activation<(), ()>),
    Section {
        mark: SectionMark<()>,
        duration_ms: Option<f64>,
    },
}

impl Unit {
    fn snapshot(&self) -> UnitSnapshot {
        match self {
            Unit::Visibility(observer) => UnitSnapshot::Visibility(observer.state()),
            Unit::Scroll(tracker) => UnitSnapshot::Scroll(tracker.state()),
            Unit::CountUp { counter, .. } => UnitSnapshot::CountUp(counter.state()),
            Unit::Activation(activation) => UnitSnapshot::Activation(activation.record()),
            Unit::Section { mark, duration_ms } => UnitSnapshot::Section {
                name: mark.name().to_string(),
                duration_ms: *duration_ms,
            },
        }
    }

    fn unmount(&mut self) {
        match self {
            Unit::Visibility(observer) => observer.unmount(),
            Unit::Scroll(tracker) => tracker.unmount(),
            Unit::CountUp { counter, .. } => counter.unmount(),
            Unit::Activation(activation) => activation.unmount(),
            Unit::Section { mark, duration_ms } => {
                if duration_ms.is_none() {
                    *duration_ms = mark.finish();
                }
            }
        }
    }
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(content).map_err(|e| Error::Scenario(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check every element and unit reference before anything runs
    pub fn validate(&self) -> Result<()> {
        let element = |name: &str| -> Result<()> {
            if self.elements.contains_key(name) {
                Ok(())
            } else {
                Err(Error::UnknownElement(name.to_string()))
            }
        };

        for spec in self.units.values() {
            match spec {
                UnitSpec::Visibility { element: name, .. }
                | UnitSpec::Activation { element: name, .. } => element(name)?,
                UnitSpec::Scroll { element: Some(name), .. } => element(name)?,
                UnitSpec::CountUp {
                    start_when_visible: Some(gate),
                    ..
                } => match self.units.get(gate) {
                    Some(UnitSpec::Visibility { .. }) => {}
                    Some(_) => {
                        return Err(Error::Scenario(format!(
                            "count-up gate '{}' is not a visibility unit",
                            gate
                        )))
                    }
                    None => return Err(Error::UnknownUnit(gate.clone())),
                },
                _ => {}
            }
        }

        for step in &self.steps {
            match step {
                Step::Start { unit } | Step::Reset { unit } => match self.units.get(unit) {
                    Some(UnitSpec::CountUp { .. }) => {}
                    Some(_) => {
                        return Err(Error::Scenario(format!(
                            "'{}' is not a count-up unit: {}",
                            unit, step
                        )))
                    }
                    None => return Err(Error::UnknownUnit(unit.clone())),
                },
                Step::Unmount { unit } if !self.units.contains_key(unit) => {
                    return Err(Error::UnknownUnit(unit.clone()))
                }
                Step::Move { element: name, .. } => element(name)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Run every step on a fresh simulated page
    pub fn replay(&self, config: &AppConfig) -> Result<Vec<TraceRecord>> {
        self.validate()?;
        let sim =
            Simulation::with_frame_interval(self.viewport, config.animation.frame_interval_ms);
        let env = sim.environment();

        let handles: BTreeMap<&str, ElementHandle> = self
            .elements
            .iter()
            .map(|(name, rect)| (name.as_str(), sim.add_element(*rect)))
            .collect();
        let handle = |name: &str| {
            handles
                .get(name)
                .copied()
                .ok_or_else(|| Error::UnknownElement(name.to_string()))
        };

        let mut units: BTreeMap<String, Unit> = BTreeMap::new();
        for (name, spec) in &self.units {
            let unit = match spec {
                UnitSpec::Visibility {
                    element,
                    threshold,
                    root_margin,
                    trigger_once,
                } => {
                    let defaults = VisibilityOptions::from(&config.visibility);
                    let mut observer = VisibilityObserver::new(
                        &env,
                        VisibilityOptions {
                            threshold: threshold.clone().unwrap_or(defaults.threshold),
                            root_margin: root_margin.unwrap_or(defaults.root_margin),
                            trigger_once: trigger_once.unwrap_or(defaults.trigger_once),
                        },
                    );
                    observer.attach(Some(handle(element)?));
                    Unit::Visibility(observer)
                }
                UnitSpec::Scroll { threshold, element } => {
                    let element = element.as_deref().map(&handle).transpose()?;
                    Unit::Scroll(ScrollTracker::mount(
                        &env,
                        ScrollTrackerOptions {
                            threshold: threshold.unwrap_or(config.scroll.threshold),
                            element,
                        },
                        &config.scroll,
                    ))
                }
                UnitSpec::CountUp {
                    target,
                    start,
                    duration_ms,
                    delay_ms,
                    easing,
                    start_when_visible,
                } => {
                    let defaults = CountUpOptions::from(&config.animation);
                    let options = CountUpOptions {
                        start: start.unwrap_or(defaults.start),
                        duration_ms: duration_ms.unwrap_or(defaults.duration_ms),
                        delay_ms: delay_ms.unwrap_or(defaults.delay_ms),
                        easing: easing.clone(),
                    };
                    Unit::CountUp {
                        counter: CountUp::new(&env, *target, options, &config.animation),
                        gate: start_when_visible.clone(),
                    }
                }
                UnitSpec::Activation {
                    element,
                    root_margin,
                    threshold,
                } => {
                    let defaults = ActivationOptions::from(&config.activation);
                    let mut activation = Activation::new(
                        &env,
                        ActivationOptions {
                            root_margin: root_margin.unwrap_or(defaults.root_margin),
                            threshold: threshold.clone().unwrap_or(defaults.threshold),
                        },
                        (),
                        || (),
                    );
                    activation.attach(Some(handle(element)?));
                    Unit::Activation(activation)
                }
                UnitSpec::Section {} => Unit::Section {
                    mark: SectionMark::begin(&env, &config.performance, name.clone(), ()),
                    duration_ms: None,
                },
            };
            units.insert(name.clone(), unit);
        }
        debug!(units = units.len(), elements = handles.len(), "Scenario mounted");

        // First host turn delivers initial visibility
        sim.pump();
        settle(&mut units);
        let mut trace = vec![record(0, &sim, "mount".to_string(), &units)];

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Scroll { offset } => {
                    sim.scroll_to(*offset);
                }
                Step::Advance { ms } => sim.advance(*ms),
                Step::Start { unit } => {
                    if let Some(Unit::CountUp { counter, .. }) = units.get(unit) {
                        counter.start();
                    }
                }
                Step::Reset { unit } => {
                    if let Some(Unit::CountUp { counter, .. }) = units.get(unit) {
                        counter.reset();
                    }
                }
                Step::Unmount { unit } => {
                    if let Some(unit) = units.get_mut(unit) {
                        unit.unmount();
                    }
                }
                Step::Resize { width, height } => {
                    sim.page().set_viewport(Size::new(*width, *height));
                    sim.advance(sim.frame_interval_ms());
                }
                Step::Move { element, y } => {
                    let element = handle(element)?;
                    if let Some(rect) = sim.page().document_rect(element) {
                        sim.page().set_element_rect(element, Rect { y: *y, ..rect });
                    }
                    sim.advance(sim.frame_interval_ms());
                }
            }
            settle(&mut units);
            trace.push(record(index + 1, &sim, step.to_string(), &units));
        }

        for unit in units.values_mut() {
            unit.unmount();
        }
        info!(steps = self.steps.len(), end_ms = sim.now(), "Scenario replayed");
        Ok(trace)
    }
}

/// Start gated count-ups whose observer is visible and poll activations
fn settle(units: &mut BTreeMap<String, Unit>) {
    let visible: Vec<String> = units
        .iter()
        .filter_map(|(name, unit)| match unit {
            Unit::Visibility(observer) if observer.is_visible() => Some(name.clone()),
            _ => None,
        })
        .collect();

    for unit in units.values_mut() {
        match unit {
            Unit::CountUp {
                counter,
                gate: Some(gate),
            } if visible.contains(gate) => counter.start(),
            Unit::Activation(activation) => {
                activation.poll();
            }
            _ => {}
        }
    }
}

fn record(
    step: usize,
    sim: &Simulation,
    action: String,
    units: &BTreeMap<String, Unit>,
) -> TraceRecord {
    TraceRecord {
        step,
        time_ms: sim.now(),
        action,
        units: units
            .iter()
            .map(|(name, unit)| (name.clone(), unit.snapshot()))
            .collect(),
    }
}
