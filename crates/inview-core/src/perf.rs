//! Section timing marks
//!
//! [`SectionMark`] wraps a section's content and marks `<name>-start` the
//! moment it is constructed. Pairing it with an end mark is up to whoever
//! collects the timings; [`SectionMark::finish`] is a convenience for that.

use std::ops::Deref;

use tracing::trace;

use crate::config::PerformanceConfig;
use crate::host::Environment;

pub struct SectionMark<T> {
    name: String,
    enabled: bool,
    env: Environment,
    children: T,
}

impl<T> SectionMark<T> {
    pub fn begin(
        env: &Environment,
        config: &PerformanceConfig,
        name: impl Into<String>,
        children: T,
    ) -> Self {
        let name = name.into();
        let enabled = config.enabled;
        if enabled {
            if let Some(performance) = env.performance() {
                performance.mark(&start_mark(&name));
                trace!(section = %name, "Section start marked");
            }
        }
        Self {
            name,
            enabled,
            env: env.clone(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &T {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut T {
        &mut self.children
    }

    pub fn into_inner(self) -> T {
        self.children
    }

    /// Mark `<name>-end` and measure from the start mark
    pub fn finish(&self) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        let performance = self.env.performance()?;
        performance.mark(&end_mark(&self.name));
        let duration =
            performance.measure(&self.name, &start_mark(&self.name), &end_mark(&self.name));
        trace!(section = %self.name, duration_ms = ?duration, "Section measured");
        duration
    }
}

impl<T> Deref for SectionMark<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.children
    }
}

pub fn start_mark(name: &str) -> String {
    format!("{}-start", name)
}

pub fn end_mark(name: &str) -> String {
    format!("{}-end", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::host::Simulation;

    #[test]
    fn test_start_marked_on_construction() {
        let sim = Simulation::new(Size::new(100.0, 100.0));
        sim.advance(5.0);
        let config = PerformanceConfig::default();
        let section = SectionMark::begin(&sim.environment(), &config, "hero", vec![1, 2, 3]);
        let marks = sim.page().marks();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].name, "hero-start");
        assert_eq!(marks[0].time, 5.0);
        assert_eq!(*section, vec![1, 2, 3]);
    }

    #[test]
    fn test_sections_are_independent() {
        let sim = Simulation::new(Size::new(100.0, 100.0));
        let env = sim.environment();
        let config = PerformanceConfig::default();
        let hero = SectionMark::begin(&env, &config, "hero", ());
        sim.advance(10.0);
        let pricing = SectionMark::begin(&env, &config, "pricing", ());
        sim.advance(30.0);
        assert_eq!(pricing.finish(), Some(30.0));
        assert_eq!(hero.finish(), Some(40.0));
        let names: Vec<String> = sim.page().measures().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["pricing", "hero"]);
    }

    #[test]
    fn test_skipped_without_capability_or_when_disabled() {
        let config = PerformanceConfig::default();
        let section = SectionMark::begin(&Environment::headless(), &config, "faq", "body");
        assert_eq!(section.finish(), None);
        assert_eq!(section.into_inner(), "body");

        let sim = Simulation::new(Size::new(100.0, 100.0));
        let disabled = PerformanceConfig { enabled: false };
        let section = SectionMark::begin(&sim.environment(), &disabled, "faq", ());
        assert_eq!(section.finish(), None);
        assert!(sim.page().marks().is_empty());
    }
}
