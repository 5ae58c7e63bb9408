//! Pure easing functions for count-up animations
//!
//! Provides mathematical easing functions that map input [0, 1] to output [0, 1]
//! with various acceleration curves, and resolution of easing names through the
//! configured easing table.

use tracing::debug;

// The enum lives with the configuration so it can be deserialized there
pub use crate::config::EasingType;
use crate::config::AnimationConfig;

impl EasingType {
    pub const ALL: [EasingType; 6] = [
        EasingType::Linear,
        EasingType::EaseOutQuad,
        EasingType::EaseOutCubic,
        EasingType::EaseOutQuint,
        EasingType::EaseOutExpo,
        EasingType::EaseInOutCubic,
    ];

    /// Apply the easing function to a progress value
    ///
    /// # Arguments
    /// * `t` - Progress value in range [0, 1]
    ///
    /// # Returns
    /// Eased value in range [0, 1]
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::Linear => t,
            EasingType::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingType::EaseOutCubic => cubic_ease_out(t),
            EasingType::EaseOutQuint => quintic_ease_out(t),
            EasingType::EaseOutExpo => exponential_ease_out(t),
            EasingType::EaseInOutCubic => cubic_ease_in_out(t),
        }
    }

    /// Canonical kebab-case name
    pub fn name(&self) -> &'static str {
        match self {
            EasingType::Linear => "linear",
            EasingType::EaseOutQuad => "ease-out-quad",
            EasingType::EaseOutCubic => "ease-out-cubic",
            EasingType::EaseOutQuint => "ease-out-quint",
            EasingType::EaseOutExpo => "ease-out-expo",
            EasingType::EaseInOutCubic => "ease-in-out-cubic",
        }
    }

    /// Look up a built-in curve. Case and `-`/`_` separators are ignored, so
    /// `easeOutExpo`, `ease-out-expo` and `EASE_OUT_EXPO` all match.
    pub fn from_name(name: &str) -> Option<EasingType> {
        let wanted = normalize(name);
        Self::ALL
            .into_iter()
            .find(|easing| normalize(easing.name()) == wanted)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl AnimationConfig {
    /// Resolve an easing name: aliases first, then built-in names, then the
    /// configured default. Never fails.
    pub fn resolve_easing(&self, name: Option<&str>) -> EasingType {
        let Some(name) = name else {
            return self.easing;
        };
        let wanted = normalize(name);
        if let Some(easing) = self
            .aliases
            .iter()
            .find(|(alias, _)| normalize(alias) == wanted)
            .map(|(_, easing)| *easing)
        {
            return easing;
        }
        EasingType::from_name(name).unwrap_or_else(|| {
            debug!(easing = name, fallback = self.easing.name(), "Unknown easing, using default");
            self.easing
        })
    }
}

/// Cubic ease-out: f(t) = 1 - (1-t)³
#[inline]
fn cubic_ease_out(t: f64) -> f64 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Quintic ease-out: f(t) = 1 - (1-t)⁵
#[inline]
fn quintic_ease_out(t: f64) -> f64 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv * inv * inv
}

/// Exponential ease-out: f(t) = 1 - 2^(-10t)
#[inline]
fn exponential_ease_out(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f64.powf(-10.0 * t)
    }
}

#[inline]
fn cubic_ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let inv = -2.0 * t + 2.0;
        1.0 - inv * inv * inv / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_boundaries() {
        for easing in EasingType::ALL {
            assert!((easing.apply(0.0) - 0.0).abs() < 0.001, "{:?} at t=0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{:?} at t=1", easing);
        }
    }

    #[test]
    fn test_easing_monotonic() {
        for easing in EasingType::ALL {
            let mut prev = 0.0;
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                let v = easing.apply(t);
                assert!(v >= prev, "{:?} not monotonic at t={}", easing, t);
                prev = v;
            }
        }
    }

    #[test]
    fn test_names_are_forgiving() {
        assert_eq!(EasingType::from_name("easeOutExpo"), Some(EasingType::EaseOutExpo));
        assert_eq!(EasingType::from_name("ease_in_out_cubic"), Some(EasingType::EaseInOutCubic));
        assert_eq!(EasingType::from_name("LINEAR"), Some(EasingType::Linear));
        assert_eq!(EasingType::from_name("bounce"), None);
    }

    #[test]
    fn test_unknown_name_falls_back_to_default() {
        let config = AnimationConfig {
            easing: EasingType::EaseOutCubic,
            ..Default::default()
        };
        assert_eq!(config.resolve_easing(Some("wobble")), EasingType::EaseOutCubic);
        assert_eq!(config.resolve_easing(None), EasingType::EaseOutCubic);
        assert_eq!(config.resolve_easing(Some("linear")), EasingType::Linear);
    }

    #[test]
    fn test_alias_wins_over_builtin() {
        let mut config = AnimationConfig::default();
        config.aliases.insert("stat".into(), EasingType::EaseOutQuint);
        config.aliases.insert("linear".into(), EasingType::EaseOutQuad);
        assert_eq!(config.resolve_easing(Some("Stat")), EasingType::EaseOutQuint);
        assert_eq!(config.resolve_easing(Some("linear")), EasingType::EaseOutQuad);
    }
}
