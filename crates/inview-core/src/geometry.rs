//! Rectangles, root margins and threshold lists
//!
//! All lengths are host pixels; the terminal host gives every row a fixed
//! pixel height. Rectangles use a top-left origin with `y` growing down.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Same rectangle moved by `(dx, dy)`
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow each side outward by the given insets (negative insets shrink)
    pub fn expand(&self, insets: Insets) -> Self {
        Self::new(
            self.x - insets.left,
            self.y - insets.top,
            (self.width + insets.left + insets.right).max(0.0),
            (self.height + insets.top + insets.bottom).max(0.0),
        )
    }

    /// Overlap of two rectangles. Touching edges yield a zero-area rectangle
    /// rather than `None`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left <= right && top <= bottom {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }
}

/// Width and height of a viewport
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Resolved per-side lengths
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// One side of a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginLength {
    Px(f64),
    Percent(f64),
}

impl MarginLength {
    /// Resolve against the matching viewport dimension
    pub fn resolve(&self, basis: f64) -> f64 {
        match *self {
            MarginLength::Px(px) => px,
            MarginLength::Percent(pct) => basis * pct / 100.0,
        }
    }
}

impl FromStr for MarginLength {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidRootMargin(s.to_string());
        if let Some(num) = s.strip_suffix("px") {
            num.trim().parse().map(MarginLength::Px).map_err(|_| invalid())
        } else if let Some(num) = s.strip_suffix('%') {
            num.trim().parse().map(MarginLength::Percent).map_err(|_| invalid())
        } else {
            // Only a bare zero may omit its unit
            match s.parse::<f64>() {
                Ok(v) if v == 0.0 => Ok(MarginLength::Px(0.0)),
                _ => Err(invalid()),
            }
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginLength::Px(v) => write!(f, "{}px", v),
            MarginLength::Percent(v) => write!(f, "{}%", v),
        }
    }
}

/// Margin applied around the viewport before intersection testing.
///
/// Parsed from CSS margin shorthand: `"10px"`, `"10px 20px"`,
/// `"10px 20px 30px"` or `"10px 20px 30px 40px"` (top, right, bottom, left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin {
        top: MarginLength::Px(0.0),
        right: MarginLength::Px(0.0),
        bottom: MarginLength::Px(0.0),
        left: MarginLength::Px(0.0),
    };

    /// Resolve percentages against the viewport (vertical sides use height)
    pub fn resolve(&self, viewport: Size) -> Insets {
        Insets {
            top: self.top.resolve(viewport.height),
            right: self.right.resolve(viewport.width),
            bottom: self.bottom.resolve(viewport.height),
            left: self.left.resolve(viewport.width),
        }
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for RootMargin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split_whitespace()
            .map(str::parse::<MarginLength>)
            .collect::<Result<Vec<_>>>()?;
        let (top, right, bottom, left) = match parts.as_slice() {
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(Error::InvalidRootMargin(s.to_string())),
        };
        Ok(Self { top, right, bottom, left })
    }
}

impl TryFrom<String> for RootMargin {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RootMargin> for String {
    fn from(margin: RootMargin) -> Self {
        margin.to_string()
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Sorted, de-duplicated list of intersection ratios in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdsRepr", into = "ThresholdsRepr")]
pub struct Thresholds(Vec<f64>);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ThresholdsRepr {
    Single(f64),
    List(Vec<f64>),
}

impl Thresholds {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self> {
        let mut values: Vec<f64> = values.into_iter().collect();
        if let Some(bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(Error::InvalidThreshold(bad.to_string()));
        }
        if values.is_empty() {
            values.push(0.0);
        }
        values.sort_by(f64::total_cmp);
        values.dedup();
        Ok(Self(values))
    }

    /// A single threshold; out-of-range values are clamped
    pub fn single(value: f64) -> Self {
        Self(vec![value.clamp(0.0, 1.0)])
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of thresholds at or below `ratio`
    pub fn index_for(&self, ratio: f64) -> usize {
        const EPSILON: f64 = 1e-9;
        self.0.iter().filter(|t| ratio + EPSILON >= **t).count()
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self(vec![0.0])
    }
}

impl TryFrom<ThresholdsRepr> for Thresholds {
    type Error = Error;

    fn try_from(repr: ThresholdsRepr) -> Result<Self> {
        match repr {
            ThresholdsRepr::Single(v) => Thresholds::new([v]),
            ThresholdsRepr::List(vs) => Thresholds::new(vs),
        }
    }
}

impl From<Thresholds> for ThresholdsRepr {
    fn from(thresholds: Thresholds) -> Self {
        match thresholds.0.as_slice() {
            [single] => ThresholdsRepr::Single(*single),
            _ => ThresholdsRepr::List(thresholds.0),
        }
    }
}
