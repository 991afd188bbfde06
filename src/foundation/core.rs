use std::{fmt, str::FromStr};

use crate::foundation::error::{KitError, KitResult};

pub use kurbo::Vec2;

/// Stable handle of a layer inside the active composition.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Integer keyframe tag understood by the host (0 = none).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LabelColor(pub u8);

impl LabelColor {
    pub const NONE: Self = Self(0);
    pub const BLUE: Self = Self(8);
    pub const GREEN: Self = Self(9);
    pub const PURPLE: Self = Self(10);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Closed time interval in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> KitResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(KitError::validation("TimeWindow bounds must be finite"));
        }
        if start > end {
            return Err(KitError::validation("TimeWindow start must be <= end"));
        }
        Ok(Self { start, end })
    }

    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn contains_with_tolerance(self, t: f64, tolerance: f64) -> bool {
        self.start - tolerance <= t && t <= self.end + tolerance
    }

    /// Inclusive overlap: windows that touch at a boundary overlap.
    pub fn overlaps(self, other: TimeWindow) -> bool {
        other.contains(self.start)
            || other.contains(self.end)
            || (self.start <= other.start && self.end >= other.end)
    }

    /// Smallest window covering both.
    pub fn union(self, other: TimeWindow) -> TimeWindow {
        TimeWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Which side of a transition a fade belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FadeKind {
    /// Fade-out, driver goes 100 -> 0.
    #[serde(rename = "fadeOut")]
    Exit,
    /// Fade-in, driver goes 0 -> 100.
    #[serde(rename = "fadeIn")]
    Enter,
}

impl FadeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Exit => "Fade Out",
            Self::Enter => "Fade In",
        }
    }

    pub fn api_name(self) -> &'static str {
        match self {
            Self::Exit => "fadeOut",
            Self::Enter => "fadeIn",
        }
    }

    /// Driver values at the first and second keyframe of one fade.
    pub fn values(self) -> (f64, f64) {
        match self {
            Self::Exit => (100.0, 0.0),
            Self::Enter => (0.0, 100.0),
        }
    }
}

impl fmt::Display for FadeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Slide direction of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Left => "←",
            Self::Right => "→",
            Self::Up => "↑",
            Self::Down => "↓",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Unit displacement in composition space (y grows downward).
    pub fn unit(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
        }
    }

    /// Dominant-axis direction of a displacement. Ties go to the vertical axis.
    pub fn from_delta(delta: Vec2) -> Self {
        if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 { Self::Right } else { Self::Left }
        } else if delta.y > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = KitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(KitError::validation(format!("unknown direction '{other}'"))),
        }
    }
}

/// Seconds rendered as whole milliseconds, e.g. `250ms`.
pub fn format_ms(seconds: f64) -> String {
    format!("{}ms", (seconds * 1000.0).round() as i64)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
