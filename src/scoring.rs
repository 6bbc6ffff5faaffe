//! # Scoring: Strike-Zone Classification
//!
//! Maps a normalized pitch coordinate onto the 3×3 strike-zone grid and
//! awards points. `[0.0, 1.0]` spans the zone on each axis; anything outside
//! is a ball.
//!
//! | Band pair | Zone | Points |
//! |-----------|------|--------|
//! | corner × corner | Corner Strike | 3 |
//! | corner × mid (either order) | Edge Strike | 2 |
//! | mid × mid | Center Strike | 1 |
//! | outside `[0, 1]` on either axis | Ball | 0 |
//!
//! Bands are split at exact thirds: `low = [0, 1/3)`, `mid = [1/3, 2/3)`,
//! `high = [2/3, 1]`. The high band is closed so `1.0` is still a strike.

use serde::{Deserialize, Serialize};

const LOWER_THIRD: f64 = 1.0 / 3.0;
const UPPER_THIRD: f64 = 2.0 / 3.0;

/// Classification of a single pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "Corner Strike")]
    CornerStrike,
    #[serde(rename = "Edge Strike")]
    EdgeStrike,
    #[serde(rename = "Center Strike")]
    CenterStrike,
    Ball,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::CornerStrike => "Corner Strike",
            Zone::EdgeStrike => "Edge Strike",
            Zone::CenterStrike => "Center Strike",
            Zone::Ball => "Ball",
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            Zone::CornerStrike => 3,
            Zone::EdgeStrike => 2,
            Zone::CenterStrike => 1,
            Zone::Ball => 0,
        }
    }

    /// Short lowercase name, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::CornerStrike => "corner",
            Zone::EdgeStrike => "edge",
            Zone::CenterStrike => "center",
            Zone::Ball => "ball",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    /// Caller guarantees `v` is in `[0, 1]`.
    fn of(v: f64) -> Band {
        if v < LOWER_THIRD {
            Band::Low
        } else if v < UPPER_THIRD {
            Band::Mid
        } else {
            Band::High
        }
    }
}

/// Classify a pitch at `(x, y)`.
///
/// Total and deterministic. NaN compares false against every bound, so it
/// lands outside the zone and scores as a ball.
pub fn classify(x: f64, y: f64) -> Zone {
    let inside = |v: f64| (0.0..=1.0).contains(&v);
    if !inside(x) || !inside(y) {
        return Zone::Ball;
    }
    match (Band::of(x), Band::of(y)) {
        (Band::Mid, Band::Mid) => Zone::CenterStrike,
        (Band::Mid, _) | (_, Band::Mid) => Zone::EdgeStrike,
        _ => Zone::CornerStrike,
    }
}
