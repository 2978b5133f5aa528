//! Level-derived progression values.
//!
//! Two curves live here. [`experience_required_for_level`] is the
//! display-only threshold shown next to the progress bar. The service curve
//! ([`level_for_total_exp`], [`total_exp_for_level`]) is what the quest
//! service uses to decide level-ups; the controller never calls it, only the
//! in-memory service adapter does.

use serde::{Deserialize, Serialize};

const BASE_EXPERIENCE: f64 = 100.0;
const GROWTH_FACTOR: f64 = 1.5;
/// Hard ceiling for the service curve; the threshold overflows `u64` well
/// before this.
const MAX_LEVEL: u32 = 128;

/// Experience shown as "needed for next level" at `level`.
///
/// Computes `100 * 1.5^(level - 1)` rounded to the nearest integer. Levels
/// below 1 are treated as 1.
///
/// # Examples
/// ```
/// use tidequest::domain::experience_required_for_level;
///
/// assert_eq!(experience_required_for_level(1), 100);
/// assert_eq!(experience_required_for_level(2), 150);
/// assert_eq!(experience_required_for_level(3), 225);
/// ```
pub fn experience_required_for_level(level: u32) -> u64 {
    let exponent = i32::try_from(level.max(1) - 1).unwrap_or(i32::MAX);
    saturating_f64_to_u64((BASE_EXPERIENCE * GROWTH_FACTOR.powi(exponent)).round())
}

/// Cumulative experience at which the service places a user on `level`.
///
/// Level 1 starts at 0. Level `L >= 2` is reached once the total is at least
/// `100 * 1.5^(L - 2)`, so its first whole total is the ceiling of that value.
///
/// # Examples
/// ```
/// use tidequest::domain::total_exp_for_level;
///
/// assert_eq!(total_exp_for_level(4), 225);
/// assert_eq!(total_exp_for_level(5), 338);
/// ```
pub fn total_exp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    let exponent = i32::try_from(level - 2).unwrap_or(i32::MAX);
    saturating_f64_to_u64((BASE_EXPERIENCE * GROWTH_FACTOR.powi(exponent)).ceil())
}

/// Level the service assigns for `total_exp` cumulative experience.
///
/// # Examples
/// ```
/// use tidequest::domain::level_for_total_exp;
///
/// assert_eq!(level_for_total_exp(99), 1);
/// assert_eq!(level_for_total_exp(100), 2);
/// assert_eq!(level_for_total_exp(337), 4);
/// assert_eq!(level_for_total_exp(450), 5);
/// ```
pub fn level_for_total_exp(total_exp: u64) -> u32 {
    let mut level = 1;
    while level < MAX_LEVEL && total_exp >= total_exp_for_level(level + 1) {
        level += 1;
    }
    level
}

/// Experience earned since the start of `level`.
pub fn exp_within_level(total_exp: u64, level: u32) -> u64 {
    total_exp.saturating_sub(total_exp_for_level(level))
}

/// Experience still missing before the service promotes past `level`.
pub fn exp_to_next_level(total_exp: u64, level: u32) -> u64 {
    total_exp_for_level(level + 1).saturating_sub(total_exp)
}

fn saturating_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= u64::MAX as f64 {
        u64::MAX
    } else {
        value as u64
    }
}

/// Ocean depth band used to pick a cosmetic backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthTier {
    /// Levels 1 to 5.
    Shallow,
    /// Levels 6 to 10.
    Coastal,
    /// Levels 11 to 20.
    Deep,
    /// Level 21 and beyond.
    Abyss,
}

impl DepthTier {
    /// Depth band for `level`.
    pub const fn for_level(level: u32) -> Self {
        match level {
            0..=5 => Self::Shallow,
            6..=10 => Self::Coastal,
            11..=20 => Self::Deep,
            _ => Self::Abyss,
        }
    }

    /// Zero-based tier index.
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Shallow => "shallow sea",
            Self::Coastal => "coastal waters",
            Self::Deep => "deep sea",
            Self::Abyss => "abyss",
        }
    }
}

/// Companion creature shown beside the user's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureTier {
    Fish,
    TropicalFish,
    Turtle,
    Shark,
    Octopus,
    Whale,
}

impl CreatureTier {
    /// Creature for `level`, stepping every five levels up to 25.
    pub const fn for_level(level: u32) -> Self {
        match level {
            0..=5 => Self::Fish,
            6..=10 => Self::TropicalFish,
            11..=15 => Self::Turtle,
            16..=20 => Self::Shark,
            21..=25 => Self::Octopus,
            _ => Self::Whale,
        }
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fish => "fish",
            Self::TropicalFish => "tropical fish",
            Self::Turtle => "turtle",
            Self::Shark => "shark",
            Self::Octopus => "octopus",
            Self::Whale => "whale",
        }
    }
}
