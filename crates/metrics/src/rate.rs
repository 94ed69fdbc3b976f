//! Percentage rate carrying both numeric and formatted forms. The wire
//! format is the formatted string the dashboard renders; the numeric ratio
//! stays available in-process so consumers never parse display strings back
//! into numbers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rate {
    ratio: f64,
}

impl Rate {
    pub const ZERO: Rate = Rate { ratio: 0.0 };

    /// numerator/denominator as a ratio; zero when the denominator is zero.
    pub fn of(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Self::ZERO
        } else {
            Self {
                ratio: numerator as f64 / denominator as f64,
            }
        }
    }

    /// Signed difference `lhs - rhs`. Only the A/B comparison block carries
    /// negative rates.
    pub fn difference(lhs: Rate, rhs: Rate) -> Rate {
        Rate {
            ratio: lhs.ratio - rhs.ratio,
        }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn percent(&self) -> f64 {
        self.ratio * 100.0
    }

    /// Whole-percent display form, rounded half away from zero
    /// (25/40 renders as "63%").
    pub fn display(&self) -> String {
        format!("{}%", (self.ratio * 100.0).round() as i64)
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let percent: f64 = text
            .trim_end_matches('%')
            .parse()
            .map_err(serde::de::Error::custom)?;
        Ok(Rate {
            ratio: percent / 100.0,
        })
    }
}
