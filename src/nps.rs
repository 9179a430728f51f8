use std::fmt;
use std::str::FromStr;

use crate::models::NpsBreakdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NpsCategory {
    Promoter,
    Passive,
    Detractor,
}

impl NpsCategory {
    pub fn classify(score: i32) -> Self {
        match score {
            s if s >= 9 => NpsCategory::Promoter,
            7 | 8 => NpsCategory::Passive,
            _ => NpsCategory::Detractor,
        }
    }

    /// Inclusive score range covered by the category on the 0-10 scale.
    pub fn score_range(self) -> (i32, i32) {
        match self {
            NpsCategory::Promoter => (9, 10),
            NpsCategory::Passive => (7, 8),
            NpsCategory::Detractor => (0, 6),
        }
    }
}

impl fmt::Display for NpsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NpsCategory::Promoter => write!(f, "promoter"),
            NpsCategory::Passive => write!(f, "passive"),
            NpsCategory::Detractor => write!(f, "detractor"),
        }
    }
}

impl FromStr for NpsCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "promoter" | "promoters" => Ok(NpsCategory::Promoter),
            "passive" | "passives" => Ok(NpsCategory::Passive),
            "detractor" | "detractors" => Ok(NpsCategory::Detractor),
            other => Err(format!(
                "unknown NPS category '{other}' (expected promoter, passive or detractor)"
            )),
        }
    }
}

impl NpsBreakdown {
    pub fn tally<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut breakdown = NpsBreakdown::default();
        for score in scores {
            match NpsCategory::classify(score) {
                NpsCategory::Promoter => breakdown.promoters += 1,
                NpsCategory::Passive => breakdown.passives += 1,
                NpsCategory::Detractor => breakdown.detractors += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.promoters + self.passives + self.detractors
    }

    pub fn score(&self) -> i32 {
        nps_score(self.promoters, self.detractors, self.total())
    }
}

/// Net Promoter Score as a whole percentage in [-100, 100]; 0 for no responses.
pub fn nps_score(promoters: usize, detractors: usize, total: usize) -> i32 {
    rounded_ratio(promoters as i64 - detractors as i64, total as i64)
}

/// `part / total * 100` rounded to a whole percentage; 0 when `total` is 0.
pub fn rounded_percent(part: usize, total: usize) -> i32 {
    rounded_ratio(part as i64, total as i64)
}

// Integer arithmetic keeps exact halves exact; ties round away from zero.
fn rounded_ratio(numerator: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    let scaled = numerator.unsigned_abs() * 200 + total as u64;
    let magnitude = (scaled / (2 * total as u64)) as i32;
    if numerator < 0 {
        -magnitude
    } else {
        magnitude
    }
}
