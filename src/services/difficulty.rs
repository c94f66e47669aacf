use serde::{Deserialize, Serialize};

const SCORE_WEIGHT: f64 = 0.65;
const TIME_WEIGHT: f64 = 0.20;
const ATTEMPT_WEIGHT: f64 = 0.15;

const FAST_TIME_MINUTES: f64 = 2.0;
const SLOW_TIME_MINUTES: f64 = 20.0;
const MAX_PENALIZED_ATTEMPTS: u32 = 4;

const HARD_READINESS: f64 = 0.75;
const HARD_MIN_SCORE: f64 = 7.0;
const MEDIUM_READINESS: f64 = 0.45;

/// Storage-canonical difficulty label. Client-facing synonyms
/// (beginner/intermediate/advanced) are mapped at the response layer and
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Accepts both the storage labels and the client synonyms.
    pub fn parse_client(value: &str) -> Option<Self> {
        Self::parse(value).or_else(|| match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Difficulty::Easy),
            "intermediate" => Some(Difficulty::Medium),
            "advanced" => Some(Difficulty::Hard),
            _ => None,
        })
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "beginner",
            Difficulty::Medium => "intermediate",
            Difficulty::Hard => "advanced",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicts the next difficulty from one attempt's signals.
///
/// Score is the primary signal; time and retries refine confidence. Inputs
/// are clamped (score to [0,10], time to >=0, attempts to >=1; NaN collapses
/// to the minimum valid value), so this never fails.
pub fn predict_level(score: f64, time_taken_minutes: f64, attempts: u32) -> Difficulty {
    let safe_score = if score.is_finite() {
        score.clamp(0.0, 10.0)
    } else {
        0.0
    };
    let safe_time = if time_taken_minutes.is_finite() {
        time_taken_minutes.max(0.0)
    } else {
        0.0
    };
    let safe_attempts = attempts.max(1);

    let score_signal = safe_score / 10.0;
    let time_signal = if safe_time <= FAST_TIME_MINUTES {
        1.0
    } else if safe_time >= SLOW_TIME_MINUTES {
        0.0
    } else {
        1.0 - (safe_time - FAST_TIME_MINUTES) / (SLOW_TIME_MINUTES - FAST_TIME_MINUTES)
    };
    let attempt_signal = if safe_attempts == 1 {
        1.0
    } else if safe_attempts >= MAX_PENALIZED_ATTEMPTS {
        0.0
    } else {
        1.0 - (safe_attempts - 1) as f64 / 3.0
    };

    let readiness =
        score_signal * SCORE_WEIGHT + time_signal * TIME_WEIGHT + attempt_signal * ATTEMPT_WEIGHT;

    if readiness >= HARD_READINESS && safe_score >= HARD_MIN_SCORE {
        Difficulty::Hard
    } else if readiness >= MEDIUM_READINESS {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_fast_first_try_is_hard() {
        assert_eq!(predict_level(10.0, 1.0, 1), Difficulty::Hard);
    }

    #[test]
    fn test_wrong_answer_baseline_is_medium() {
        // readiness = 0.26 + 0.20 + 0.15 = 0.61
        assert_eq!(predict_level(4.0, 1.0, 1), Difficulty::Medium);
    }

    #[test]
    fn test_slow_retried_zero_score_is_easy() {
        assert_eq!(predict_level(0.0, 25.0, 5), Difficulty::Easy);
    }

    #[test]
    fn test_high_readiness_requires_min_score_for_hard() {
        // score 6.9 keeps readiness above 0.75 but misses the score gate
        assert_eq!(predict_level(6.9, 1.0, 1), Difficulty::Medium);
    }

    #[test]
    fn test_inputs_are_clamped() {
        assert_eq!(predict_level(42.0, -3.0, 0), Difficulty::Hard);
        assert_eq!(predict_level(f64::NAN, f64::NAN, 1), Difficulty::Easy);
    }

    #[test]
    fn test_time_signal_boundaries() {
        // 2 minutes is still "fast", 20 minutes is fully "slow"
        assert_eq!(predict_level(10.0, 2.0, 1), Difficulty::Hard);
        assert_eq!(predict_level(4.0, 20.0, 4), Difficulty::Easy);
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("advanced"), None);
        assert_eq!(Difficulty::parse_client("advanced"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::Medium.display_label(), "intermediate");
    }
}
