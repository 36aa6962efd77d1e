use serde::{Deserialize, Serialize};

use super::{Classification, MatchResult};
use crate::config::ScoringRules;

/// Per-event outcome after scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventFeedback {
    pub result: MatchResult,
    /// Points added (positive) or deducted (negative) by this outcome.
    pub points: i64,
    /// Combo after this outcome.
    pub combo: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    /// Running total floored at zero.
    pub score: u32,
    /// Unfloored running total.
    pub raw_total: i64,
    pub combo: u32,
    pub max_combo: u32,
    pub feedback: Vec<EventFeedback>,
}

/// Fold matches, in the order given, into points and combo.
///
/// A successful classification increments the combo and earns its base
/// points plus `combo * per_combo_increment`. Misses and extra inputs reset
/// the combo and deduct a fixed penalty. The running total may go negative
/// during accumulation so later hits can recover it; it is floored only when
/// reported.
pub fn score_round(matches: &[MatchResult], rules: &ScoringRules) -> RoundScore {
    let mut total: i64 = 0;
    let mut combo: u32 = 0;
    let mut max_combo: u32 = 0;
    let mut feedback = Vec::with_capacity(matches.len());

    for result in matches {
        let points = match result.classification {
            Classification::Perfect | Classification::Good => {
                combo += 1;
                max_combo = max_combo.max(combo);
                let base = if result.classification == Classification::Perfect {
                    rules.perfect_points
                } else {
                    rules.good_points
                };
                base as i64 + combo as i64 * rules.per_combo_increment as i64
            }
            Classification::Miss => {
                combo = 0;
                -(rules.miss_penalty as i64)
            }
            Classification::ExtraInput => {
                combo = 0;
                -(rules.extra_penalty as i64)
            }
        };
        total += points;
        feedback.push(EventFeedback {
            result: *result,
            points,
            combo,
        });
    }

    RoundScore {
        score: total.clamp(0, u32::MAX as i64) as u32,
        raw_total: total,
        combo,
        max_combo,
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::EventId;

    fn hit(classification: Classification, at: u64) -> MatchResult {
        match classification {
            Classification::Miss => MatchResult::miss(EventId(at as u32), at),
            Classification::ExtraInput => MatchResult::extra(at),
            _ => MatchResult {
                expected_id: Some(EventId(at as u32)),
                expected_offset_ms: Some(at),
                captured_timestamp_ms: Some(at),
                classification,
                error: None,
            },
        }
    }

    fn rules() -> ScoringRules {
        ScoringRules {
            perfect_points: 100,
            good_points: 50,
            miss_penalty: 20,
            extra_penalty: 10,
            per_combo_increment: 5,
        }
    }

    #[test]
    fn test_combo_bonus_uses_updated_combo() {
        use Classification::*;
        let matches = [hit(Perfect, 0), hit(Good, 1), hit(Perfect, 2)];
        let score = score_round(&matches, &rules());
        let points: Vec<i64> = score.feedback.iter().map(|f| f.points).collect();
        assert_eq!(points, vec![105, 60, 115]);
        assert_eq!(score.score, 280);
        assert_eq!(score.combo, 3);
        assert_eq!(score.max_combo, 3);
    }

    #[test]
    fn test_combo_resets_on_miss_and_extra() {
        use Classification::*;
        let matches = [
            hit(Perfect, 0),
            hit(Perfect, 1),
            hit(Miss, 2),
            hit(Good, 3),
            hit(ExtraInput, 4),
            hit(Perfect, 5),
        ];
        let score = score_round(&matches, &rules());
        let combos: Vec<u32> = score.feedback.iter().map(|f| f.combo).collect();
        assert_eq!(combos, vec![1, 2, 0, 1, 0, 1]);
        assert_eq!(score.max_combo, 2);
    }

    #[test]
    fn test_combo_non_decreasing_within_successful_run() {
        use Classification::*;
        let matches: Vec<_> = (0..8)
            .map(|i| hit(if i % 3 == 0 { Good } else { Perfect }, i))
            .collect();
        let score = score_round(&matches, &rules());
        assert!(score.feedback.windows(2).all(|w| w[1].combo == w[0].combo + 1));
    }

    #[test]
    fn test_score_floored_only_when_reported() {
        use Classification::*;
        let matches = [hit(Miss, 0), hit(Miss, 1), hit(Miss, 2), hit(Perfect, 3)];
        let score = score_round(&matches, &rules());
        // -60 then +105 recovers to 45
        assert_eq!(score.raw_total, 45);
        assert_eq!(score.score, 45);

        let all_miss = [hit(Miss, 0), hit(ExtraInput, 1)];
        let score = score_round(&all_miss, &rules());
        assert_eq!(score.raw_total, -30);
        assert_eq!(score.score, 0);
    }

    #[test]
    fn test_empty_round() {
        let score = score_round(&[], &rules());
        assert_eq!(score.score, 0);
        assert_eq!(score.max_combo, 0);
        assert!(score.feedback.is_empty());
    }
}
