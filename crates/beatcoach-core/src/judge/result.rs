use serde::{Deserialize, Serialize};

use super::{Classification, EventFeedback, Timing, match_events, score_round};
use crate::capture::CapturedEvent;
use crate::config::DifficultyProfile;
use crate::timeline::Timeline;

/// Classification counts for one round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeCounts {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub extra: u32,
    /// Successful matches captured before their offset
    pub fast: u32,
    /// Successful matches captured after their offset
    pub slow: u32,
}

impl JudgeCounts {
    /// Perfect + Good
    pub fn correct(&self) -> u32 {
        self.perfect + self.good
    }

    /// Miss + ExtraInput
    pub fn wrong(&self) -> u32 {
        self.miss + self.extra
    }

    /// Expected events in the round (every one yields Perfect, Good or Miss)
    pub fn expected(&self) -> u32 {
        self.perfect + self.good + self.miss
    }

    fn record(&mut self, feedback: &EventFeedback) {
        match feedback.result.classification {
            Classification::Perfect => self.perfect += 1,
            Classification::Good => self.good += 1,
            Classification::Miss => self.miss += 1,
            Classification::ExtraInput => self.extra += 1,
        }
        match feedback.result.timing() {
            Some(Timing::Early) => self.fast += 1,
            Some(Timing::Late) => self.slow += 1,
            _ => {}
        }
    }
}

/// Evaluated outcome of one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_index: u32,
    /// Name of the pattern or melody played
    pub source: String,
    pub judge: JudgeCounts,
    /// Reported score (running total floored at zero)
    pub score: u32,
    pub raw_total: i64,
    /// Combo at the end of the round
    pub combo: u32,
    pub max_combo: u32,
    pub success_threshold: f64,
    pub is_success: bool,
    /// True when no input could be captured for the round
    pub degraded: bool,
    pub events: Vec<EventFeedback>,
}

impl RoundResult {
    /// Match and score `captured` against `timeline`.
    pub fn evaluate(
        round_index: u32,
        timeline: &Timeline,
        captured: &[CapturedEvent],
        profile: &DifficultyProfile,
    ) -> Self {
        let matches = match_events(&timeline.events, captured);
        let scored = score_round(&matches, &profile.scoring);

        let mut judge = JudgeCounts::default();
        for feedback in &scored.feedback {
            judge.record(feedback);
        }

        let expected = timeline.len() as u32;
        let is_success =
            expected > 0 && judge.correct() as f64 / expected as f64 >= profile.success_threshold;

        Self {
            round_index,
            source: timeline.source.clone(),
            judge,
            score: scored.score,
            raw_total: scored.raw_total,
            combo: scored.combo,
            max_combo: scored.max_combo,
            success_threshold: profile.success_threshold,
            is_success,
            degraded: false,
            events: scored.feedback,
        }
    }

    /// Evaluate a round in which no input could be captured.
    pub fn degraded(round_index: u32, timeline: &Timeline, profile: &DifficultyProfile) -> Self {
        let mut result = Self::evaluate(round_index, timeline, &[], profile);
        result.degraded = true;
        result
    }

    /// correct / (correct + wrong), 0 when nothing was judged
    pub fn accuracy(&self) -> f64 {
        let judged = self.judge.correct() + self.judge.wrong();
        if judged == 0 {
            return 0.0;
        }
        self.judge.correct() as f64 / judged as f64
    }

    /// correct / expected, the ratio compared against the success threshold
    pub fn hit_rate(&self) -> f64 {
        let expected = self.judge.expected();
        if expected == 0 {
            return 0.0;
        }
        self.judge.correct() as f64 / expected as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingWindows;
    use crate::timeline::{EventId, ExpectedEvent, ExpectedValue, TimelineKind, Tolerance};

    fn timeline(offsets: &[u64]) -> Timeline {
        Timeline {
            source: "four".to_string(),
            kind: TimelineKind::Rhythm,
            tempo_bpm: 80,
            events: offsets
                .iter()
                .enumerate()
                .map(|(i, &offset)| ExpectedEvent {
                    id: EventId(i as u32),
                    time_offset_ms: offset,
                    value: ExpectedValue::Beat(i as u32),
                    tolerance: Tolerance::Timing(TimingWindows::default()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_three_perfect_one_miss() {
        let timeline = timeline(&[0, 750, 1500, 2250]);
        let taps: Vec<_> = [0, 750, 1500].into_iter().map(CapturedEvent::tap).collect();
        let result = RoundResult::evaluate(0, &timeline, &taps, &DifficultyProfile::normal());

        assert_eq!(result.judge.perfect, 3);
        assert_eq!(result.judge.miss, 1);
        assert_eq!(result.judge.correct(), 3);
        assert_eq!(result.judge.wrong(), 1);
        assert_eq!(result.combo, 0);
        assert_eq!(result.max_combo, 3);
        // 105 + 110 + 115 - 20
        assert_eq!(result.score, 310);
        assert!(result.is_success);
    }

    #[test]
    fn test_combo_resets_after_miss_in_any_position() {
        let timeline = timeline(&[0, 750, 1500, 2250]);
        for missing in 0..4u64 {
            let taps: Vec<_> = (0..4u64)
                .filter(|&i| i != missing)
                .map(|i| CapturedEvent::tap(i * 750))
                .collect();
            let result = RoundResult::evaluate(0, &timeline, &taps, &DifficultyProfile::normal());
            assert_eq!(result.judge.correct(), 3);
            assert_eq!(result.judge.wrong(), 1);
            let after_miss = result
                .events
                .iter()
                .find(|f| f.result.classification == Classification::Miss)
                .map(|f| f.combo);
            assert_eq!(after_miss, Some(0));
        }
    }

    #[test]
    fn test_degraded_round() {
        let timeline = timeline(&[0, 500, 1000, 1500, 2000]);
        let result = RoundResult::degraded(2, &timeline, &DifficultyProfile::normal());
        assert!(result.degraded);
        assert_eq!(result.judge.miss, 5);
        assert_eq!(result.judge.correct(), 0);
        assert_eq!(result.score, 0);
        assert!(!result.is_success);
    }

    #[test]
    fn test_fast_slow_counts() {
        let timeline = timeline(&[1000, 2000, 3000]);
        let taps = vec![
            CapturedEvent::tap(960),
            CapturedEvent::tap(2040),
            CapturedEvent::tap(3000),
        ];
        let result = RoundResult::evaluate(0, &timeline, &taps, &DifficultyProfile::normal());
        assert_eq!(result.judge.fast, 1);
        assert_eq!(result.judge.slow, 1);
    }

    #[test]
    fn test_success_threshold_boundary() {
        let timeline = timeline(&[0, 1000, 2000, 3000, 4000, 5000, 6000, 7000, 8000, 9000]);
        let taps: Vec<_> = (0..7u64).map(|i| CapturedEvent::tap(i * 1000)).collect();
        let normal = RoundResult::evaluate(0, &timeline, &taps, &DifficultyProfile::normal());
        assert!(normal.is_success); // 0.7 >= 0.7
        let hard = RoundResult::evaluate(0, &timeline, &taps, &DifficultyProfile::hard());
        assert!(!hard.is_success); // 0.7 < 0.75
    }

    #[test]
    fn test_accuracy_counts_extra_inputs() {
        let timeline = timeline(&[0, 1000]);
        let taps = vec![
            CapturedEvent::tap(0),
            CapturedEvent::tap(500),
            CapturedEvent::tap(1000),
        ];
        let result = RoundResult::evaluate(0, &timeline, &taps, &DifficultyProfile::normal());
        assert_eq!(result.judge.extra, 1);
        assert!((result.accuracy() - 2.0 / 3.0).abs() < 1e-9);
        assert!((result.hit_rate() - 1.0).abs() < 1e-9);
    }
}
