use super::{Classification, MatchError, MatchResult};
use crate::capture::{CapturedEvent, CapturedValue};
use crate::timeline::{ExpectedEvent, ExpectedValue, Tolerance};

/// Why a capture can be assigned to an expected event, and how well it fits.
fn evaluate_candidate(expected: &ExpectedEvent, captured: &CapturedEvent) -> Option<(Classification, MatchError)> {
    let error_ms = captured.timestamp_ms as i64 - expected.time_offset_ms as i64;

    match (expected.tolerance, expected.value, captured.value) {
        (Tolerance::Timing(windows), ExpectedValue::Beat(_), CapturedValue::Tap) => {
            let distance = error_ms.unsigned_abs();
            if distance > windows.good_ms as u64 || error_ms > windows.lookahead_ms as i64 {
                return None;
            }
            let classification = if distance <= windows.perfect_ms as u64 {
                Classification::Perfect
            } else {
                Classification::Good
            };
            Some((classification, MatchError::Ms(error_ms)))
        }
        (Tolerance::Pitch(windows), ExpectedValue::Pitch(pitch), CapturedValue::Pitch { midi }) => {
            if error_ms.unsigned_abs() > windows.lookahead_ms as u64 {
                return None;
            }
            let cents = ((midi - pitch.midi as f64) * 100.0) as f32;
            if cents.abs() > windows.good_cents {
                return None;
            }
            let classification = if cents.abs() <= windows.perfect_cents {
                Classification::Perfect
            } else {
                Classification::Good
            };
            Some((classification, MatchError::Cents(cents)))
        }
        _ => None,
    }
}

/// Latest capture time (round-local) that could still match `expected`.
fn latest_eligible_ms(expected: &ExpectedEvent) -> u64 {
    let reach = match expected.tolerance {
        Tolerance::Timing(w) => w.good_ms.min(w.lookahead_ms),
        Tolerance::Pitch(w) => w.lookahead_ms,
    };
    expected.time_offset_ms + reach as u64
}

/// Greedy single-pass matching.
///
/// Each expected event, in offset order, takes the earliest unassigned
/// capture inside its tolerance band. Unassigned captures become
/// `ExtraInput`. Results are returned in timeline order, expected events
/// before extra inputs at the same instant.
pub fn match_events(timeline: &[ExpectedEvent], captured: &[CapturedEvent]) -> Vec<MatchResult> {
    let mut expected: Vec<&ExpectedEvent> = timeline.iter().collect();
    expected.sort_by_key(|e| e.time_offset_ms);

    let mut captures: Vec<&CapturedEvent> = captured.iter().collect();
    captures.sort_by_key(|c| c.timestamp_ms);
    let mut assigned = vec![false; captures.len()];

    let mut results = Vec::with_capacity(expected.len() + captures.len());

    for event in expected {
        let latest = latest_eligible_ms(event);
        let mut found = None;

        for (index, capture) in captures.iter().enumerate() {
            if capture.timestamp_ms > latest {
                break;
            }
            if assigned[index] {
                continue;
            }
            if let Some(fit) = evaluate_candidate(event, capture) {
                found = Some((index, fit));
                break;
            }
        }

        let result = match found {
            Some((index, (classification, error))) => {
                assigned[index] = true;
                MatchResult {
                    expected_id: Some(event.id),
                    expected_offset_ms: Some(event.time_offset_ms),
                    captured_timestamp_ms: Some(captures[index].timestamp_ms),
                    classification,
                    error: Some(error),
                }
            }
            None => MatchResult::miss(event.id, event.time_offset_ms),
        };
        results.push(result);
    }

    results.extend(
        captures
            .iter()
            .zip(&assigned)
            .filter(|(_, taken)| !**taken)
            .map(|(capture, _)| MatchResult::extra(capture.timestamp_ms)),
    );

    // Stable: expected results precede extras that share a time key
    results.sort_by_key(|r| (r.time_key(), r.expected_id.is_none()));
    results
}
