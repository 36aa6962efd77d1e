//! Console output formatting with colored display

use std::fmt::Write as _;

use owo_colors::OwoColorize;

use crate::judge::{Classification, MatchError, RoundResult};
use crate::session::{RewardSource, SessionOutcome};

const BORDER_WIDTH: usize = 44;

/// Format a round result for console display with colored output
pub fn format_round_console(result: &RoundResult) -> String {
    let mut output = String::new();
    let border = "━".repeat(BORDER_WIDTH);
    let border_dim = border.dimmed();
    let judge = &result.judge;

    let status = if result.degraded {
        "NO INPUT".yellow().to_string()
    } else if result.is_success {
        "PASS".green().bold().to_string()
    } else {
        "FAIL".red().to_string()
    };

    let _ = writeln!(output, "{}", border_dim);
    let _ = writeln!(
        output,
        "  Round {} [{}] {}",
        result.round_index + 1,
        result.source.bold(),
        status
    );
    let _ = writeln!(output, "{}", border_dim);
    let _ = writeln!(output, "  SCORE  : {}", result.score);
    let _ = writeln!(
        output,
        "  COMBO  : {} (max {})",
        result.combo,
        result.max_combo
    );
    let _ = writeln!(
        output,
        "  JUDGE  : {}/{}/{}/{}",
        judge.perfect.cyan(),
        judge.good.truecolor(255, 200, 0),
        judge.miss.truecolor(200, 50, 30),
        judge.extra.truecolor(230, 120, 0),
    );
    let _ = writeln!(
        output,
        "  F/S    : {}/{}",
        judge.fast.blue(),
        judge.slow.red()
    );
    let _ = writeln!(
        output,
        "  RATE   : {:.1}% (needs {:.0}%)",
        result.hit_rate() * 100.0,
        result.success_threshold * 100.0
    );
    let _ = write!(output, "{}", border_dim);

    output
}

/// Per-event breakdown, one line per outcome
pub fn format_round_events(result: &RoundResult) -> String {
    let mut output = String::new();
    for feedback in &result.events {
        let outcome = &feedback.result;
        let at = outcome
            .expected_offset_ms
            .or(outcome.captured_timestamp_ms)
            .unwrap_or(0);
        let error = match outcome.error {
            Some(MatchError::Ms(ms)) => format!("{:+} ms", ms),
            Some(MatchError::Cents(cents)) => format!("{:+.0} ct", cents),
            None => String::new(),
        };
        let _ = writeln!(
            output,
            "  {:>6} ms  {:<8} {:>9}  {:+4}  x{}",
            at,
            format_colored_classification(&outcome.classification),
            error,
            feedback.points,
            feedback.combo
        );
    }
    output
}

/// Format a finished session for console display
pub fn format_session_console(outcome: &SessionOutcome) -> String {
    let mut output = String::new();
    let border = "━".repeat(BORDER_WIDTH);
    let border_dim = border.dimmed();
    let state = &outcome.state;

    let stars = format!(
        "{}{}",
        "★".repeat(outcome.reward.stars as usize),
        "☆".repeat(3usize.saturating_sub(outcome.reward.stars as usize))
    );
    let source = match outcome.source {
        RewardSource::Remote => "server".dimmed().to_string(),
        RewardSource::LocalFallback => "local".yellow().to_string(),
    };

    let _ = writeln!(output, "{}", border_dim);
    let _ = writeln!(output, "  {}", "Session complete".bold());
    let _ = writeln!(output, "{}", border_dim);
    let _ = writeln!(output, "  ROUNDS : {}", state.rounds_completed);
    let _ = writeln!(output, "  SCORE  : {}", state.cumulative_score);
    let _ = writeln!(
        output,
        "  HITS   : {}/{} ({:.1}%)",
        state.correct_count.green(),
        state.wrong_count.red(),
        state.accuracy() * 100.0
    );
    let _ = writeln!(output, "  COMBO  : {}", state.max_combo);
    let _ = writeln!(
        output,
        "  REWARD : {} +{} XP +{} coins ({})",
        stars.truecolor(255, 200, 0),
        outcome.reward.xp,
        outcome.reward.coins,
        source
    );
    if outcome.api_failures > 0 {
        let _ = writeln!(
            output,
            "  {}",
            format!("{} Session API call(s) failed", outcome.api_failures).yellow()
        );
    }
    let _ = write!(output, "{}", border_dim);

    output
}

/// Format classification with color
fn format_colored_classification(classification: &Classification) -> String {
    let name = format!("{:<7}", classification.short_name());
    match classification {
        Classification::Perfect => name.cyan().to_string(),
        Classification::Good => name.truecolor(255, 200, 0).to_string(),
        Classification::Miss => name.truecolor(200, 50, 30).to_string(),
        Classification::ExtraInput => name.truecolor(230, 120, 0).to_string(),
    }
}

/// Simple round summary for logging
pub fn format_round_summary(result: &RoundResult) -> String {
    format!(
        "round {} {} score {} ({}P/{}G/{}M/{}X) {}",
        result.round_index + 1,
        result.source,
        result.score,
        result.judge.perfect,
        result.judge.good,
        result.judge.miss,
        result.judge.extra,
        if result.is_success { "PASS" } else { "FAIL" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CapturedEvent;
    use crate::config::{DifficultyProfile, TimingWindows};
    use crate::session::{RewardResult, SessionState};
    use crate::timeline::{EventId, ExpectedEvent, ExpectedValue, Timeline, TimelineKind, Tolerance};

    fn result() -> RoundResult {
        let timeline = Timeline {
            source: "four on the floor".to_string(),
            kind: TimelineKind::Rhythm,
            tempo_bpm: 80,
            events: [0, 750, 1500, 2250]
                .iter()
                .enumerate()
                .map(|(i, &offset)| ExpectedEvent {
                    id: EventId(i as u32),
                    time_offset_ms: offset,
                    value: ExpectedValue::Beat(i as u32),
                    tolerance: Tolerance::Timing(TimingWindows::default()),
                })
                .collect(),
        };
        let taps: Vec<_> = [0, 760, 1500].into_iter().map(CapturedEvent::tap).collect();
        RoundResult::evaluate(0, &timeline, &taps, &DifficultyProfile::normal())
    }

    #[test]
    fn test_format_round_summary() {
        let summary = format_round_summary(&result());
        assert!(summary.contains("four on the floor"));
        assert!(summary.contains("3P/0G/1M/0X"));
        assert!(summary.contains("PASS"));
    }

    #[test]
    fn test_format_round_console_lists_counts() {
        let text = format_round_console(&result());
        assert!(text.contains("Round 1"));
        assert!(text.contains("SCORE  : 310"));
        assert!(text.contains("75.0%"));
    }

    #[test]
    fn test_format_round_events_one_line_per_outcome() {
        let text = format_round_events(&result());
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("+10 ms"));
    }

    #[test]
    fn test_format_session_console() {
        let outcome = SessionOutcome {
            session_id: None,
            state: SessionState {
                rounds_completed: 2,
                correct_count: 7,
                wrong_count: 1,
                max_combo: 4,
                cumulative_score: 720,
            },
            reward: RewardResult {
                stars: 2,
                xp: 34,
                coins: 10,
            },
            source: RewardSource::LocalFallback,
            rounds: Vec::new(),
            api_failures: 1,
        };
        let text = format_session_console(&outcome);
        assert!(text.contains("ROUNDS : 2"));
        assert!(text.contains("720"));
        assert!(text.contains("+34 XP"));
        assert!(text.contains("1 Session API call(s) failed"));
    }
}
