use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use super::{EngineEvent, EventBus, ListenExit, Phase, RoundState};
use crate::capture::{CaptureSource, capture_source};
use crate::clock::{Clock, PhaseTimer};
use crate::config::{DifficultyProfile, EngineConfig, LevelConfig, events};
use crate::device::{CaptureDevice, PlaybackDevice};
use crate::error::{Error, Result};
use crate::judge::RoundResult;
use crate::session::{OfflineSessionApi, SessionAggregator, SessionApi, SessionOutcome, SessionState};
use crate::timeline::{SelectionSeed, TimelineBuilder};

/// Player identity and backend used for the session.
pub struct SessionBinding {
    pub user_id: String,
    pub api: Box<dyn SessionApi>,
}

impl SessionBinding {
    pub fn new(user_id: &str, api: Box<dyn SessionApi>) -> Self {
        Self {
            user_id: user_id.to_string(),
            api,
        }
    }

    pub fn offline(user_id: &str) -> Self {
        Self::new(user_id, Box::new(OfflineSessionApi))
    }
}

/// Drives rounds of one mini-game level through their phases.
///
/// Single-threaded: every transition happens inside a method call on the
/// engine. Capture devices deliver input from their own threads through a
/// bounded queue that `tick()` drains.
pub struct RoundEngine {
    config: EngineConfig,
    builder: TimelineBuilder,
    capture: Box<dyn CaptureSource>,
    playback: Box<dyn PlaybackDevice>,
    clock: Arc<dyn Clock>,

    binding: Option<SessionBinding>,
    session: Option<SessionAggregator>,
    session_finished: bool,

    phase: Phase,
    round: Option<RoundState>,
    paused_from: Option<Phase>,
    /// Countdown, playback or listening deadline, depending on the phase.
    timer: PhaseTimer,
    countdown_announced: u32,
    playback_active: bool,
    degraded: bool,
    rounds_completed: u32,
    last_exit: Option<ListenExit>,
    last_result: Option<RoundResult>,

    bus: EventBus,
}

impl RoundEngine {
    /// Build an engine in Idle around an already constructed capture source.
    ///
    /// Fails with `Error::Config` when the engine config or the level is
    /// invalid; no device is touched until the first Listening phase.
    pub fn new(
        config: EngineConfig,
        level: LevelConfig,
        seed: SelectionSeed,
        capture: Box<dyn CaptureSource>,
        playback: Box<dyn PlaybackDevice>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let profile = config.profile_for(level.difficulty).clone();
        let builder = TimelineBuilder::new(level, profile, seed)?;

        Ok(Self {
            config,
            builder,
            capture,
            playback,
            clock,
            binding: None,
            session: None,
            session_finished: false,
            phase: Phase::Idle,
            round: None,
            paused_from: None,
            timer: PhaseTimer::new(),
            countdown_announced: 0,
            playback_active: false,
            degraded: false,
            rounds_completed: 0,
            last_exit: None,
            last_result: None,
            bus: EventBus::new(events::QUEUE_CAPACITY),
        })
    }

    /// Build the engine with the capture source matching the level's material.
    pub fn with_device(
        config: EngineConfig,
        level: LevelConfig,
        seed: SelectionSeed,
        device: Box<dyn CaptureDevice>,
        playback: Box<dyn PlaybackDevice>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let capture = capture_source(level.material.kind().into(), device, &config);
        Self::new(config, level, seed, capture, playback, clock)
    }

    /// Use `binding` for the session opened by the first `start_round`.
    pub fn with_session(mut self, binding: SessionBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The live round, kept through Result until the next round or cancel.
    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn level(&self) -> &LevelConfig {
        self.builder.level()
    }

    pub fn profile(&self) -> &DifficultyProfile {
        self.builder.profile()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rounds evaluated so far; cancelled rounds do not count.
    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn total_rounds(&self) -> u32 {
        self.builder.level().rounds
    }

    /// How the most recent Listening phase ended.
    pub fn last_exit(&self) -> Option<ListenExit> {
        self.last_exit
    }

    /// Evaluation of the most recent round.
    pub fn last_result(&self) -> Option<&RoundResult> {
        self.last_result.as_ref()
    }

    /// Running session totals, once the first round has started.
    pub fn session_state(&self) -> Option<&SessionState> {
        self.session.as_ref().map(|s| s.state())
    }

    /// Time left in the current timed phase.
    pub fn remaining_ms(&self) -> u64 {
        self.timer.remaining_ms(self.clock.now_ms())
    }

    /// How often the host should call `tick`.
    pub fn tick_interval_ms(&self) -> u64 {
        self.config.tick_interval_ms
    }

    /// Idle → Countdown with a freshly built timeline.
    ///
    /// Opens the session on first use. Fails once every round is done.
    pub fn start_round(&mut self) -> Result<()> {
        if self.phase != Phase::Idle || self.rounds_completed >= self.total_rounds() {
            return Err(self.invalid("start a round"));
        }
        self.begin_round()
    }

    /// Advance timers and drain capture. Call every `tick_interval_ms`.
    ///
    /// Returns the phase after the tick.
    pub fn tick(&mut self) -> Phase {
        let now = self.clock.now_ms();
        match self.phase {
            Phase::Countdown => self.tick_countdown(now),
            Phase::Playing => self.tick_playing(now),
            Phase::Listening => self.tick_listening(now),
            Phase::Paused if self.paused_from == Some(Phase::Listening) => {
                // Suspended capture discards whatever arrived meanwhile
                self.capture.drain();
            }
            _ => {}
        }
        self.phase
    }

    /// Suspend Countdown, Playing or Listening. Timers freeze; captured input is kept.
    pub fn pause(&mut self) -> Result<()> {
        if !self.phase.is_pausable() {
            return Err(self.invalid("pause"));
        }
        let now = self.clock.now_ms();

        match self.phase {
            Phase::Playing => {
                self.playback.stop();
                self.playback_active = false;
            }
            Phase::Listening => {
                self.collect_captures();
                self.capture.suspend();
            }
            _ => {}
        }
        self.timer.pause(now);
        self.paused_from = Some(self.phase);
        self.set_phase(Phase::Paused);
        Ok(())
    }

    /// Return to the paused phase from its elapsed position.
    ///
    /// Falls back to restarting the round from Countdown when the paused
    /// device cannot continue mid-phase.
    pub fn resume(&mut self) -> Result<()> {
        let Some(from) = self.paused_from.filter(|_| self.phase == Phase::Paused) else {
            return Err(self.invalid("resume"));
        };
        self.paused_from = None;
        let now = self.clock.now_ms();

        match from {
            Phase::Playing if !self.playback.supports_resume() => {
                self.restart_round("playback cannot resume");
                return Ok(());
            }
            Phase::Listening if !self.capture.supports_resume() => {
                self.restart_round("capture cannot resume");
                return Ok(());
            }
            _ => {}
        }

        self.timer.resume(now);
        match from {
            Phase::Playing => self.start_playback(self.timer.elapsed_ms(now)),
            Phase::Listening => self.capture.resume(self.timer.origin_ms(now), now),
            _ => {}
        }
        self.set_phase(from);
        Ok(())
    }

    /// End Listening now. Only for games that allow manual submission.
    pub fn submit(&mut self) -> Result<()> {
        if self.phase != Phase::Listening || !self.config.allow_manual_submit {
            return Err(self.invalid("submit"));
        }
        self.collect_captures();
        self.finish_listening(ListenExit::Submitted);
        Ok(())
    }

    /// Result → Countdown for the next round, or Completed after the last one.
    ///
    /// If the next timeline cannot be built the engine stays in Result.
    pub fn advance(&mut self) -> Result<Phase> {
        if self.phase != Phase::Result {
            return Err(self.invalid("advance"));
        }
        if self.rounds_completed >= self.total_rounds() {
            self.round = None;
            self.set_phase(Phase::Completed);
        } else {
            self.begin_round()?;
        }
        Ok(self.phase)
    }

    /// Back out to Idle, discarding the live round. Completed rounds stay recorded.
    pub fn cancel(&mut self) -> Result<()> {
        if self.phase == Phase::Completed {
            return Err(self.invalid("cancel"));
        }
        if self.phase == Phase::Idle {
            return Ok(());
        }
        self.capture.stop();
        if self.playback_active {
            self.playback.stop();
            self.playback_active = false;
        }
        self.timer.cancel();
        self.paused_from = None;
        self.degraded = false;
        if let Some(round) = self.round.take() {
            info!("Round {} cancelled", round.round_index + 1);
        }
        self.set_phase(Phase::Idle);
        Ok(())
    }

    /// Close the session and obtain the reward. Valid from Idle, Result or Completed.
    ///
    /// The engine ends in Completed and the session cannot be finished again.
    pub fn finish_session(&mut self) -> Result<SessionOutcome> {
        if self.session_finished || !matches!(self.phase, Phase::Idle | Phase::Result | Phase::Completed) {
            return Err(self.invalid("finish the session"));
        }
        self.ensure_session();
        let Some(session) = self.session.take() else {
            return Err(self.invalid("finish the session"));
        };

        let outcome = session.finish();
        self.session_finished = true;
        self.round = None;
        if self.phase != Phase::Completed {
            self.set_phase(Phase::Completed);
        }
        self.bus
            .emit(EngineEvent::SessionFinished(Box::new(outcome.clone())));
        Ok(outcome)
    }

    fn tick_countdown(&mut self, now: u64) {
        let step_ms = self.config.countdown_step_ms.max(1);
        let elapsed = self.timer.elapsed_ms(now);
        while self.countdown_announced < self.config.countdown_steps
            && elapsed >= self.countdown_announced as u64 * step_ms
        {
            self.bus.emit(EngineEvent::CountdownTick {
                remaining: self.config.countdown_steps - self.countdown_announced,
            });
            self.countdown_announced += 1;
        }

        if self.timer.is_expired(now) {
            self.enter_playing(now);
        }
    }

    fn tick_playing(&mut self, now: u64) {
        let finished = self.playback_active && self.playback.is_finished();
        if finished || self.timer.is_expired(now) {
            if self.playback_active {
                self.playback.stop();
                self.playback_active = false;
            }
            self.enter_listening(now);
        }
    }

    fn tick_listening(&mut self, now: u64) {
        self.collect_captures();

        let all_captured = self.round.as_ref().is_some_and(|r| r.all_captured());
        if all_captured {
            self.finish_listening(ListenExit::AllCaptured);
        } else if self.timer.is_expired(now) {
            self.finish_listening(ListenExit::Deadline);
        }
    }

    fn begin_round(&mut self) -> Result<()> {
        let timeline = self.builder.next_round()?;
        self.ensure_session();

        info!(
            "Round {}/{} using {} ({} events)",
            self.rounds_completed + 1,
            self.total_rounds(),
            timeline.source,
            timeline.len()
        );
        self.round = Some(RoundState::new(self.rounds_completed, timeline));
        self.enter_countdown();
        Ok(())
    }

    fn enter_countdown(&mut self) {
        self.degraded = false;
        self.last_exit = None;
        self.countdown_announced = 0;
        self.timer.start(self.clock.now_ms(), self.config.countdown_ms());
        self.set_phase(Phase::Countdown);
        // Announce the first step immediately
        self.tick_countdown(self.clock.now_ms());
    }

    fn enter_playing(&mut self, now: u64) {
        let last_offset = self
            .round
            .as_ref()
            .map(|r| r.timeline.last_offset_ms())
            .unwrap_or(0);
        self.timer
            .start(now, last_offset + self.config.trailing_margin_ms);
        self.set_phase(Phase::Playing);
        self.start_playback(0);
    }

    fn start_playback(&mut self, from_ms: u64) {
        let Some(round) = &self.round else {
            return;
        };
        match self.playback.play(&round.timeline.events, from_ms) {
            Ok(()) => self.playback_active = true,
            Err(e) => {
                // The reference is optional for scoring; keep the phase timer running
                warn!("Playback failed, continuing without reference audio: {}", e);
                self.playback_active = false;
            }
        }
    }

    fn enter_listening(&mut self, now: u64) {
        let last_offset = self
            .round
            .as_ref()
            .map(|r| r.timeline.last_offset_ms())
            .unwrap_or(0);
        let mut deadline = last_offset + self.config.timeout_margin_ms;
        if let Some(limit) = self.builder.level().time_limit_ms() {
            deadline = deadline.min(limit);
        }

        self.set_phase(Phase::Listening);
        match self.capture.start_capture(now) {
            Ok(()) => {
                debug!("Listening for {} ms", deadline);
                self.timer.start(now, deadline);
            }
            Err(e) => {
                warn!("Capture unavailable, scoring round without input: {}", e);
                self.degraded = true;
                self.bus.emit(EngineEvent::Degraded {
                    reason: e.to_string(),
                });
                self.finish_listening(ListenExit::Degraded);
            }
        }
    }

    fn collect_captures(&mut self) {
        let events = self.capture.drain();
        if events.is_empty() {
            return;
        }
        let Some(round) = self.round.as_mut() else {
            return;
        };
        for event in events {
            debug!("Captured {:?} at {} ms", event.value, event.timestamp_ms);
            round.captured.push(event);
            self.bus.emit(EngineEvent::Captured(event));
        }
    }

    /// Every Listening exit funnels through here.
    fn finish_listening(&mut self, exit: ListenExit) {
        self.capture.stop();
        self.timer.cancel();
        self.last_exit = Some(exit);
        self.set_phase(Phase::Evaluating);

        let Some(round) = self.round.as_mut() else {
            return;
        };
        let profile = self.builder.profile();
        let result = if self.degraded {
            RoundResult::degraded(round.round_index, &round.timeline, profile)
        } else {
            RoundResult::evaluate(round.round_index, &round.timeline, &round.captured, profile)
        };

        round.matches = result.events.iter().map(|f| f.result).collect();
        round.combo = result.combo;
        round.score = result.score;
        self.rounds_completed += 1;

        info!(
            "Round {} evaluated ({:?}): {} perfect, {} good, {} miss, {} extra, score {}{}",
            result.round_index + 1,
            exit,
            result.judge.perfect,
            result.judge.good,
            result.judge.miss,
            result.judge.extra,
            result.score,
            if result.is_success { ", passed" } else { "" }
        );

        if let Some(session) = self.session.as_mut() {
            session.record_round(&result);
        }
        self.bus.emit(EngineEvent::RoundEvaluated {
            exit,
            result: Box::new(result.clone()),
        });
        self.last_result = Some(result);
        self.set_phase(Phase::Result);
    }

    fn restart_round(&mut self, reason: &str) {
        info!("Restarting round: {}", reason);
        self.capture.stop();
        if self.playback_active {
            self.playback.stop();
            self.playback_active = false;
        }
        if let Some(round) = self.round.as_mut() {
            round.reset_progress();
        }
        self.enter_countdown();
    }

    fn ensure_session(&mut self) {
        if self.session.is_some() {
            return;
        }
        let binding = self
            .binding
            .take()
            .unwrap_or_else(|| SessionBinding::offline("local"));
        let level = self.builder.level();
        self.session = Some(SessionAggregator::begin(
            binding.api,
            self.config.rewards,
            &binding.user_id,
            &level.game_id,
            &level.level_id,
        ));
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.phase;
        if from == to {
            return;
        }
        debug!("Phase {} -> {}", from, to);
        self.phase = to;
        if let Some(round) = self.round.as_mut() {
            round.phase = to;
        }
        self.bus.emit(EngineEvent::PhaseChanged { from, to });
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            from: self.phase,
            action,
        }
    }
}

impl Drop for RoundEngine {
    fn drop(&mut self) {
        self.capture.stop();
        if self.playback_active {
            self.playback.stop();
        }
    }
}
