//! Simulate command: replay a scripted performance through the real engine.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use beatcoach_core::clock::ManualClock;
use beatcoach_core::device::mock::{CaptureFeed, RecordingPlaybackDevice, ScriptedCaptureDevice};
use beatcoach_core::export::{format_round_console, format_round_events, format_session_console, to_json};
use beatcoach_core::session::SessionApi;
use beatcoach_core::{Clock, Phase, RoundEngine, RoundResult, SelectionSeed, SessionBinding};
use tracing::{debug, warn};

use super::{load_engine_config, load_level};
use crate::performance::{PauseScript, Performance, RoundScript, ScriptedInput};

/// Simulated time after which a phase is considered stuck.
const PHASE_LIMIT_MS: u64 = 10 * 60 * 1000;

pub struct SimulateOptions<'a> {
    pub level: &'a Path,
    pub performance: &'a Path,
    pub config: Option<&'a Path>,
    pub seed: Option<u64>,
    pub show_events: bool,
    pub json: bool,
    pub api_endpoint: Option<&'a str>,
    pub api_token: Option<&'a str>,
}

pub fn run(options: SimulateOptions<'_>) -> Result<()> {
    let config = load_engine_config(options.config)?;
    let level = load_level(options.level)?;
    let performance = Performance::load(options.performance)?;

    let (device, feed) = if performance.device_unavailable {
        ScriptedCaptureDevice::unavailable("scripted")
    } else {
        ScriptedCaptureDevice::new("scripted")
    };
    let clock = Arc::new(ManualClock::new(0));
    let binding = match remote_api(options.api_endpoint, options.api_token) {
        Some(api) => SessionBinding::new(&performance.user_id, api),
        None => SessionBinding::offline(&performance.user_id),
    };

    let mut engine = RoundEngine::with_device(
        config,
        level,
        SelectionSeed::Fixed(options.seed.unwrap_or(0)),
        Box::new(device),
        Box::new(RecordingPlaybackDevice::new()),
        clock.clone(),
    )?
    .with_session(binding);

    engine.start_round()?;
    let mut index = 0;
    loop {
        let result = play_round(&mut engine, &clock, &feed, &performance.round(index))?;
        if !options.json {
            println!("{}", format_round_console(&result));
            if options.show_events {
                print!("{}", format_round_events(&result));
            }
        }
        index += 1;
        if engine.advance()? == Phase::Completed {
            break;
        }
    }

    let outcome = engine.finish_session()?;
    if options.json {
        println!("{}", to_json(&outcome)?);
    } else {
        println!("{}", format_session_console(&outcome));
    }
    Ok(())
}

/// Tick until `done` holds, failing if simulated time runs away.
fn tick_until(engine: &mut RoundEngine, clock: &ManualClock, done: impl Fn(Phase) -> bool) -> Result<Phase> {
    let step = engine.tick_interval_ms();
    let mut waited = 0;
    loop {
        let phase = engine.tick();
        if done(phase) {
            return Ok(phase);
        }
        if waited >= PHASE_LIMIT_MS {
            bail!("Engine stuck in {} phase", phase);
        }
        clock.advance(step);
        waited += step;
    }
}

fn play_round(
    engine: &mut RoundEngine,
    clock: &ManualClock,
    feed: &CaptureFeed,
    script: &RoundScript,
) -> Result<RoundResult> {
    // A resume fallback sends the round back through Countdown; the pause is not replayed
    let mut pause = script.pause;
    while tick_until(engine, clock, |p| matches!(p, Phase::Listening | Phase::Result))? == Phase::Listening {
        listen(engine, clock, feed, script, &mut pause)?;
    }

    match engine.last_result() {
        Some(result) => Ok(result.clone()),
        None => bail!("Round ended without a result"),
    }
}

fn listen(
    engine: &mut RoundEngine,
    clock: &ManualClock,
    feed: &CaptureFeed,
    script: &RoundScript,
    pause: &mut Option<PauseScript>,
) -> Result<()> {
    let step = engine.tick_interval_ms();
    let listen_start = clock.now_ms();
    let mut paused_ms = 0;
    let mut submit_at = script.submit_at_ms;
    let mut pending = script.timeline();

    loop {
        if engine.tick() != Phase::Listening {
            return Ok(());
        }
        let elapsed = clock.now_ms() - listen_start - paused_ms;
        if elapsed > PHASE_LIMIT_MS {
            bail!("Listening never ended");
        }

        while pending.front().is_some_and(|(at, _)| *at <= elapsed) {
            let Some((at, input)) = pending.pop_front() else {
                break;
            };
            let at_ms = listen_start + paused_ms + at;
            let delivered = match input {
                ScriptedInput::Tap => feed.tap(at_ms),
                ScriptedInput::Pitch {
                    frequency_hz,
                    confidence,
                } => feed.pitch(at_ms, frequency_hz, confidence),
            };
            if !delivered {
                debug!("Input at {} ms not delivered", at);
            }
        }

        if let Some(at) = submit_at.filter(|at| *at <= elapsed) {
            submit_at = None;
            match engine.submit() {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Submit at {} ms rejected: {}", at, e),
            }
        }

        let mut advance = step;
        if let Some(script) = *pause {
            if elapsed >= script.at_ms {
                *pause = None;
                engine.pause()?;
                clock.advance(script.duration_ms);
                paused_ms += script.duration_ms;
                engine.resume()?;
                continue;
            }
            advance = advance.min(script.at_ms - elapsed);
        }
        clock.advance(advance);
    }
}

#[cfg(feature = "api")]
fn remote_api(endpoint: Option<&str>, token: Option<&str>) -> Option<Box<dyn SessionApi>> {
    use beatcoach_core::HttpSessionApi;
    use std::time::Duration;

    match (endpoint, token) {
        (Some(endpoint), Some(token)) => Some(Box::new(HttpSessionApi::new(
            endpoint,
            token,
            Duration::from_secs(5),
        ))),
        (Some(_), None) => {
            warn!("API endpoint given without a token; rewards are computed locally");
            None
        }
        _ => None,
    }
}

#[cfg(not(feature = "api"))]
fn remote_api(endpoint: Option<&str>, _token: Option<&str>) -> Option<Box<dyn SessionApi>> {
    if endpoint.is_some() {
        warn!("Built without the `api` feature; rewards are computed locally");
    }
    None
}
