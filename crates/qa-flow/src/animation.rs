use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};
use crate::preset::{AnimationPreset, ChannelBundle, Transform};

/// Navigation direction; decides which side directional presets use.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPhase {
    #[default]
    Idle,
    Exiting,
    Entering,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationConfig {
    pub enter: AnimationPreset,
    pub exit: AnimationPreset,
    pub enter_duration: Duration,
    pub exit_duration: Duration,
    /// Travel distance for directional presets.
    pub offset: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enter: AnimationPreset::Fade,
            exit: AnimationPreset::Fade,
            enter_duration: Duration::from_millis(220),
            exit_duration: Duration::from_millis(160),
            offset: 24.0,
        }
    }
}

impl AnimationConfig {
    /// One preset for both phases.
    pub fn shared(preset: AnimationPreset) -> Self {
        Self::default().enter(preset).exit(preset)
    }

    pub fn enter(mut self, preset: AnimationPreset) -> Self {
        self.enter = preset;
        self
    }

    pub fn exit(mut self, preset: AnimationPreset) -> Self {
        self.exit = preset;
        self
    }

    pub fn enter_duration(mut self, duration: Duration) -> Self {
        self.enter_duration = duration;
        self
    }

    pub fn exit_duration(mut self, duration: Duration) -> Self {
        self.exit_duration = duration;
        self
    }

    pub fn offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Zero-length phases; transitions still pass through every phase.
    pub fn instant(self) -> Self {
        self.enter_duration(Duration::ZERO)
            .exit_duration(Duration::ZERO)
    }
}

#[derive(Clone, Copy, Debug)]
struct ChannelTrack {
    preset: AnimationPreset,
    from: ChannelBundle,
    to: ChannelBundle,
    started: Instant,
    duration: Duration,
}

impl ChannelTrack {
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn sample(&self, now: Instant) -> Transform {
        let bundle = self.from.lerp(&self.to, self.progress(now));
        self.preset.project(&bundle)
    }
}

/// Idle -> Exiting -> (content swap) -> Entering -> Idle.
///
/// The coordinator only tracks phases and channel values; the controller
/// awaits the returned durations and performs the content swap between
/// [`AnimationCoordinator::begin_exit`] and [`AnimationCoordinator::begin_enter`].
#[derive(Clone, Debug)]
pub struct AnimationCoordinator {
    config: AnimationConfig,
    phase: AnimationPhase,
    direction: Direction,
    track: Option<ChannelTrack>,
}

impl AnimationCoordinator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            phase: AnimationPhase::Idle,
            direction: Direction::Forward,
            track: None,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// `(enter, exit)` preset identifiers.
    pub fn preset_ids(&self) -> (&'static str, &'static str) {
        (self.config.enter.id(), self.config.exit.id())
    }

    /// Starts hiding the outgoing step and returns how long to wait before
    /// swapping content.
    pub fn begin_exit(&mut self, direction: Direction) -> FlowResult<Duration> {
        self.transition(AnimationPhase::Exiting)?;
        self.direction = direction;
        let preset = self.config.exit;
        let from = preset.resting(direction, self.config.offset);
        let to = preset.exit(&from, direction, self.config.offset);
        self.track = Some(ChannelTrack {
            preset,
            from,
            to,
            started: Instant::now(),
            duration: self.config.exit_duration,
        });
        Ok(self.config.exit_duration)
    }

    /// Starts revealing the incoming step.
    pub fn begin_enter(&mut self, direction: Direction) -> FlowResult<Duration> {
        self.transition(AnimationPhase::Entering)?;
        self.direction = direction;
        let preset = self.config.enter;
        let from = preset.initialize(direction, self.config.offset);
        let to = preset.enter(&from);
        self.track = Some(ChannelTrack {
            preset,
            from,
            to,
            started: Instant::now(),
            duration: self.config.enter_duration,
        });
        Ok(self.config.enter_duration)
    }

    /// Returns to `Idle` with the step fully visible.
    pub fn settle(&mut self) {
        self.phase = AnimationPhase::Idle;
        self.track = None;
    }

    /// Transform for the step container at `now`.
    pub fn frame(&self, now: Instant) -> Transform {
        match &self.track {
            Some(track) => track.sample(now),
            None => {
                let preset = self.config.enter;
                preset.project(&preset.resting(self.direction, self.config.offset))
            }
        }
    }

    fn transition(&mut self, next: AnimationPhase) -> FlowResult<()> {
        let allowed = matches!(
            (self.phase, next),
            (AnimationPhase::Idle, AnimationPhase::Exiting)
                | (AnimationPhase::Idle, AnimationPhase::Entering)
                | (AnimationPhase::Exiting, AnimationPhase::Entering)
        );
        if !allowed {
            return Err(FlowError::InvalidPhase {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}
