//! Three-channel light animator.
//!
//! Renders exactly one animation program at a time over the three light
//! channels.  Programs are driven purely by [`TimerQueue`] entries; the
//! animator never sleeps or blocks.
//!
//! ## Ownership model
//!
//! Every [`run`](LightAnimator::run) starts a new *generation*.  The timers
//! armed by that generation are tracked in a small cancel set and released
//! as a unit by the next `run` or [`stop_all`](LightAnimator::stop_all).
//! Timer events carry their generation, so a frame that was already popped
//! from the queue when the animation was replaced is recognised as stale and
//! dropped.
//!
//! ## Programs
//!
//! | Program          | Shape                                   | Frame   | Ends                 |
//! |------------------|-----------------------------------------|---------|----------------------|
//! | `Blink`          | square wave on a channel set            | 500 ms  | after `times` cycles |
//! | `SlowBlink`      | triangle ramp, all channels in lock-step| 50 ms   | after `times` ramps  |
//! | `Runner`         | 3 → 2 → 1 chase, period 4 × unit        | unit    | never                |
//! | `ProgressBar`    | static three-segment bar                | —       | never                |
//! | `RunProgressBar` | bar filling over `duration`             | 50 ms   | chains into `Blink`  |

use heapless::Vec;
use log::{debug, error};

use crate::timer::{TimerId, TimerQueue};

use super::coordinator::TimerEvent;
use super::ports::{ActuatorPort, Channel, Line};

/// Drive level of a toggled-on channel and of a full progress-bar segment.
pub const ON_LEVEL: f32 = 0.5;

const BLINK_HALF_PERIOD_MS: u64 = 500;
const SLOW_BLINK_FRAME_MS: u64 = 50;
/// Frames per half triangle; the peak value is `SLOW_BLINK_RANGE / 100`.
const SLOW_BLINK_RANGE: u32 = 20;
const PROGRESS_FRAME_MS: u64 = 50;
const RUNNER_DEFAULT_UNIT_MS: u64 = 50;
/// Width of one progress-bar segment, in percent.
const THIRD: u32 = 33;

/// Runner holds three periodic toggles and two start delays.
const MAX_ANIMATION_TIMERS: usize = 6;

// ───────────────────────────────────────────────────────────────
// Channel set
// ───────────────────────────────────────────────────────────────

/// A subset of the three light channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelSet(u8);

impl ChannelSet {
    pub const fn all() -> Self {
        Self(0b111)
    }

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn only(channel: Channel) -> Self {
        Self(1 << channel.index())
    }

    pub const fn with(self, channel: Channel) -> Self {
        Self(self.0 | (1 << channel.index()))
    }

    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & (1 << channel.index()) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

// ───────────────────────────────────────────────────────────────
// Animation catalog
// ───────────────────────────────────────────────────────────────

/// The fixed catalog of animation programs with their parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Animation {
    /// Square-wave toggling of `channels` for `times` full on/off cycles.
    /// Zero `times` means 1; an empty set means all channels.
    Blink { times: u16, channels: ChannelSet },
    /// Triangular brightness ramp on all channels for `times` periods.
    /// Zero means 1.
    SlowBlink { times: u16 },
    /// Endless chase effect.  Zero `unit_ms` means 50 ms.
    Runner { unit_ms: u64 },
    /// Static bar showing `percentage` (clamped to 100).
    ProgressBar { percentage: u8 },
    /// Bar filling from 0 to 100 % over `duration_ms`, then a completion blink.
    RunProgressBar { duration_ms: u64 },
}

impl Animation {
    /// Blink every channel `times` times.
    pub const fn blink(times: u16) -> Self {
        Self::Blink {
            times,
            channels: ChannelSet::all(),
        }
    }
}

/// Identifies which step of the live program a timer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightStep {
    /// Advance the program's frame (blink, slow blink, progress).
    Frame,
    /// Flip one runner channel.
    Toggle(Channel),
    /// A runner start delay elapsed: begin toggling this channel.
    StartRunner(Channel),
}

/// Timer payload owned by the animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightTick {
    generation: u32,
    step: LightStep,
}

// ───────────────────────────────────────────────────────────────
// Progress bar render
// ───────────────────────────────────────────────────────────────

/// Per-channel coefficients (fraction of full) for a progress percentage.
///
/// Each fully covered third lights its channel at 1.0; the first partially
/// covered third carries the remainder truncated to two decimals; later
/// channels stay off.  The third channel is full once `percentage / 33 > 2`.
pub fn progress_levels(percentage: u32) -> [f32; 3] {
    let full = percentage / THIRD;
    let partial = ((percentage % THIRD) * 100 / THIRD) as f32 / 100.0;

    let mut levels = [0.0; 3];
    for (idx, level) in levels.iter_mut().enumerate() {
        if full > idx as u32 {
            *level = 1.0;
        }
    }
    if full <= 2 {
        levels[full as usize] = partial;
    }
    levels
}

// ───────────────────────────────────────────────────────────────
// Animator
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LightChannel {
    on: bool,
    level: f32,
}

/// Explicit per-program state, advanced one frame per timer event.
#[derive(Debug, Clone, Copy)]
enum Program {
    Blink { remaining: u32, channels: ChannelSet },
    SlowBlink { phase: u32, falling: bool, iterations: u32 },
    Runner { period_ms: u64 },
    Static,
    Progress { started_ms: u64, duration_ms: u64 },
}

struct ActiveAnimation {
    generation: u32,
    timers: Vec<TimerId, MAX_ANIMATION_TIMERS>,
    program: Program,
}

impl ActiveAnimation {
    fn arm_periodic(
        &mut self,
        timers: &mut TimerQueue<TimerEvent>,
        now_ms: u64,
        period_ms: u64,
        step: LightStep,
    ) {
        let tick = LightTick {
            generation: self.generation,
            step,
        };
        match timers.schedule_periodic(now_ms, period_ms, TimerEvent::Light(tick)) {
            Ok(id) => self.track(id, timers),
            Err(e) => error!("Lights: cannot arm {:?} timer: {}", step, e),
        }
    }

    fn arm_once(&mut self, timers: &mut TimerQueue<TimerEvent>, now_ms: u64, delay_ms: u64, step: LightStep) {
        let tick = LightTick {
            generation: self.generation,
            step,
        };
        match timers.schedule_once(now_ms, delay_ms, TimerEvent::Light(tick)) {
            Ok(id) => self.track(id, timers),
            Err(e) => error!("Lights: cannot arm {:?} timer: {}", step, e),
        }
    }

    fn track(&mut self, id: TimerId, timers: &mut TimerQueue<TimerEvent>) {
        if self.timers.push(id).is_err() {
            // An untracked timer would outlive the animation.
            timers.cancel(id);
            error!("Lights: cancel set full, timer dropped");
        }
    }
}

/// Owner of the three light channels and the single live animation.
pub struct LightAnimator {
    channels: [LightChannel; 3],
    generation: u32,
    active: Option<ActiveAnimation>,
    completion_blinks: u16,
}

impl LightAnimator {
    /// `completion_blinks` is the blink count `RunProgressBar` chains into.
    pub fn new(completion_blinks: u16) -> Self {
        Self {
            channels: [LightChannel::default(); 3],
            generation: 0,
            active: None,
            completion_blinks,
        }
    }

    // ── Program control ───────────────────────────────────────

    /// Replace whatever is running with `animation`.
    ///
    /// Always stop-then-start: the previous program's timers are cancelled
    /// and every channel is turned off before the new program begins.
    pub fn run(
        &mut self,
        animation: Animation,
        now_ms: u64,
        timers: &mut TimerQueue<TimerEvent>,
        hw: &mut impl ActuatorPort,
    ) {
        self.stop_all(timers, hw);
        self.generation = self.generation.wrapping_add(1);

        let mut active = ActiveAnimation {
            generation: self.generation,
            timers: Vec::new(),
            program: Program::Static,
        };

        match animation {
            Animation::Blink { times, channels } => {
                let times = u32::from(times.max(1));
                let channels = if channels.is_empty() { ChannelSet::all() } else { channels };
                active.program = Program::Blink {
                    remaining: times * 2,
                    channels,
                };
                active.arm_periodic(timers, now_ms, BLINK_HALF_PERIOD_MS, LightStep::Frame);
            }
            Animation::SlowBlink { times } => {
                active.program = Program::SlowBlink {
                    phase: 0,
                    falling: false,
                    iterations: u32::from(times.max(1)) * SLOW_BLINK_RANGE * 2,
                };
                active.arm_periodic(timers, now_ms, SLOW_BLINK_FRAME_MS, LightStep::Frame);
            }
            Animation::Runner { unit_ms } => {
                let unit = if unit_ms == 0 { RUNNER_DEFAULT_UNIT_MS } else { unit_ms };
                let period_ms = unit * 4;
                active.program = Program::Runner { period_ms };
                active.arm_periodic(timers, now_ms, period_ms, LightStep::Toggle(Channel::Three));
                active.arm_once(timers, now_ms, unit, LightStep::StartRunner(Channel::Two));
                active.arm_once(timers, now_ms, unit * 2, LightStep::StartRunner(Channel::One));
            }
            Animation::ProgressBar { percentage } => {
                self.progress_bar(u32::from(percentage.min(100)), hw);
            }
            Animation::RunProgressBar { duration_ms } => {
                active.program = Program::Progress {
                    started_ms: now_ms,
                    duration_ms: duration_ms.max(1),
                };
                active.arm_periodic(timers, now_ms, PROGRESS_FRAME_MS, LightStep::Frame);
            }
        }

        debug!("Lights: generation {} running {:?}", self.generation, animation);
        self.active = Some(active);
    }

    /// Cancel every timer of the live animation and turn all channels off.
    /// Idempotent.
    pub fn stop_all(&mut self, timers: &mut TimerQueue<TimerEvent>, hw: &mut impl ActuatorPort) {
        if let Some(active) = self.active.take() {
            for id in active.timers {
                timers.cancel(id);
            }
            self.generation = self.generation.wrapping_add(1);
        }
        self.toggle_all(Some(false), hw);
    }

    /// Advance the live program for a fired timer.
    ///
    /// Returns the animation the program chained into, if any.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        tick: LightTick,
        at_ms: u64,
        timers: &mut TimerQueue<TimerEvent>,
        hw: &mut impl ActuatorPort,
    ) -> Option<Animation> {
        let Some(active) = self.active.as_mut() else {
            return None;
        };
        if active.generation != tick.generation {
            debug!("Lights: dropping stale frame of generation {}", tick.generation);
            return None;
        }

        match tick.step {
            LightStep::Toggle(channel) => {
                self.toggle(channel, None, hw);
                None
            }
            LightStep::StartRunner(channel) => {
                active.timers.retain(|t| *t != id);
                if let Program::Runner { period_ms } = active.program {
                    active.arm_periodic(timers, at_ms, period_ms, LightStep::Toggle(channel));
                }
                None
            }
            LightStep::Frame => self.advance_frame(at_ms, timers, hw),
        }
    }

    fn advance_frame(
        &mut self,
        at_ms: u64,
        timers: &mut TimerQueue<TimerEvent>,
        hw: &mut impl ActuatorPort,
    ) -> Option<Animation> {
        let active = self.active.as_mut()?;
        match &mut active.program {
            Program::Blink { remaining, channels } => {
                if *remaining == 0 {
                    self.stop_all(timers, hw);
                    return None;
                }
                *remaining -= 1;
                let channels = *channels;
                self.toggle_set(channels, None, hw);
                None
            }
            Program::SlowBlink {
                phase,
                falling,
                iterations,
            } => {
                *phase += 1;
                let remainder = *phase % SLOW_BLINK_RANGE;
                if remainder == 0 {
                    *falling = !*falling;
                }
                let value = if *falling { SLOW_BLINK_RANGE - remainder } else { remainder };
                let finished = *phase == *iterations;

                self.pulse_all(value as f32 / 100.0, hw);
                if finished {
                    self.stop_all(timers, hw);
                }
                None
            }
            Program::Progress {
                started_ms,
                duration_ms,
            } => {
                let elapsed = at_ms.saturating_sub(*started_ms);
                let duration = *duration_ms;
                if elapsed >= duration {
                    self.progress_bar(100, hw);
                    let done = Animation::blink(self.completion_blinks);
                    self.run(done, at_ms, timers, hw);
                    return Some(done);
                }
                self.progress_bar((elapsed * 100 / duration) as u32, hw);
                None
            }
            Program::Runner { .. } | Program::Static => None,
        }
    }

    // ── Channel primitives ────────────────────────────────────

    /// Drive one channel at `level` (clamped to `[0, 1]`).  The channel is
    /// on iff the level is non-zero.
    pub fn pulse(&mut self, channel: Channel, level: f32, hw: &mut impl ActuatorPort) {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        let state = &mut self.channels[channel.index()];
        state.on = level != 0.0;
        state.level = level;
        hw.write_analog(Line::Light(channel), level);
    }

    /// Drive every channel in `channels` at `level`.
    pub fn pulse_set(&mut self, channels: ChannelSet, level: f32, hw: &mut impl ActuatorPort) {
        for channel in channels.iter() {
            self.pulse(channel, level, hw);
        }
    }

    pub fn pulse_all(&mut self, level: f32, hw: &mut impl ActuatorPort) {
        self.pulse_set(ChannelSet::all(), level, hw);
    }

    /// Set a channel on/off, or flip it when `value` is `None`.  "On" is
    /// always [`ON_LEVEL`].
    pub fn toggle(&mut self, channel: Channel, value: Option<bool>, hw: &mut impl ActuatorPort) {
        let state = &mut self.channels[channel.index()];
        state.on = value.unwrap_or(!state.on);
        state.level = if state.on { ON_LEVEL } else { 0.0 };
        hw.write_analog(Line::Light(channel), state.level);
    }

    /// [`toggle`](Self::toggle) each channel in `channels`.
    pub fn toggle_set(&mut self, channels: ChannelSet, value: Option<bool>, hw: &mut impl ActuatorPort) {
        for channel in channels.iter() {
            self.toggle(channel, value, hw);
        }
    }

    pub fn toggle_all(&mut self, value: Option<bool>, hw: &mut impl ActuatorPort) {
        self.toggle_set(ChannelSet::all(), value, hw);
    }

    /// Stateless render of a progress percentage onto the three channels.
    pub fn progress_bar(&mut self, percentage: u32, hw: &mut impl ActuatorPort) {
        let levels = progress_levels(percentage);
        for channel in Channel::ALL {
            self.pulse(channel, levels[channel.index()] * ON_LEVEL, hw);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_on(&self, channel: Channel) -> bool {
        self.channels[channel.index()].on
    }

    pub fn level(&self, channel: Channel) -> f32 {
        self.channels[channel.index()].level
    }

    /// Timers currently owned by the live animation.
    pub fn owned_timers(&self) -> &[TimerId] {
        match &self.active {
            Some(active) => active.timers.as_slice(),
            None => &[],
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
