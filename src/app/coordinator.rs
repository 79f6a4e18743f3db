//! Coordinator: the hexagonal core of the watering controller.
//!
//! [`Coordinator`] owns every domain component and the single timer queue
//! they share.  All I/O flows through a [`Platform`] value injected at each
//! call site, so the whole state machine runs unchanged against mock
//! adapters and simulated time.
//!
//! ```text
//!   button edges ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!   commands     ──▶ │         Coordinator          │
//!   poll(now)    ──▶ │ Pump · Lights · Schedule ·   │ ──▶ ActuatorPort
//!                    │ TimeKeeper · TimerQueue      │ ◀─▶ StoragePort / ClockPort
//!                    └─────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//!   new ──start()──▶ Booting ──settle delay──▶ Armed
//!                     (lights at boot level,    (time + schedule restored,
//!                      button ignored)           idle animation, 30 s tick)
//! ```
//!
//! ## Timer dispatch
//!
//! [`poll`](Coordinator::poll) drains every due timer in deadline order and
//! handles each one *at its deadline*: follow-up timers are armed relative
//! to the deadline, not to the (possibly later) poll time, so a slow main
//! loop delays work without skewing the schedule.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::config::WateringConfig;
use crate::timer::{Fired, TimerId, TimerQueue};

use super::button::{Press, PressWindow};
use super::commands::{AppCommand, Dose};
use super::events::{AppEvent, StopReason};
use super::lights::{Animation, ChannelSet, LightAnimator, LightTick};
use super::ports::{Channel, Platform};
use super::pump::PumpCycle;
use super::schedule::{WATERING_KEY, WateringSchedule};
use super::timekeeper::{CURRENT_TIME_KEY, TimeKeeper};

/// Payload of every timer in the coordinator's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The running watering cycle reached its dose duration.
    PumpAutoStop,
    /// A frame of the live light animation.
    Light(LightTick),
    /// Backstop completion blink of a watering cycle.
    CompletionBlink,
    /// The periodic decision tick.
    Tick,
    /// The boot settle delay elapsed.
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Booting,
    Armed,
}

pub struct Coordinator {
    config: WateringConfig,
    timers: TimerQueue<TimerEvent>,
    pump: PumpCycle,
    lights: LightAnimator,
    schedule: WateringSchedule,
    timekeeper: TimeKeeper,
    button: PressWindow,
    phase: Phase,
    completion_blink: Option<TimerId>,
    tick_timer: Option<TimerId>,
    /// Set once the ceiling refusal has been reported; cleared by a reset.
    ceiling_latched: bool,
}

impl Coordinator {
    /// Build the coordinator.  `boot_time` is the last-watered default used
    /// when no watering record has been persisted yet.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: WateringConfig, boot_time: DateTime<Utc>) -> Self {
        Self {
            timers: TimerQueue::new(),
            pump: PumpCycle::new(),
            lights: LightAnimator::new(config.completion_blink_times),
            schedule: WateringSchedule::new(boot_time, config.safety_ceiling),
            timekeeper: TimeKeeper::new(config.clock_restore_offset_secs),
            button: PressWindow::new(config.long_press_ms),
            phase: Phase::Created,
            completion_blink: None,
            tick_timer: None,
            ceiling_latched: false,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Power-on: pulse every light at the boot level and arm the settle
    /// delay.  Calling it again has no effect.
    pub fn start(&mut self, now_ms: u64, io: &mut impl Platform) {
        if self.phase != Phase::Created {
            return;
        }
        self.lights.pulse_all(self.config.boot_pulse_level, io);
        self.phase = Phase::Booting;
        io.emit(&AppEvent::Booting);
        match self
            .timers
            .schedule_once(now_ms, self.config.startup_settle_ms, TimerEvent::Settle)
        {
            Ok(_) => info!("Coordinator: booting, settle in {} ms", self.config.startup_settle_ms),
            Err(e) => {
                warn!("Coordinator: cannot arm settle timer ({}), arming now", e);
                self.arm(now_ms, io);
            }
        }
    }

    /// Run every timer due at `now_ms`.  Call from the main loop.
    pub fn poll(&mut self, now_ms: u64, io: &mut impl Platform) {
        while let Some(fired) = self.timers.pop_due(now_ms) {
            let lag = Duration::milliseconds(now_ms.saturating_sub(fired.deadline_ms) as i64);
            self.dispatch(fired, lag, io);
        }
    }

    // ── Button ────────────────────────────────────────────────

    /// Debounced press edge.  Ignored until armed.
    pub fn button_pressed(&mut self, now_ms: u64) {
        if self.phase == Phase::Armed {
            self.button.press(now_ms);
        }
    }

    /// Debounced release edge: classify the gesture and act on it.
    pub fn button_released(&mut self, now_ms: u64, io: &mut impl Platform) {
        if self.phase != Phase::Armed {
            return;
        }
        match self.button.release(now_ms) {
            Some(Press::Short { held_ms }) => {
                info!("Button: short press ({} ms)", held_ms);
                if self.pump.is_running() {
                    self.abort(io);
                } else {
                    self.start_watering(Dose::Short, now_ms, io);
                }
            }
            Some(Press::Long { held_ms }) => {
                info!("Button: long press ({} ms)", held_ms);
                self.reset_schedule(now_ms, io);
            }
            None => {}
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a programmatic command.  Returns `false` if it was refused
    /// (not armed yet, or pump already running for `StartWatering`).
    pub fn handle_command(&mut self, cmd: AppCommand, now_ms: u64, io: &mut impl Platform) -> bool {
        if self.phase != Phase::Armed {
            warn!("Coordinator: {:?} refused before arming", cmd);
            return false;
        }
        match cmd {
            AppCommand::StartWatering(dose) => {
                if self.pump.is_running() {
                    info!("Coordinator: pump already running, {:?} ignored", dose);
                    return false;
                }
                self.start_watering(dose, now_ms, io)
            }
            AppCommand::Abort => {
                self.abort(io);
                true
            }
            AppCommand::ResetSchedule => {
                self.reset_schedule(now_ms, io);
                true
            }
            AppCommand::RunAnimation(animation) => {
                self.run_animation(animation, now_ms, io);
                true
            }
            AppCommand::StopAnimations => {
                self.lights.stop_all(&mut self.timers, io);
                true
            }
            AppCommand::SetTime(time) => match self.timekeeper.set_global_time(time, io) {
                Ok(()) => {
                    io.emit(&AppEvent::ClockSet(time));
                    true
                }
                Err(e) => {
                    warn!("Coordinator: set time failed: {}", e);
                    false
                }
            },
        }
    }

    // ── Watering ──────────────────────────────────────────────

    /// Run the pump for `duration_ms` with a progress bar, plus a backstop
    /// completion blink at the end of the cycle.  Returns `false` if the
    /// pump could not be started.
    pub fn pump_routine(&mut self, duration_ms: u64, now_ms: u64, io: &mut impl Platform) -> bool {
        if let Err(e) = self.pump.start(duration_ms, now_ms, &mut self.timers, io) {
            warn!("Coordinator: watering cycle not started: {}", e);
            return false;
        }
        self.run_animation(Animation::RunProgressBar { duration_ms }, now_ms, io);

        self.cancel_completion_blink();
        match self
            .timers
            .schedule_once(now_ms, duration_ms, TimerEvent::CompletionBlink)
        {
            Ok(id) => self.completion_blink = Some(id),
            Err(e) => warn!("Coordinator: no backstop blink: {}", e),
        }
        true
    }

    fn start_watering(&mut self, dose: Dose, now_ms: u64, io: &mut impl Platform) -> bool {
        let duration_ms = match dose {
            Dose::Short => self.config.short_dose_ms,
            Dose::Long => self.config.long_dose_ms,
        };
        if !self.pump_routine(duration_ms, now_ms, io) {
            return false;
        }
        io.emit(&AppEvent::WateringStarted { dose, duration_ms });
        true
    }

    /// Stop the pump, every animation and the pending backstop blink.
    fn abort(&mut self, io: &mut impl Platform) {
        let was_running = self.pump.stop(&mut self.timers, io);
        self.lights.stop_all(&mut self.timers, io);
        self.cancel_completion_blink();
        if was_running {
            io.emit(&AppEvent::PumpStopped(StopReason::Aborted));
        }
    }

    fn reset_schedule(&mut self, now_ms: u64, io: &mut impl Platform) {
        let wall = io.now();
        if let Err(error) = self.schedule.reset(wall, io) {
            io.emit(&AppEvent::PersistFailed {
                key: WATERING_KEY,
                error,
            });
        }
        self.ceiling_latched = false;
        io.emit(&AppEvent::ScheduleReset);
        self.run_animation(Animation::blink(self.config.acknowledge_blink_times), now_ms, io);
    }

    fn cancel_completion_blink(&mut self) {
        if let Some(id) = self.completion_blink.take() {
            self.timers.cancel(id);
        }
    }

    fn run_animation(&mut self, animation: Animation, now_ms: u64, io: &mut impl Platform) {
        self.lights.run(animation, now_ms, &mut self.timers, io);
        io.emit(&AppEvent::AnimationStarted(animation));
    }

    // ── Timer handlers ────────────────────────────────────────

    fn dispatch(&mut self, fired: Fired<TimerEvent>, lag: Duration, io: &mut impl Platform) {
        let at_ms = fired.deadline_ms;
        match fired.event {
            TimerEvent::PumpAutoStop => {
                if self.pump.on_auto_stop(fired.id, io) {
                    io.emit(&AppEvent::PumpStopped(StopReason::Completed));
                }
            }
            TimerEvent::Light(tick) => {
                if let Some(chained) = self.lights.on_timer(fired.id, tick, at_ms, &mut self.timers, io) {
                    // The progress bar chained on its own; the backstop is moot.
                    self.cancel_completion_blink();
                    io.emit(&AppEvent::AnimationStarted(chained));
                }
            }
            TimerEvent::CompletionBlink => {
                if self.completion_blink == Some(fired.id) {
                    self.completion_blink = None;
                    self.run_animation(Animation::blink(self.config.completion_blink_times), at_ms, io);
                }
            }
            TimerEvent::Tick => self.on_tick(at_ms, lag, io),
            TimerEvent::Settle => self.arm(at_ms, io),
        }
    }

    /// End of the settle delay: restore persisted state and go live.
    fn arm(&mut self, at_ms: u64, io: &mut impl Platform) {
        if self.phase == Phase::Armed {
            return;
        }
        if let Some(restored) = self.timekeeper.restore(io) {
            io.emit(&AppEvent::ClockSet(restored));
        }
        self.schedule.load(&*io);

        self.phase = Phase::Armed;
        let idle = Animation::SlowBlink {
            times: self.config.idle_slow_blink_cycles,
        };
        self.run_animation(idle, at_ms, io);

        match self
            .timers
            .schedule_periodic(at_ms, self.config.tick_interval_ms, TimerEvent::Tick)
        {
            Ok(id) => self.tick_timer = Some(id),
            Err(e) => warn!("Coordinator: cannot arm periodic tick: {}", e),
        }

        let counter = self.schedule.counter();
        io.emit(&AppEvent::Armed { counter });
        info!("Coordinator: armed, counter={}", counter);
    }

    /// The periodic decision tick: heartbeat, time snapshot, watering.
    fn on_tick(&mut self, at_ms: u64, lag: Duration, io: &mut impl Platform) {
        if !self.lights.is_active() {
            let channel = Channel::from_index((io.next_u32() % 3) as usize).unwrap_or(Channel::One);
            let heartbeat = Animation::Blink {
                times: 1,
                channels: ChannelSet::only(channel),
            };
            self.lights.run(heartbeat, at_ms, &mut self.timers, io);
            io.emit(&AppEvent::Heartbeat(channel));
        }

        let wall = io.now() - lag;
        if let Err(error) = self.timekeeper.snapshot(wall, io) {
            io.emit(&AppEvent::PersistFailed {
                key: CURRENT_TIME_KEY,
                error,
            });
        }

        if self.pump.is_running() {
            return;
        }
        if self.schedule.due_to_water(self.config.watering_period_ms, wall) {
            if !self.start_watering(Dose::Long, at_ms, io) {
                return;
            }
            match self.schedule.record_watering(wall, io) {
                Ok(counter) => io.emit(&AppEvent::WateringRecorded { counter, at: wall }),
                Err(error) => io.emit(&AppEvent::PersistFailed {
                    key: WATERING_KEY,
                    error,
                }),
            }
        } else if self.schedule.ceiling_exceeded() && !self.ceiling_latched {
            self.ceiling_latched = true;
            let counter = self.schedule.counter();
            warn!("Coordinator: safety ceiling reached (counter={}), watering refused", counter);
            io.emit(&AppEvent::SafetyCeilingReached { counter });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_armed(&self) -> bool {
        self.phase == Phase::Armed
    }

    pub fn is_pump_running(&self) -> bool {
        self.pump.is_running()
    }

    pub fn is_animating(&self) -> bool {
        self.lights.is_active()
    }

    /// Whether automatic watering is currently refused by the safety ceiling.
    pub fn safety_alarm(&self) -> bool {
        self.schedule.ceiling_exceeded()
    }

    pub fn completion_blink_pending(&self) -> bool {
        self.completion_blink
            .is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn lights(&self) -> &LightAnimator {
        &self.lights
    }

    pub fn schedule(&self) -> &WateringSchedule {
        &self.schedule
    }

    pub fn config(&self) -> &WateringConfig {
        &self.config
    }

    pub fn is_ticking(&self) -> bool {
        self.tick_timer.is_some_and(|id| self.timers.is_pending(id))
    }

    /// Monotonic time of the earliest pending timer, so the main loop can
    /// sleep until then.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Number of armed timers across all components.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}
