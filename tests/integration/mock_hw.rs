//! Mock board for integration tests.
//!
//! Implements every port in memory and records every actuator call and
//! emitted event, so tests can assert on the full history without real
//! GPIO/PWM registers.  Time is simulated: [`Sim`] advances the uptime and
//! polls the coordinator.

use chrono::{DateTime, Duration, TimeZone, Utc};
use plantwater::app::coordinator::Coordinator;
use plantwater::app::events::AppEvent;
use plantwater::app::ports::{
    ActuatorPort, Channel, ClockError, ClockPort, EntropyPort, EventSink, Line, StorageError, StoragePort,
};
use plantwater::config::WateringConfig;
use serde_json::Value;
use std::collections::HashMap;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Digital { line: Line, on: bool },
    Analog { line: Line, level: f32 },
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub calls: Vec<ActuatorCall>,
    pub docs: HashMap<String, Value>,
    pub fail_writes: bool,
    pub uptime_ms: u64,
    /// Wall-clock time at uptime zero.
    pub wall_base: DateTime<Utc>,
    pub clock_sets: Vec<DateTime<Utc>>,
    pub random: u32,
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            docs: HashMap::new(),
            fail_writes: false,
            uptime_ms: 0,
            wall_base: boot_wall_time(),
            clock_sets: Vec::new(),
            random: 0,
            events: Vec::new(),
        }
    }

    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Digital { line: Line::Pump, on } => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Last level written to a light channel.
    pub fn light_level(&self, channel: Channel) -> f32 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Analog { line: Line::Light(ch), level } if *ch == channel => Some(*level),
                ActuatorCall::Digital { line: Line::Light(ch), on } if *ch == channel => {
                    Some(if *on { 1.0 } else { 0.0 })
                }
                _ => None,
            })
            .unwrap_or(0.0)
    }

    pub fn all_lights_off(&self) -> bool {
        Channel::ALL.into_iter().all(|ch| self.light_level(ch) == 0.0)
    }

    pub fn pump_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Digital { line: Line::Pump, .. }))
            .count()
    }

    pub fn saw(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Persist a watering record as the firmware would have.
    pub fn seed_watering(&mut self, timestamp: &str, counter: i32) {
        self.docs.insert(
            "wateringData".into(),
            serde_json::json!({ "timestamp": timestamp, "counter": counter }),
        );
    }

    pub fn seed_time_snapshot(&mut self, timestamp: &str) {
        self.docs
            .insert("currentTime".into(), serde_json::json!({ "timestamp": timestamp }));
    }

    pub fn stored_counter(&self) -> Option<i64> {
        self.docs.get("wateringData")?.get("counter")?.as_i64()
    }

    pub fn stored_last_watered(&self) -> Option<DateTime<Utc>> {
        self.docs.get("wateringData")?.get("timestamp")?.as_str()?.parse().ok()
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockBoard {
    fn write_digital(&mut self, line: Line, on: bool) {
        self.calls.push(ActuatorCall::Digital { line, on });
    }

    fn write_analog(&mut self, line: Line, level: f32) {
        self.calls.push(ActuatorCall::Analog { line, level });
    }
}

impl StoragePort for MockBoard {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.docs.get(key).cloned())
    }

    fn write(&mut self, key: &str, document: &Value) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.docs.insert(key.to_string(), document.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.docs.remove(key);
        Ok(())
    }
}

impl ClockPort for MockBoard {
    fn uptime_ms(&self) -> u64 {
        self.uptime_ms
    }

    fn now(&self) -> DateTime<Utc> {
        self.wall_base + Duration::milliseconds(self.uptime_ms as i64)
    }

    fn set_system_time(&mut self, time: DateTime<Utc>) -> Result<(), ClockError> {
        self.wall_base = time - Duration::milliseconds(self.uptime_ms as i64);
        self.clock_sets.push(time);
        Ok(())
    }
}

impl EntropyPort for MockBoard {
    fn next_u32(&mut self) -> u32 {
        self.random
    }
}

impl EventSink for MockBoard {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Simulation harness ────────────────────────────────────────

pub fn boot_wall_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

pub const SETTLE_MS: u64 = 10_000;

pub struct Sim {
    pub app: Coordinator,
    pub board: MockBoard,
}

#[allow(dead_code)]
impl Sim {
    /// Power on with `board` (pre-seeded storage) and default config.
    pub fn boot(board: MockBoard) -> Self {
        Self::boot_with(board, WateringConfig::default())
    }

    pub fn boot_with(mut board: MockBoard, config: WateringConfig) -> Self {
        let mut app = Coordinator::new(config, board.now());
        app.start(board.uptime_ms, &mut board);
        Self { app, board }
    }

    /// Boot and run through the settle delay.
    pub fn armed(board: MockBoard) -> Self {
        let mut sim = Self::boot(board);
        sim.advance_to(SETTLE_MS);
        assert!(sim.app.is_armed());
        sim
    }

    pub fn now(&self) -> u64 {
        self.board.uptime_ms
    }

    pub fn advance_to(&mut self, t_ms: u64) {
        assert!(t_ms >= self.board.uptime_ms, "time goes forward");
        self.board.uptime_ms = t_ms;
        self.app.poll(t_ms, &mut self.board);
    }

    pub fn advance_by(&mut self, dt_ms: u64) {
        self.advance_to(self.board.uptime_ms + dt_ms);
    }

    /// Press now, hold for `held_ms` (running due timers meanwhile), release.
    pub fn press(&mut self, held_ms: u64) {
        let t = self.board.uptime_ms;
        self.app.button_pressed(t);
        self.advance_by(held_ms);
        let t = self.board.uptime_ms;
        self.app.button_released(t, &mut self.board);
    }
}
