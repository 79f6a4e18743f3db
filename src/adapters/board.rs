//! The assembled board: one value implementing every port, handed to the
//! [`Coordinator`](crate::app::coordinator::Coordinator) as its
//! [`Platform`](crate::app::ports::Platform).

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::app::events::AppEvent;
use crate::app::ports::{
    ActuatorPort, ClockError, ClockPort, EntropyPort, EventSink, Line, StorageError, StoragePort,
};

use super::entropy::HwEntropy;
use super::log_sink::LogEventSink;
use super::nvs::NvsStore;
use super::time::SystemClock;

pub struct Board<A> {
    pub hardware: A,
    pub store: NvsStore,
    pub clock: SystemClock,
    pub entropy: HwEntropy,
    pub sink: LogEventSink,
}

impl<A: ActuatorPort> Board<A> {
    pub fn new(hardware: A, store: NvsStore) -> Self {
        Self {
            hardware,
            store,
            clock: SystemClock::new(),
            entropy: HwEntropy::new(),
            sink: LogEventSink::new(),
        }
    }
}

impl<A: ActuatorPort> ActuatorPort for Board<A> {
    fn write_digital(&mut self, line: Line, on: bool) {
        self.hardware.write_digital(line, on);
    }

    fn write_analog(&mut self, line: Line, level: f32) {
        self.hardware.write_analog(line, level);
    }
}

impl<A> StoragePort for Board<A> {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.store.read(key)
    }

    fn write(&mut self, key: &str, document: &Value) -> Result<(), StorageError> {
        self.store.write(key, document)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key)
    }
}

impl<A> ClockPort for Board<A> {
    fn uptime_ms(&self) -> u64 {
        self.clock.uptime_ms()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn set_system_time(&mut self, time: DateTime<Utc>) -> Result<(), ClockError> {
        self.clock.set_system_time(time)
    }
}

impl<A> EntropyPort for Board<A> {
    fn next_u32(&mut self) -> u32 {
        self.entropy.next_u32()
    }
}

impl<A> EventSink for Board<A> {
    fn emit(&mut self, event: &AppEvent) {
        self.sink.emit(event);
    }
}
