//! Hardware adapter — bridges real peripherals to the actuator port.
//!
//! Owns the pump output pin and the three light PWM channels and exposes
//! them through [`ActuatorPort`].  This is the only module in the system
//! that touches output hardware.  It is written against the `embedded-hal`
//! 1.0 traits, so on the device it wraps `esp-idf-hal` drivers
//! (`PinDriver`, `LedcDriver`) and in tests any mock pin.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::error;

use crate::app::ports::{ActuatorPort, Channel, Line};

/// Concrete adapter that combines all output hardware behind the port.
pub struct HardwareAdapter<P, L> {
    pump: P,
    lights: [L; 3],
}

impl<P: OutputPin, L: SetDutyCycle> HardwareAdapter<P, L> {
    /// Take ownership of the outputs and drive them all to their off state.
    pub fn new(pump: P, lights: [L; 3]) -> Self {
        let mut hw = Self { pump, lights };
        hw.write_digital(Line::Pump, false);
        for channel in Channel::ALL {
            hw.write_analog(Line::Light(channel), 0.0);
        }
        hw
    }

    fn set_light(&mut self, channel: Channel, level: f32) {
        let light = &mut self.lights[channel.index()];
        let max = light.max_duty_cycle();
        let duty = (level.clamp(0.0, 1.0) * f32::from(max)).round() as u16;
        if let Err(e) = light.set_duty_cycle(duty.min(max)) {
            error!("Light ch{}: set duty {} failed: {:?}", channel.number(), duty, e);
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin, L: SetDutyCycle> ActuatorPort for HardwareAdapter<P, L> {
    fn write_digital(&mut self, line: Line, on: bool) {
        match line {
            Line::Pump => {
                let result = if on { self.pump.set_high() } else { self.pump.set_low() };
                if let Err(e) = result {
                    error!("Pump: set {} failed: {:?}", if on { "high" } else { "low" }, e);
                }
            }
            Line::Light(channel) => self.set_light(channel, if on { 1.0 } else { 0.0 }),
        }
    }

    fn write_analog(&mut self, line: Line, level: f32) {
        match line {
            Line::Light(channel) => self.set_light(channel, level),
            // The pump has no speed control; any non-zero level runs it.
            Line::Pump => self.write_digital(Line::Pump, level > 0.0),
        }
    }
}
