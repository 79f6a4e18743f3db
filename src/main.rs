//! PlantWater Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsStore      SystemClock    │
//! │  (Actuator)        (EventSink)    (Storage+Cfg) (Clock)        │
//! │  HwEntropy         ButtonDriver (debounced edges)              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Coordinator (pure logic)                  │    │
//! │  │  Pump · Lights · Schedule · TimeKeeper · TimerQueue    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use plantwater::adapters::board::Board;
use plantwater::adapters::hardware::HardwareAdapter;
use plantwater::adapters::nvs::NvsStore;
use plantwater::app::coordinator::Coordinator;
use plantwater::app::ports::{ClockPort, ConfigPort};
use plantwater::config::WateringConfig;
use plantwater::drivers::button::{ButtonDriver, ButtonEdge};
use plantwater::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PlantWater v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let store = NvsStore::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            WateringConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: pin numbers come from `pins`, each claimed exactly once here.
    let pump = PinDriver::output(unsafe { AnyOutputPin::new(pins::PUMP_GPIO) })?;

    let light_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(Hertz(pins::LIGHT_PWM_FREQ_HZ))
            .resolution(Resolution::Bits8),
    )?;
    let lights = [
        LedcDriver::new(peripherals.ledc.channel0, &light_timer, unsafe {
            AnyOutputPin::new(pins::LIGHT_1_GPIO)
        })?,
        LedcDriver::new(peripherals.ledc.channel1, &light_timer, unsafe {
            AnyOutputPin::new(pins::LIGHT_2_GPIO)
        })?,
        LedcDriver::new(peripherals.ledc.channel2, &light_timer, unsafe {
            AnyOutputPin::new(pins::LIGHT_3_GPIO)
        })?,
    ];

    let mut button_pin = PinDriver::input(unsafe { AnyInputPin::new(pins::BUTTON_GPIO) })?;
    button_pin.set_pull(if pins::BUTTON_ACTIVE_HIGH { Pull::Down } else { Pull::Up })?;

    // ── 4. Wire the application core ──────────────────────────
    let mut board = Board::new(HardwareAdapter::new(pump, lights), store);
    let mut coordinator = Coordinator::new(config, board.now());
    let mut button = ButtonDriver::new(pins::BUTTON_GPIO);

    coordinator.start(board.uptime_ms(), &mut board);
    info!("Button on GPIO {}, entering main loop", button.gpio());

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        let now = board.uptime_ms();

        let pressed = button_pin.is_high() == pins::BUTTON_ACTIVE_HIGH;
        match button.tick(now, pressed) {
            Some(ButtonEdge::Pressed) => coordinator.button_pressed(now),
            Some(ButtonEdge::Released) => coordinator.button_released(now, &mut board),
            None => {}
        }

        coordinator.poll(now, &mut board);

        // Sleep until the next timer, but keep sampling the button.
        let max_sleep = u64::from(pins::MAIN_LOOP_MAX_SLEEP_MS);
        let sleep_ms = coordinator
            .next_deadline()
            .map_or(max_sleep, |deadline| deadline.saturating_sub(now).min(max_sleep))
            .max(1);
        FreeRtos::delay_ms(sleep_ms as u32);
    }
}
