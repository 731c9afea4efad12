//! Furnace agent firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Max6675Bus   WifiAdapter   HttpClient   CaptivePortal         │
//! │  (Sensor)     (Network)     (Http)       (Portal)              │
//! │  BootButton   SystemClock   LogEventSink NvsAdapter            │
//! │  (Button)     (Clock)       (EventSink)  (Storage)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Agent (pure logic)                        │    │
//! │  │  Provisioning FSM · ReportSchedule · TelemetryReporter │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any provisioning failure ends in a restart; the next boot starts the
//! state machine from scratch.
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Output, PinDriver, Pull};
use esp_idf_hal::prelude::Peripherals;
use esp_idf_hal::reset;

use furnace_agent::adapters::device_id;
use furnace_agent::adapters::http::HttpClient;
use furnace_agent::adapters::log_sink::LogEventSink;
use furnace_agent::adapters::nvs::NvsAdapter;
use furnace_agent::adapters::portal::CaptivePortal;
use furnace_agent::adapters::time::SystemClock;
use furnace_agent::adapters::wifi::WifiAdapter;
use furnace_agent::app::agent::{Agent, AgentIo};
use furnace_agent::config::AgentConfig;
use furnace_agent::drivers::button::BootButton;
use furnace_agent::pins;
use furnace_agent::sensors::Max6675Bus;

/// Pause before restarting so the last log lines reach the serial console.
const RESTART_DELAY_MS: u32 = 1000;

/// Claim an output GPIO by its number in [`pins`].
fn output_pin(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, Output>> {
    // SAFETY: every number in `pins` is distinct and claimed once here; the
    // typed `Peripherals::pins` fields are never touched.
    Ok(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Furnace agent v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Storage ────────────────────────────────────────────
    let storage = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            // Without NVS the portal cannot persist anything; restart and
            // let the bootloader try again.
            error!("NVS init failed ({}), restarting", e);
            FreeRtos::delay_ms(RESTART_DELAY_MS);
            reset::restart();
        }
    };

    // ── 3. Thermocouple bus ───────────────────────────────────
    let clk = output_pin(pins::THERMO_SCK_GPIO)?;
    // SAFETY: see `output_pin`.
    let miso = PinDriver::input(unsafe { AnyInputPin::new(pins::THERMO_SO_GPIO) })?;
    let cs = pins::THERMO_CS_GPIOS
        .iter()
        .map(|&gpio| output_pin(gpio))
        .collect::<Result<Vec<_>>>()?;
    let mut sensors = Max6675Bus::new(clk, miso, cs, Ets)
        .map_err(|e| anyhow::anyhow!("thermocouple bus: {}", e))?;

    // ── 4. Button ─────────────────────────────────────────────
    // SAFETY: see `output_pin`.
    let mut button_pin = PinDriver::input(unsafe { AnyIOPin::new(pins::BUTTON_GPIO) })?;
    button_pin.set_pull(Pull::Up)?;
    let mut button = BootButton::new(button_pin);

    // ── 5. WiFi + HTTP + portal ───────────────────────────────
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), None)?,
        sysloop,
    )?;
    let mut network = WifiAdapter::new(wifi);
    let mut http = HttpClient::new();
    let mut portal = CaptivePortal::new();

    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();

    // ── 6. Agent ──────────────────────────────────────────────
    let ap_ssid = device_id::ap_ssid(&device_id::read_mac());
    let mut agent = Agent::new(storage, AgentConfig::default(), ap_ssid);
    info!(
        "Config: server={} board='{}' location='{}' interval={} ms",
        agent.settings().server_endpoint,
        agent.settings().board_name,
        agent.settings().location,
        agent.settings().report_interval_ms()
    );

    let mut io = AgentIo {
        sensors: &mut sensors,
        network: &mut network,
        http: &mut http,
        button: &mut button,
        portal: &mut portal,
        clock: &clock,
        sink: &mut sink,
    };

    let failure = match agent.boot(&mut io) {
        Ok(_) => agent.run(&mut io),
        Err(failure) => failure,
    };

    warn!("Agent stopped: {}; restarting", failure);
    FreeRtos::delay_ms(RESTART_DELAY_MS);
    reset::restart();
}
