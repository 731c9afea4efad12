//! Agent: the composition root of the core.
//!
//! [`Agent`] owns the settings store, the single `Settings` value in force,
//! the provisioning controller, the reporter and the cadence.  Collaborators
//! are borrowed per call through [`AgentIo`], so the same agent runs against
//! ESP-IDF adapters on the device and scripted mocks on the host.
//!
//! ```text
//!  boot ──▶ ProvisioningController::resolve ──▶ loop {
//!                                                 button? ──▶ resolve(ButtonHoldDetect)
//!                                                 due?    ──▶ sample ─▶ report_once ─▶ emit
//!                                                 else    ──▶ sleep(min(slice, remaining))
//!                                               }
//! ```

use log::info;

use crate::adapters::device_id::ApSsid;
use crate::app::events::AppEvent;
use crate::app::ports::{
    ButtonPort, ClockPort, ConfigPort, EventSink, HttpPort, Link, NetworkPort, PortalPort,
    SensorPort, StoragePort,
};
use crate::config::{AgentConfig, Settings};
use crate::error::ProvisioningFailure;
use crate::provisioning::context::{ProvisioningContext, ProvisioningIo};
use crate::provisioning::{ProvisioningController, ProvisioningState};
use crate::scheduler::ReportSchedule;
use crate::store::ConfigStore;
use crate::telemetry::{self, ReportOutcome, TelemetryReporter};

/// Everything the agent talks to, borrowed for the duration of a call.
pub struct AgentIo<'a> {
    pub sensors: &'a mut dyn SensorPort,
    pub network: &'a mut dyn NetworkPort,
    pub http: &'a mut dyn HttpPort,
    pub button: &'a mut dyn ButtonPort,
    pub portal: &'a mut dyn PortalPort,
    pub clock: &'a dyn ClockPort,
    pub sink: &'a mut dyn EventSink,
}

pub struct Agent<S: StoragePort> {
    store: ConfigStore<S>,
    settings: Settings,
    config: AgentConfig,
    ap_ssid: ApSsid,
    controller: ProvisioningController,
    reporter: TelemetryReporter,
    schedule: ReportSchedule,
    cycle: u32,
}

impl<S: StoragePort> Agent<S> {
    /// Load settings from `storage`.  Nothing touches the network until
    /// [`boot`](Self::boot).
    pub fn new(storage: S, config: AgentConfig, ap_ssid: ApSsid) -> Self {
        let store = ConfigStore::new(storage);
        let settings = store.load();
        let reporter = TelemetryReporter::new(config.reconnect_timeout);
        Self {
            store,
            settings,
            config,
            ap_ssid,
            controller: ProvisioningController::new(),
            reporter,
            schedule: ReportSchedule::new(),
            cycle: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    /// Completed reporting cycles since boot.
    pub fn cycles(&self) -> u32 {
        self.cycle
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Resolve connectivity.  A held button at this point asks for the
    /// configuration portal.
    pub fn boot(&mut self, io: &mut AgentIo<'_>) -> Result<Link, ProvisioningFailure> {
        io.sink.emit(&AppEvent::Booted {
            version: env!("CARGO_PKG_VERSION"),
        });
        let initial = ProvisioningState::at_boot(&mut *io.button);
        self.provision(io, initial)
    }

    /// One pass of the steady-state loop: either re-enter provisioning, run
    /// a due cycle, or sleep one slice.
    pub fn poll(
        &mut self,
        io: &mut AgentIo<'_>,
    ) -> Result<Option<ReportOutcome>, ProvisioningFailure> {
        if io.button.is_pressed() {
            info!("Agent: button pressed, re-entering provisioning");
            self.provision(io, ProvisioningState::ButtonHoldDetect)?;
            return Ok(None);
        }

        let now = io.clock.now_ms();
        let remaining = self
            .schedule
            .remaining_ms(now, self.settings.report_interval);
        if remaining > 0 {
            let slice = remaining.min(u64::from(self.config.loop_slice_ms));
            io.clock.sleep_ms(slice as u32);
            return Ok(None);
        }

        Ok(Some(self.run_cycle(io, now)))
    }

    /// Poll forever.  Only a provisioning failure ends the loop; the caller
    /// restarts the device.
    pub fn run(&mut self, io: &mut AgentIo<'_>) -> ProvisioningFailure {
        loop {
            if let Err(failure) = self.poll(io) {
                return failure;
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn run_cycle(&mut self, io: &mut AgentIo<'_>, now: u64) -> ReportOutcome {
        self.schedule.mark_started(now);
        self.cycle = self.cycle.wrapping_add(1);

        let readings = telemetry::sample_channels(&mut *io.sensors, &mut *io.sink);
        let outcome = self.reporter.report_once(
            &self.settings,
            &readings,
            &mut *io.network,
            &mut *io.http,
        );
        io.sink.emit(&AppEvent::Report {
            cycle: self.cycle,
            outcome,
        });
        outcome
    }

    fn provision(
        &mut self,
        io: &mut AgentIo<'_>,
        initial: ProvisioningState,
    ) -> Result<Link, ProvisioningFailure> {
        let mut ctx = ProvisioningContext::new(
            ProvisioningIo {
                button: &mut *io.button,
                network: &mut *io.network,
                portal: &mut *io.portal,
                clock: io.clock,
                store: &mut self.store,
                sink: &mut *io.sink,
            },
            &self.config,
            &self.ap_ssid,
            self.settings.clone(),
        );
        let result = self.controller.resolve(&mut ctx, initial);
        self.settings = ctx.into_settings();
        result
    }
}
