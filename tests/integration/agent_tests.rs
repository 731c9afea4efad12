//! Integration tests for the agent: boot, reporting cadence, the
//! single-reconnect policy and runtime re-provisioning.

use std::time::Duration;

use furnace_agent::app::agent::{Agent, AgentIo};
use furnace_agent::app::events::AppEvent;
use furnace_agent::app::ports::{ClockPort, ConfigPort};
use furnace_agent::config::{AgentConfig, Settings};
use furnace_agent::error::{ProvisioningFailure, SensorFault, TransportError};
use furnace_agent::provisioning::form::FormFields;
use furnace_agent::store::ConfigStore;
use furnace_agent::telemetry::ReportOutcome;

use crate::mock_hw::{
    FakeClock, ap_ssid, MemoryStorage, MockHttp, MockNetwork, MockPortal, MockSensors, RecordingSink,
    STATION_IP, ScriptedButton, home_network, submission,
};

/// Upper bound on `poll` calls in one helper run.
const MAX_POLLS: usize = 100_000;

struct Rig {
    clock: FakeClock,
    sensors: MockSensors,
    network: MockNetwork,
    http: MockHttp,
    button: ScriptedButton,
    portal: MockPortal,
    sink: RecordingSink,
    agent: Agent<MemoryStorage>,
}

impl Rig {
    /// A unit provisioned with `settings` and the home network.
    fn with_settings(settings: &Settings) -> Self {
        let mut store = ConfigStore::new(MemoryStorage::new());
        store.save(settings).unwrap();
        store.save_credentials(&home_network()).unwrap();

        let clock = FakeClock::new();
        Self {
            sensors: MockSensors::all_at(250.0),
            network: MockNetwork::new(&clock),
            http: MockHttp::new(&clock),
            button: ScriptedButton::released(&clock),
            portal: MockPortal::default(),
            sink: RecordingSink::default(),
            agent: Agent::new(store.into_inner(), AgentConfig::default(), ap_ssid()),
            clock,
        }
    }

    fn provisioned() -> Self {
        Self::with_settings(&Settings::default())
    }

    fn boot(&mut self) -> Result<(), ProvisioningFailure> {
        let mut io = AgentIo {
            sensors: &mut self.sensors,
            network: &mut self.network,
            http: &mut self.http,
            button: &mut self.button,
            portal: &mut self.portal,
            clock: &self.clock,
            sink: &mut self.sink,
        };
        self.agent.boot(&mut io).map(|_| ())
    }

    fn poll(&mut self) -> Option<ReportOutcome> {
        let mut io = AgentIo {
            sensors: &mut self.sensors,
            network: &mut self.network,
            http: &mut self.http,
            button: &mut self.button,
            portal: &mut self.portal,
            clock: &self.clock,
            sink: &mut self.sink,
        };
        self.agent.poll(&mut io).unwrap()
    }

    /// Poll until `cycles` reporting cycles have completed in total.
    fn run_cycles(&mut self, cycles: u32) -> Vec<ReportOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..MAX_POLLS {
            if self.agent.cycles() >= cycles {
                return outcomes;
            }
            outcomes.extend(self.poll());
        }
        panic!("agent stalled before {} cycles", cycles);
    }

    /// Poll until the fake clock reaches `t`.
    fn run_until(&mut self, t: u64) {
        while self.clock.now_ms() < t {
            self.poll();
        }
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_announces_version_and_goes_online() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();

    assert_eq!(
        rig.sink.events[0],
        AppEvent::Booted {
            version: env!("CARGO_PKG_VERSION")
        }
    );
    assert!(rig.sink.contains(&AppEvent::Online { ip: STATION_IP }));
    assert_eq!(rig.agent.cycles(), 0);
}

#[test]
fn first_report_goes_out_immediately_after_boot() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();
    let outcomes = rig.run_cycles(1);

    assert_eq!(outcomes, vec![ReportOutcome::Delivered(200)]);
    assert_eq!(rig.http.start_times(), vec![0]);
}

// ── Cadence ───────────────────────────────────────────────────

#[test]
fn cycle_starts_are_spaced_by_the_interval() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();
    rig.run_cycles(4);

    let starts = rig.http.start_times();
    assert_eq!(starts, vec![0, 15_000, 30_000, 45_000]);
}

#[test]
fn slow_failing_post_does_not_stretch_or_compress_the_cadence() {
    let mut rig = Rig::provisioned();
    rig.http.latency_ms = 5_000;
    rig.http.result = Err(TransportError::ReadTimeout);
    rig.boot().unwrap();

    let outcomes = rig.run_cycles(4);

    assert!(
        outcomes
            .iter()
            .all(|o| *o == ReportOutcome::TransportFailed(TransportError::ReadTimeout))
    );
    let starts = rig.http.start_times();
    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= 15_000, "cycles {} ms apart", gap);
        assert!(gap < 15_000 + 100, "cycles {} ms apart", gap);
    }
}

#[test]
fn post_slower_than_interval_runs_next_cycle_without_catch_up() {
    let settings = Settings {
        report_interval: Duration::from_millis(1_000),
        ..Settings::default()
    };
    let mut rig = Rig::with_settings(&settings);
    rig.http.latency_ms = 3_500;
    rig.boot().unwrap();

    rig.run_cycles(3);

    // Each cycle starts as soon as the previous one ends; missed slots are
    // not replayed back to back.
    assert_eq!(rig.http.start_times(), vec![0, 3_500, 7_000]);
}

// ── Connectivity ──────────────────────────────────────────────

#[test]
fn lost_link_gets_exactly_one_reconnect_per_cycle() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();
    rig.network.up = false;
    rig.network.reconnect_ok = false;
    rig.network.reconnect_cost_ms = 2_000;

    let outcomes = rig.run_cycles(3);

    assert_eq!(outcomes, vec![ReportOutcome::ConnectivityLost; 3]);
    assert_eq!(rig.network.reconnects, 3);
    assert!(rig.http.posts.is_empty());
    // The reconnect wait counts toward the cycle, not after it.
    assert_eq!(rig.clock.now_ms(), 32_000);
}

#[test]
fn successful_reconnect_posts_in_the_same_cycle() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();
    rig.network.up = false;

    let outcomes = rig.run_cycles(1);

    assert_eq!(outcomes, vec![ReportOutcome::Delivered(200)]);
    assert_eq!(rig.network.reconnects, 1);
    assert_eq!(rig.http.posts.len(), 1);
}

#[test]
fn non_2xx_status_is_still_a_delivery() {
    let mut rig = Rig::provisioned();
    rig.http.result = Ok(503);
    rig.boot().unwrap();

    assert_eq!(rig.run_cycles(1), vec![ReportOutcome::Delivered(503)]);
    assert!(rig.sink.contains(&AppEvent::Report {
        cycle: 1,
        outcome: ReportOutcome::Delivered(503),
    }));
}

// ── Payload ───────────────────────────────────────────────────

#[test]
fn payload_reports_faulted_channels_as_down() {
    let mut rig = Rig::provisioned();
    rig.sensors = MockSensors::new(vec![
        Ok(25.1234),
        Err(SensorFault::OpenCircuit),
        Ok(100.0),
        Ok(f64::NAN),
        Ok(0.0),
    ]);
    rig.boot().unwrap();
    rig.run_cycles(1);

    let post = &rig.http.posts[0];
    assert_eq!(post.url, Settings::default().server_endpoint);
    assert_eq!(post.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        post.body,
        concat!(
            r#"{"board":"Placa de Teste","location":"Forno 1","sensors":["#,
            r#"{"name":"Sensor 1","status":true,"temp":"25.1234"},"#,
            r#"{"name":"Sensor 2","status":false,"temp":"0.0000"},"#,
            r#"{"name":"Sensor 3","status":true,"temp":"100.0000"},"#,
            r#"{"name":"Sensor 4","status":false,"temp":"0.0000"},"#,
            r#"{"name":"Sensor 5","status":true,"temp":"0.0000"}]}"#
        )
    );
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SensorFault { .. })),
        2
    );
}

#[test]
fn all_channels_faulted_still_reports() {
    let mut rig = Rig::provisioned();
    rig.sensors = MockSensors::new(vec![Err(SensorFault::Bus); 5]);
    rig.boot().unwrap();

    assert_eq!(rig.run_cycles(1), vec![ReportOutcome::Delivered(200)]);
    assert_eq!(rig.http.posts[0].body.matches("\"status\":false").count(), 5);
}

#[test]
fn payload_follows_the_wired_channel_count() {
    let mut rig = Rig::provisioned();
    rig.sensors = MockSensors::new(vec![Ok(20.0), Ok(21.0), Ok(22.0)]);
    rig.boot().unwrap();
    rig.run_cycles(1);

    assert_eq!(rig.sensors.reads, 3);
    assert_eq!(rig.http.posts[0].body.matches("\"name\"").count(), 3);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SensorFault { .. })),
        0
    );
}

// ── Runtime button ────────────────────────────────────────────

#[test]
fn short_press_at_runtime_resumes_reporting() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();
    rig.run_cycles(1);
    rig.button.presses.push((20_000, 20_300));

    rig.run_cycles(3);

    assert_eq!(rig.network.ap_starts, 0);
    assert!(rig.sink.contains(&AppEvent::ProvisioningStarted(
        furnace_agent::provisioning::ProvisioningState::ButtonHoldDetect
    )));
    assert_eq!(rig.agent.store().load_credentials(), Some(home_network()));
    assert_eq!(rig.http.start_times(), vec![0, 15_000, 30_000]);
}

#[test]
fn long_press_at_runtime_reconfigures_the_interval() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();
    rig.run_cycles(1);

    rig.button.presses.push((5_000, 7_000));
    rig.portal = MockPortal::with_submissions([FormFields {
        interval: "20000".into(),
        ..submission()
    }]);
    rig.run_until(6_100);

    assert_eq!(
        rig.agent.settings().report_interval,
        Duration::from_millis(20_000)
    );
    assert_eq!(rig.agent.settings().board_name, "Placa Galpao");
    assert_eq!(rig.network.ap_starts, 1);
    assert_eq!(rig.network.joins.last().map(String::as_str), Some("Galpao"));
    assert_eq!(
        rig.agent.store().load_credentials().unwrap().ssid.as_str(),
        "Galpao"
    );

    // The new interval counts from the last cycle start (t = 0).
    rig.run_cycles(2);
    assert_eq!(rig.http.start_times(), vec![0, 20_000]);
}

#[test]
fn portal_timeout_at_runtime_ends_the_run_loop() {
    let mut rig = Rig::provisioned();
    rig.boot().unwrap();
    rig.button.presses.push((1_000, 3_000));

    let mut io = AgentIo {
        sensors: &mut rig.sensors,
        network: &mut rig.network,
        http: &mut rig.http,
        button: &mut rig.button,
        portal: &mut rig.portal,
        clock: &rig.clock,
        sink: &mut rig.sink,
    };
    let failure = rig.agent.run(&mut io);

    assert_eq!(failure, ProvisioningFailure::PortalTimeout);
    assert_eq!(rig.agent.cycles(), 1);
    assert!(rig.agent.store().load_credentials().is_none());
}
