//! Integration tests for the provisioning state machine.
//!
//! Drives `ProvisioningController::resolve` end to end against scripted
//! button, network and portal mocks, with a real `ConfigStore` over an
//! in-memory medium.

use std::time::Duration;

use furnace_agent::adapters::device_id::ApSsid;
use furnace_agent::app::events::AppEvent;
use furnace_agent::app::ports::ConfigPort;
use furnace_agent::config::{AgentConfig, Settings};
use furnace_agent::error::ProvisioningFailure;
use furnace_agent::provisioning::context::{ProvisioningContext, ProvisioningIo};
use furnace_agent::provisioning::form::{FormError, FormFields};
use furnace_agent::provisioning::{ProvisioningController, ProvisioningState};
use furnace_agent::store::ConfigStore;

use crate::mock_hw::{
    FakeClock, MemoryStorage, ap_ssid, MockNetwork, MockPortal, RecordingSink, STATION_IP, ScriptedButton,
    home_network, submission,
};

struct Rig {
    clock: FakeClock,
    button: ScriptedButton,
    network: MockNetwork,
    portal: MockPortal,
    store: ConfigStore<MemoryStorage>,
    sink: RecordingSink,
    config: AgentConfig,
    ap_ssid: ApSsid,
}

impl Rig {
    fn new() -> Self {
        let clock = FakeClock::new();
        Self {
            button: ScriptedButton::released(&clock),
            network: MockNetwork::new(&clock),
            portal: MockPortal::default(),
            store: ConfigStore::new(MemoryStorage::new()),
            sink: RecordingSink::default(),
            config: AgentConfig::default(),
            ap_ssid: ap_ssid(),
            clock,
        }
    }

    /// A unit that was configured in an earlier session.
    fn provisioned() -> Self {
        let mut rig = Self::new();
        rig.store.save_credentials(&home_network()).unwrap();
        rig
    }

    fn initial_state(&mut self) -> ProvisioningState {
        ProvisioningState::at_boot(&mut self.button)
    }

    fn resolve(
        &mut self,
        initial: ProvisioningState,
    ) -> (Result<std::net::Ipv4Addr, ProvisioningFailure>, Settings) {
        let settings = self.store.load();
        let mut ctx = ProvisioningContext::new(
            ProvisioningIo {
                button: &mut self.button,
                network: &mut self.network,
                portal: &mut self.portal,
                clock: &self.clock,
                store: &mut self.store,
                sink: &mut self.sink,
            },
            &self.config,
            &self.ap_ssid,
            settings,
        );
        let mut fsm = ProvisioningController::new();
        let result = fsm.resolve(&mut ctx, initial).map(|link| link.ip);
        (result, ctx.into_settings())
    }

    fn now(&self) -> u64 {
        use furnace_agent::app::ports::ClockPort;
        self.clock.now_ms()
    }
}

// ── Boot without a button ─────────────────────────────────────

#[test]
fn stored_network_joins_without_portal() {
    let mut rig = Rig::provisioned();
    let initial = rig.initial_state();
    assert_eq!(initial, ProvisioningState::Normal);

    let (result, settings) = rig.resolve(initial);

    assert_eq!(result, Ok(STATION_IP));
    assert_eq!(settings, Settings::default());
    assert_eq!(rig.network.joins, vec!["Fabrica".to_owned()]);
    assert_eq!(rig.network.ap_starts, 0);
    assert!(rig.portal.opened_with.is_empty());
    assert!(rig.sink.contains(&AppEvent::Online { ip: STATION_IP }));
}

#[test]
fn first_boot_opens_portal_and_commits_submission() {
    let mut rig = Rig::new();
    rig.portal = MockPortal::with_submissions([submission()]);

    let (result, settings) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Ok(STATION_IP));
    assert_eq!(settings.board_name, "Placa Galpao");
    assert_eq!(settings.report_interval, Duration::from_millis(30_000));
    assert_eq!(rig.store.load(), settings);
    assert_eq!(
        rig.store.load_credentials().unwrap().ssid.as_str(),
        "Galpao"
    );
    assert_eq!(rig.network.joins, vec!["Galpao".to_owned()]);

    // Portal and AP torn down on the way out.
    assert!(!rig.portal.open);
    assert!(rig.network.ap.is_none());

    let expected = [
        AppEvent::ProvisioningStarted(ProvisioningState::Normal),
        AppEvent::ProvisioningTransition {
            from: ProvisioningState::Normal,
            to: ProvisioningState::ApConfigMode,
        },
        AppEvent::PortalOpened {
            ssid: ap_ssid(),
            ip: crate::mock_hw::AP_IP,
        },
        AppEvent::SettingsCommitted,
        AppEvent::ProvisioningTransition {
            from: ProvisioningState::ApConfigMode,
            to: ProvisioningState::Connecting,
        },
        AppEvent::Online { ip: STATION_IP },
    ];
    assert_eq!(rig.sink.events, expected);
}

#[test]
fn unreachable_stored_network_falls_back_to_portal() {
    let mut rig = Rig::provisioned();
    rig.network.unreachable.push("Fabrica".into());
    rig.portal = MockPortal::with_submissions([submission()]);

    let (result, _) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Ok(STATION_IP));
    assert_eq!(rig.network.joins, vec!["Fabrica".to_owned(), "Galpao".to_owned()]);
    // Prefill offers the stored SSID but never its password.
    let prefill = &rig.portal.opened_with[0];
    assert_eq!(prefill.ssid, "Fabrica");
    assert!(prefill.password.is_empty());
}

// ── Button hold ───────────────────────────────────────────────

#[test]
fn hold_of_999_ms_returns_to_normal() {
    let mut rig = Rig::provisioned();
    rig.button = ScriptedButton::held(&rig.clock, 0, 999);
    let initial = rig.initial_state();
    assert_eq!(initial, ProvisioningState::ButtonHoldDetect);

    let (result, _) = rig.resolve(initial);

    assert_eq!(result, Ok(STATION_IP));
    assert_eq!(rig.network.ap_starts, 0);
    assert_eq!(rig.store.load_credentials(), Some(home_network()));
    assert!(!rig.sink.contains(&AppEvent::CredentialsCleared));
    assert!(rig.sink.contains(&AppEvent::ProvisioningTransition {
        from: ProvisioningState::ButtonHoldDetect,
        to: ProvisioningState::Normal,
    }));
}

#[test]
fn hold_of_one_second_forces_portal_and_forgets_network() {
    let mut rig = Rig::provisioned();
    rig.button = ScriptedButton::held(&rig.clock, 0, 10_000);

    let initial = rig.initial_state();
    let (result, _) = rig.resolve(initial);

    // Nothing submitted: the portal times out.
    assert_eq!(result, Err(ProvisioningFailure::PortalTimeout));
    assert!(rig.sink.contains(&AppEvent::CredentialsCleared));
    assert_eq!(rig.store.load_credentials(), None);
    assert_eq!(rig.network.ap_starts, 1);
    assert!(rig.network.joins.is_empty());
    assert_eq!(rig.portal.opened_with[0].ssid, "");
}

#[test]
fn forced_portal_is_entered_exactly_at_hold_threshold() {
    let mut rig = Rig::provisioned();
    rig.button = ScriptedButton::held(&rig.clock, 0, 1_000 + 10);
    rig.portal = MockPortal::with_submissions([submission()]);

    let (result, _) = rig.resolve(ProvisioningState::ButtonHoldDetect);

    assert_eq!(result, Ok(STATION_IP));
    assert!(rig.sink.contains(&AppEvent::ProvisioningTransition {
        from: ProvisioningState::ButtonHoldDetect,
        to: ProvisioningState::ApConfigMode,
    }));
}

// ── Portal validation ─────────────────────────────────────────

#[test]
fn negative_interval_is_rejected_and_nothing_is_written() {
    let mut rig = Rig::provisioned();
    let before = rig.store.storage().writes;
    rig.button = ScriptedButton::held(&rig.clock, 0, 2_000);
    rig.portal = MockPortal::with_submissions([FormFields {
        interval: "-5".into(),
        ..submission()
    }]);

    let (result, settings) = rig.resolve(ProvisioningState::ButtonHoldDetect);

    assert_eq!(result, Err(ProvisioningFailure::PortalTimeout));
    assert_eq!(settings, Settings::default());
    assert_eq!(rig.store.load(), Settings::default());
    // Only the credential delete happened; no settings key was written.
    assert_eq!(rig.store.storage().writes, before);

    let (shown, message) = &rig.portal.errors[0];
    assert_eq!(message, FormError::Interval.message());
    assert_eq!(shown.interval, "-5");
    assert!(rig.sink.contains(&AppEvent::SubmissionRejected(
        FormError::Interval.message()
    )));
}

#[test]
fn operator_can_correct_a_rejected_submission() {
    let mut rig = Rig::new();
    rig.portal = MockPortal::with_submissions([
        FormFields {
            server: "ftp://nope".into(),
            ..submission()
        },
        submission(),
    ]);

    let (result, settings) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Ok(STATION_IP));
    assert_eq!(settings.server_endpoint, "http://10.0.0.5/recebeDados/placa");
    assert_eq!(rig.portal.errors.len(), 1);
    assert_eq!(rig.portal.errors[0].1, FormError::Server.message());
}

#[test]
fn blank_ssid_without_stored_network_is_rejected() {
    let mut rig = Rig::new();
    rig.portal = MockPortal::with_submissions([FormFields {
        ssid: String::new(),
        password: String::new(),
        ..submission()
    }]);

    let (result, _) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Err(ProvisioningFailure::PortalTimeout));
    assert_eq!(rig.portal.errors[0].1, FormError::MissingNetwork.message());
}

#[test]
fn store_failure_keeps_portal_open_with_error() {
    let mut rig = Rig::new();
    rig.store = ConfigStore::new(MemoryStorage::read_only());
    rig.portal = MockPortal::with_submissions([submission()]);

    let (result, settings) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Err(ProvisioningFailure::PortalTimeout));
    assert_eq!(settings, Settings::default());
    assert_eq!(rig.portal.errors.len(), 1);
    assert!(!rig.sink.contains(&AppEvent::SettingsCommitted));
}

// ── Failures that end in a restart ────────────────────────────

#[test]
fn portal_times_out_after_configured_window() {
    let mut rig = Rig::new();
    let (result, _) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Err(ProvisioningFailure::PortalTimeout));
    assert!(rig.now() >= rig.config.portal_timeout_ms);
    assert!(rig.now() < rig.config.portal_timeout_ms + 1_000);
    assert_eq!(rig.portal.closes, 1);
    assert!(rig.network.ap.is_none());
    assert!(rig.sink.contains(&AppEvent::ProvisioningFailed(
        ProvisioningFailure::PortalTimeout
    )));
}

#[test]
fn access_point_failure_fails_immediately() {
    let mut rig = Rig::new();
    rig.network.ap_fails = true;

    let (result, _) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Err(ProvisioningFailure::AccessPointFailed));
    assert!(rig.now() < 1_000);
    assert!(rig.portal.opened_with.is_empty());
}

#[test]
fn portal_server_failure_fails_immediately() {
    let mut rig = Rig::new();
    rig.portal.fail_open = true;

    let (result, _) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Err(ProvisioningFailure::PortalFailed));
    assert!(rig.network.ap.is_none());
}

#[test]
fn join_failure_after_commit_fails_but_keeps_settings() {
    let mut rig = Rig::new();
    rig.network.unreachable.push("Galpao".into());
    rig.portal = MockPortal::with_submissions([submission()]);

    let (result, _) = rig.resolve(ProvisioningState::Normal);

    assert_eq!(result, Err(ProvisioningFailure::JoinFailed));
    // The committed record survives the restart.
    assert_eq!(rig.store.load().board_name, "Placa Galpao");
    assert_eq!(
        rig.store.load_credentials().unwrap().ssid.as_str(),
        "Galpao"
    );
}
