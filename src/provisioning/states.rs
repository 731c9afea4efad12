//! Concrete state handlers and table builder.
//!
//! ```text
//!  boot ─[button up]──▶ NORMAL ──[joined / already up]──▶ online
//!    │                    │  ▲
//!    │     [no creds / join failed]
//!    │                    ▼  │ [released < 1000 ms]
//!    └─[button down]─▶ BUTTON_HOLD_DETECT
//!                         │
//!                 [held ≥ 1000 ms, creds cleared]
//!                         ▼
//!                    AP_CONFIG_MODE ──[timeout / AP failed]──▶ restart
//!                         │
//!                  [valid submission committed]
//!                         ▼
//!                     CONNECTING ──[joined]──▶ online
//!                         └───────[failed]──▶ restart
//! ```

use log::{error, info, warn};

use super::context::ProvisioningContext;
use super::form::FormFields;
use super::{ProvisioningState, StateDescriptor, Step};
use crate::app::events::AppEvent;
use crate::app::ports::LinkStatus;
use crate::error::ProvisioningFailure;

/// Shown when the store refuses a validated submission.
const SAVE_FAILED_MESSAGE: &str = "Falha ao gravar configuracao, tente novamente";

/// Build the state table.  Row order must match the discriminants.
pub fn build_state_table() -> [StateDescriptor; ProvisioningState::COUNT] {
    [
        StateDescriptor {
            id: ProvisioningState::Normal,
            on_enter: None,
            on_exit: None,
            on_update: normal_update,
        },
        StateDescriptor {
            id: ProvisioningState::ButtonHoldDetect,
            on_enter: Some(hold_enter),
            on_exit: None,
            on_update: hold_update,
        },
        StateDescriptor {
            id: ProvisioningState::ApConfigMode,
            on_enter: Some(ap_enter),
            on_exit: Some(ap_exit),
            on_update: ap_update,
        },
        StateDescriptor {
            id: ProvisioningState::Connecting,
            on_enter: Some(connecting_enter),
            on_exit: None,
            on_update: connecting_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL
// ═══════════════════════════════════════════════════════════════════════════

fn normal_update(ctx: &mut ProvisioningContext<'_>) -> Step {
    let Some(credentials) = ctx.io.store.load_credentials() else {
        info!("NORMAL: no stored network, opening portal");
        return Step::Goto(ProvisioningState::ApConfigMode);
    };

    if let LinkStatus::Up(link) = ctx.io.network.status() {
        return Step::Online(link);
    }

    info!("NORMAL: joining '{}'", credentials.ssid);
    match ctx.io.network.join(&credentials, ctx.config.join_timeout) {
        Ok(link) => Step::Online(link),
        Err(e) => {
            warn!("NORMAL: join failed ({}), opening portal", e);
            Step::Goto(ProvisioningState::ApConfigMode)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  BUTTON_HOLD_DETECT
// ═══════════════════════════════════════════════════════════════════════════

fn hold_enter(ctx: &mut ProvisioningContext<'_>) {
    info!(
        "HOLD: button down, hold {} ms for configuration mode",
        ctx.config.button_hold_ms
    );
}

fn hold_update(ctx: &mut ProvisioningContext<'_>) -> Step {
    if !ctx.io.button.is_pressed() {
        info!("HOLD: released after {} ms", ctx.ms_in_state());
        return Step::Goto(ProvisioningState::Normal);
    }
    if ctx.ms_in_state() >= ctx.config.button_hold_ms {
        ctx.force_reset = true;
        return Step::Goto(ProvisioningState::ApConfigMode);
    }
    ctx.io.clock.sleep_ms(ctx.config.button_poll_ms);
    Step::Stay
}

// ═══════════════════════════════════════════════════════════════════════════
//  AP_CONFIG_MODE
// ═══════════════════════════════════════════════════════════════════════════

fn ap_enter(ctx: &mut ProvisioningContext<'_>) {
    if core::mem::take(&mut ctx.force_reset) {
        match ctx.io.store.clear_credentials() {
            Ok(()) => ctx.io.sink.emit(&AppEvent::CredentialsCleared),
            Err(e) => error!("AP: could not clear credentials: {}", e),
        }
    }

    let ip = match ctx.io.network.host_ap(ctx.ap_ssid.as_str(), ctx.config.ap_password) {
        Ok(ip) => ip,
        Err(e) => {
            error!("AP: access point '{}' failed: {}", ctx.ap_ssid, e);
            ctx.failure = Some(ProvisioningFailure::AccessPointFailed);
            return;
        }
    };

    let stored = ctx.io.store.load_credentials();
    let prefill = FormFields::from_settings(&ctx.settings, stored.as_ref());
    if let Err(f) = ctx.io.portal.open(&prefill) {
        error!("AP: portal failed: {}", f);
        ctx.failure = Some(f);
        return;
    }

    info!(
        "AP: portal on '{}' at http://{} for {} s",
        ctx.ap_ssid,
        ip,
        ctx.config.portal_timeout_ms / 1000
    );
    ctx.io.sink.emit(&AppEvent::PortalOpened {
        ssid: ctx.ap_ssid.clone(),
        ip,
    });
}

fn ap_exit(ctx: &mut ProvisioningContext<'_>) {
    ctx.io.portal.close();
    ctx.io.network.stop_ap();
}

fn ap_update(ctx: &mut ProvisioningContext<'_>) -> Step {
    if let Some(failure) = ctx.failure.take() {
        return Step::Fail(failure);
    }
    if ctx.ms_in_state() >= ctx.config.portal_timeout_ms {
        warn!("AP: no valid submission in {} ms", ctx.config.portal_timeout_ms);
        return Step::Fail(ProvisioningFailure::PortalTimeout);
    }

    let Some(fields) = ctx.io.portal.poll() else {
        ctx.io.clock.sleep_ms(ctx.config.portal_poll_ms);
        return Step::Stay;
    };

    let stored = ctx.io.store.load_credentials();
    let (settings, credentials) = match fields.apply(stored.as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("AP: submission rejected: {}", e);
            ctx.io.portal.show_error(&fields, e.message());
            ctx.io.sink.emit(&AppEvent::SubmissionRejected(e.message()));
            return Step::Stay;
        }
    };

    let committed = ctx
        .io
        .store
        .save(&settings)
        .and_then(|()| ctx.io.store.save_credentials(&credentials));
    if let Err(e) = committed {
        error!("AP: commit failed: {}", e);
        ctx.io.portal.show_error(&fields, SAVE_FAILED_MESSAGE);
        ctx.io.sink.emit(&AppEvent::SubmissionRejected(SAVE_FAILED_MESSAGE));
        return Step::Stay;
    }

    ctx.settings = settings;
    ctx.pending_credentials = Some(credentials);
    ctx.io.sink.emit(&AppEvent::SettingsCommitted);
    Step::Goto(ProvisioningState::Connecting)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTING
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut ProvisioningContext<'_>) {
    if let Some(c) = &ctx.pending_credentials {
        info!("CONNECTING: joining '{}'", c.ssid);
    }
}

fn connecting_update(ctx: &mut ProvisioningContext<'_>) -> Step {
    let Some(credentials) = ctx
        .pending_credentials
        .take()
        .or_else(|| ctx.io.store.load_credentials())
    else {
        return Step::Fail(ProvisioningFailure::JoinFailed);
    };

    match ctx.io.network.join(&credentials, ctx.config.join_timeout) {
        Ok(link) => {
            ctx.settings = ctx.io.store.load();
            Step::Online(link)
        }
        Err(e) => {
            error!("CONNECTING: join failed: {}", e);
            Step::Fail(ProvisioningFailure::JoinFailed)
        }
    }
}
