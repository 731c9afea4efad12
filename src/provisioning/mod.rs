//! Provisioning state machine: decides between normal connectivity and the
//! configuration portal, and mediates every write to the settings store.
//!
//! Same function-pointer table pattern as a classic embedded FSM:
//!
//! ```text
//! ┌───────────────────┬────────────┬───────────┬────────────────────┐
//! │ ProvisioningState │ on_enter   │ on_exit   │ on_update          │
//! ├───────────────────┼────────────┼───────────┼────────────────────┤
//! │ Normal            │ -          │ -         │ fn(ctx) -> Step    │
//! │ ButtonHoldDetect  │ fn(ctx)    │ -         │ fn(ctx) -> Step    │
//! │ ApConfigMode      │ fn(ctx)    │ fn(ctx)   │ fn(ctx) -> Step    │
//! │ Connecting        │ fn(ctx)    │ -         │ fn(ctx) -> Step    │
//! └───────────────────┴────────────┴───────────┴────────────────────┘
//! ```
//!
//! Unlike a periodic control FSM this one runs to completion: [`resolve`]
//! keeps calling `on_update` until a handler returns [`Step::Online`] or
//! [`Step::Fail`].  Handlers that wait (button sampling, portal polling)
//! sleep on the [`ClockPort`](crate::app::ports::ClockPort) themselves, so a
//! fake clock drives the whole machine deterministically in tests.
//!
//! [`resolve`]: ProvisioningController::resolve

pub mod context;
pub mod form;
pub mod states;

use core::fmt;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ButtonPort, Link};
use crate::error::ProvisioningFailure;
use context::ProvisioningContext;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProvisioningState {
    Normal = 0,
    ButtonHoldDetect = 1,
    ApConfigMode = 2,
    Connecting = 3,
}

impl ProvisioningState {
    pub const COUNT: usize = 4;

    /// Boot entry point: a held button asks for the hold detector, anything
    /// else goes straight to `Normal`.
    pub fn at_boot(button: &mut dyn ButtonPort) -> Self {
        if button.is_pressed() {
            Self::ButtonHoldDetect
        } else {
            Self::Normal
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::ButtonHoldDetect => "ButtonHoldDetect",
            Self::ApConfigMode => "ApConfigMode",
            Self::Connecting => "Connecting",
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Handler signatures
// ---------------------------------------------------------------------------

/// Result of one `on_update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Call `on_update` again.
    Stay,
    Goto(ProvisioningState),
    /// Connectivity established; the machine is done.
    Online(Link),
    /// Unrecoverable; the caller restarts the device.
    Fail(ProvisioningFailure),
}

pub type StateActionFn = fn(&mut ProvisioningContext<'_>);
pub type StateUpdateFn = fn(&mut ProvisioningContext<'_>) -> Step;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: ProvisioningState,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ProvisioningController {
    table: [StateDescriptor; ProvisioningState::COUNT],
    current: ProvisioningState,
}

impl Default for ProvisioningController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisioningController {
    pub fn new() -> Self {
        Self {
            table: states::build_state_table(),
            current: ProvisioningState::Normal,
        }
    }

    /// Run the machine from `initial` until it resolves.
    ///
    /// On success `ctx.settings` holds the settings in force (reloaded from
    /// the store if a portal session committed new ones).  The exit action
    /// of the final state runs on both outcomes.
    pub fn resolve(
        &mut self,
        ctx: &mut ProvisioningContext<'_>,
        initial: ProvisioningState,
    ) -> Result<Link, ProvisioningFailure> {
        self.current = initial;
        info!("Provisioning starting in state: {}", initial);
        ctx.io.sink.emit(&AppEvent::ProvisioningStarted(initial));
        self.enter(ctx);

        loop {
            let update = self.row().on_update;
            match update(ctx) {
                Step::Stay => {}
                Step::Goto(next) => self.transition(next, ctx),
                Step::Online(link) => {
                    self.exit(ctx);
                    info!("Provisioning resolved online ({})", link.ip);
                    ctx.io.sink.emit(&AppEvent::Online { ip: link.ip });
                    return Ok(link);
                }
                Step::Fail(failure) => {
                    self.exit(ctx);
                    warn!("Provisioning failed in {}: {}", self.current, failure);
                    ctx.io.sink.emit(&AppEvent::ProvisioningFailed(failure));
                    return Err(failure);
                }
            }
        }
    }

    fn row(&self) -> &StateDescriptor {
        &self.table[self.current as usize]
    }

    fn enter(&self, ctx: &mut ProvisioningContext<'_>) {
        ctx.entered_at_ms = ctx.io.clock.now_ms();
        if let Some(enter) = self.row().on_enter {
            enter(ctx);
        }
    }

    fn exit(&self, ctx: &mut ProvisioningContext<'_>) {
        if let Some(exit) = self.row().on_exit {
            exit(ctx);
        }
    }

    fn transition(&mut self, next: ProvisioningState, ctx: &mut ProvisioningContext<'_>) {
        let from = self.current;
        info!("Provisioning transition: {} -> {}", from, next);
        self.exit(ctx);
        self.current = next;
        ctx.io
            .sink
            .emit(&AppEvent::ProvisioningTransition { from, to: next });
        self.enter(ctx);
    }
}
