//! Captive configuration portal adapter.
//!
//! Serves the form rendered by [`render_form`] on `GET /` and accepts
//! submissions on `POST /save`.  The HTTP server runs on its own task, so
//! handlers only park the decoded submission in shared state; the
//! provisioning state machine picks it up from [`PortalPort::poll`] and
//! decides what to do with it.
//!
//! - **`target_os = "espidf"`**: `EspHttpServer` from `esp-idf-svc`.
//! - **other targets**: an in-process page model with
//!   [`CaptivePortal::submit`] standing in for the browser.

use log::info;

use crate::app::ports::PortalPort;
use crate::error::ProvisioningFailure;
use crate::provisioning::form::{FormFields, parse_form, render_form};

/// Larger bodies are refused without being read.
pub const MAX_FORM_BODY: usize = 1024;

#[cfg(target_os = "espidf")]
const SAVED_PAGE: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
    <meta http-equiv=\"refresh\" content=\"3;url=/\">\
    <title>Configurar forno</title></head><body>\n\
    <p>Configuracao recebida. Aguarde...</p></body></html>\n";

/// What the portal currently shows and the last unclaimed submission.
#[derive(Debug, Default)]
struct PortalState {
    prefill: FormFields,
    error: Option<String>,
    submission: Option<FormFields>,
}

impl PortalState {
    fn page(&self) -> String {
        render_form(&self.prefill, self.error.as_deref())
    }

    fn accept(&mut self, body: &[u8]) {
        let fields = parse_form(body);
        // Echo what was typed if it bounces, minus the password.
        self.prefill = FormFields {
            password: String::new(),
            ..fields.clone()
        };
        self.error = None;
        self.submission = Some(fields);
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use embedded_svc::{
        http::{Headers, Method},
        io::{Read, Write},
    };
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};

    use super::{MAX_FORM_BODY, PortalState, SAVED_PAGE};

    pub(super) type Shared = Arc<Mutex<PortalState>>;

    pub(super) fn start(state: Shared) -> anyhow::Result<EspHttpServer<'static>> {
        let conf = Configuration {
            stack_size: 8 * 1024,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&conf)?;

        {
            let state = state.clone();
            server.fn_handler::<anyhow::Error, _>("/", Method::Get, move |req| {
                let page = state
                    .lock()
                    .map_err(|_| anyhow!("portal state poisoned"))?
                    .page();
                req.into_response(200, None, &[("Content-Type", "text/html; charset=utf-8")])?
                    .write_all(page.as_bytes())?;
                Ok(())
            })?;
        }

        server.fn_handler::<anyhow::Error, _>("/save", Method::Post, move |mut req| {
            let len = req.content_len().unwrap_or(0) as usize;
            if len > MAX_FORM_BODY {
                req.into_status_response(413)?
                    .write_all(b"formulario muito grande")?;
                return Ok(());
            }
            let mut body = vec![0u8; len];
            if len > 0 {
                req.read_exact(&mut body)?;
            }
            state
                .lock()
                .map_err(|_| anyhow!("portal state poisoned"))?
                .accept(&body);
            req.into_response(200, None, &[("Content-Type", "text/html; charset=utf-8")])?
                .write_all(SAVED_PAGE.as_bytes())?;
            Ok(())
        })?;

        Ok(server)
    }
}

#[cfg(target_os = "espidf")]
pub struct CaptivePortal {
    state: esp::Shared,
    server: Option<esp_idf_svc::http::server::EspHttpServer<'static>>,
}

#[cfg(target_os = "espidf")]
impl Default for CaptivePortal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl CaptivePortal {
    pub fn new() -> Self {
        Self {
            state: esp::Shared::default(),
            server: None,
        }
    }

    fn with_state(&self, f: impl FnOnce(&mut PortalState)) {
        match self.state.lock() {
            Ok(mut state) => f(&mut state),
            Err(_) => log::error!("Portal: state lock poisoned"),
        }
    }
}

#[cfg(target_os = "espidf")]
impl PortalPort for CaptivePortal {
    fn open(&mut self, prefill: &FormFields) -> Result<(), ProvisioningFailure> {
        self.with_state(|s| {
            *s = PortalState {
                prefill: prefill.clone(),
                ..PortalState::default()
            };
        });
        if self.server.is_none() {
            let server = esp::start(self.state.clone()).map_err(|e| {
                log::error!("Portal: HTTP server failed: {:#}", e);
                ProvisioningFailure::PortalFailed
            })?;
            self.server = Some(server);
        }
        info!("Portal: serving");
        Ok(())
    }

    fn poll(&mut self) -> Option<FormFields> {
        let mut taken = None;
        self.with_state(|s| taken = s.submission.take());
        taken
    }

    fn show_error(&mut self, prefill: &FormFields, message: &str) {
        self.with_state(|s| {
            s.prefill = FormFields {
                password: String::new(),
                ..prefill.clone()
            };
            s.error = Some(message.to_owned());
        });
    }

    fn close(&mut self) {
        // Dropping the server unregisters the handlers and stops the task.
        if self.server.take().is_some() {
            info!("Portal: stopped");
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct CaptivePortal {
    state: PortalState,
    open: bool,
}

#[cfg(not(target_os = "espidf"))]
impl CaptivePortal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// What a browser would receive from `GET /`.
    pub fn page(&self) -> String {
        self.state.page()
    }

    /// Stand-in for a browser `POST /save`.  Ignored while closed.
    pub fn submit(&mut self, body: &[u8]) {
        if self.open && body.len() <= MAX_FORM_BODY {
            self.state.accept(body);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl PortalPort for CaptivePortal {
    fn open(&mut self, prefill: &FormFields) -> Result<(), ProvisioningFailure> {
        self.state = PortalState {
            prefill: prefill.clone(),
            ..PortalState::default()
        };
        self.open = true;
        info!("Portal(sim): serving");
        Ok(())
    }

    fn poll(&mut self) -> Option<FormFields> {
        self.state.submission.take()
    }

    fn show_error(&mut self, prefill: &FormFields, message: &str) {
        self.state.prefill = FormFields {
            password: String::new(),
            ..prefill.clone()
        };
        self.state.error = Some(message.to_owned());
    }

    fn close(&mut self) {
        self.open = false;
    }
}
