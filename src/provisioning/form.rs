//! Configuration portal form: decoding, validation and rendering.
//!
//! The portal adapter only moves bytes.  Everything the operator can get
//! wrong is decided here, on the host-testable side of the port.

use core::fmt;
use core::time::Duration;

use crate::config::{
    self, MAX_BOARD_LEN, MAX_INTERVAL_DIGITS, MAX_LOCATION_LEN, MAX_PASSWORD_LEN, MAX_SERVER_LEN,
    MAX_SSID_LEN, Settings, WifiCredentials,
};
use crate::error::ConnectivityError;

/// Raw field values as submitted (or as pre-filled).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub server: String,
    pub board: String,
    pub location: String,
    pub interval: String,
    pub ssid: String,
    pub password: String,
}

/// Why a submission was refused.  Nothing is committed when any of these
/// is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    Server,
    BoardTooLong,
    LocationTooLong,
    Interval,
    Ssid,
    Password,
    /// SSID left blank and no network stored yet.
    MissingNetwork,
}

impl FormError {
    /// Operator-facing message shown above the form.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Server => "Servidor invalido: use http:// ou https:// (max. 100 caracteres)",
            Self::BoardTooLong => "Nome da placa muito longo (max. 32 caracteres)",
            Self::LocationTooLong => "Local muito longo (max. 32 caracteres)",
            Self::Interval => "Intervalo invalido: inteiro positivo em milissegundos",
            Self::Ssid => "Rede WiFi invalida (1 a 32 caracteres)",
            Self::Password => "Senha invalida (vazia ou 8 a 64 caracteres)",
            Self::MissingNetwork => "Informe a rede WiFi",
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for FormError {}

impl From<ConnectivityError> for FormError {
    fn from(e: ConnectivityError) -> Self {
        match e {
            ConnectivityError::InvalidPassword => Self::Password,
            _ => Self::Ssid,
        }
    }
}

impl FormFields {
    /// Pre-fill from the settings in force.  The stored password is never
    /// sent back to the browser.
    pub fn from_settings(settings: &Settings, credentials: Option<&WifiCredentials>) -> Self {
        Self {
            server: settings.server_endpoint.clone(),
            board: settings.board_name.clone(),
            location: settings.location.clone(),
            interval: settings.report_interval_ms().to_string(),
            ssid: credentials.map(|c| c.ssid.as_str().to_owned()).unwrap_or_default(),
            password: String::new(),
        }
    }

    /// Validate the submission.
    ///
    /// A blank SSID keeps the stored network.  The stored SSID with a blank
    /// password also keeps the stored password, since the form never echoes
    /// it.
    pub fn apply(
        &self,
        stored: Option<&WifiCredentials>,
    ) -> Result<(Settings, WifiCredentials), FormError> {
        if !config::is_valid_endpoint(&self.server) {
            return Err(FormError::Server);
        }
        if self.board.chars().count() > MAX_BOARD_LEN {
            return Err(FormError::BoardTooLong);
        }
        if self.location.chars().count() > MAX_LOCATION_LEN {
            return Err(FormError::LocationTooLong);
        }
        let interval_ms = parse_interval_ms(&self.interval).ok_or(FormError::Interval)?;

        let credentials = match (self.ssid.as_str(), stored) {
            ("", Some(stored)) => stored.clone(),
            ("", None) => return Err(FormError::MissingNetwork),
            (ssid, Some(stored)) if self.password.is_empty() && ssid == stored.ssid.as_str() => {
                stored.clone()
            }
            (ssid, _) => WifiCredentials::new(ssid, &self.password)?,
        };

        let settings = Settings {
            server_endpoint: self.server.clone(),
            board_name: self.board.clone(),
            location: self.location.clone(),
            report_interval: Duration::from_millis(interval_ms as u64),
        };
        Ok((settings, credentials))
    }
}

/// Digits only, at most [`MAX_INTERVAL_DIGITS`], in `1..=u32::MAX`.
pub fn parse_interval_ms(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.len() > MAX_INTERVAL_DIGITS || !raw.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let ms: u64 = raw.parse().ok()?;
    u32::try_from(ms).ok().filter(|&ms| ms > 0)
}

// ---------------------------------------------------------------------------
// application/x-www-form-urlencoded
// ---------------------------------------------------------------------------

/// Decode a urlencoded body.  Unknown keys are ignored, missing keys stay
/// empty, the last occurrence of a repeated key wins.
pub fn parse_form(body: &[u8]) -> FormFields {
    let mut fields = FormFields::default();
    for pair in body.split(|&b| b == b'&') {
        let mut parts = pair.splitn(2, |&b| b == b'=');
        let name = percent_decode(parts.next().unwrap_or_default());
        let value = percent_decode(parts.next().unwrap_or_default());
        let slot = match name.as_str() {
            "server" => &mut fields.server,
            "board" => &mut fields.board,
            "location" => &mut fields.location,
            "interval" => &mut fields.interval,
            "ssid" => &mut fields.ssid,
            "password" => &mut fields.password,
            _ => continue,
        };
        *slot = value;
    }
    fields
}

fn percent_decode(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < raw.len() => {
                match (hex_val(raw[i + 1]), hex_val(raw[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

fn push_input(out: &mut String, label: &str, name: &str, kind: &str, value: &str, max: usize) {
    out.push_str("<label>");
    out.push_str(label);
    out.push_str("<input type=\"");
    out.push_str(kind);
    out.push_str("\" name=\"");
    out.push_str(name);
    out.push_str("\" maxlength=\"");
    out.push_str(&max.to_string());
    out.push_str("\" value=\"");
    push_escaped(out, value);
    out.push_str("\"></label>\n");
}

/// Render the portal page.  `error` is shown as a banner above the form.
pub fn render_form(fields: &FormFields, error: Option<&str>) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>Configurar forno</title></head><body>\n<h1>Configurar forno</h1>\n",
    );
    if let Some(message) = error {
        html.push_str("<p class=\"error\">");
        push_escaped(&mut html, message);
        html.push_str("</p>\n");
    }
    html.push_str("<form method=\"post\" action=\"/save\">\n");
    push_input(&mut html, "Servidor", "server", "url", &fields.server, MAX_SERVER_LEN);
    push_input(&mut html, "Placa", "board", "text", &fields.board, MAX_BOARD_LEN);
    push_input(&mut html, "Local", "location", "text", &fields.location, MAX_LOCATION_LEN);
    push_input(
        &mut html,
        "Intervalo (ms)",
        "interval",
        "text",
        &fields.interval,
        MAX_INTERVAL_DIGITS,
    );
    push_input(&mut html, "Rede WiFi", "ssid", "text", &fields.ssid, MAX_SSID_LEN);
    push_input(&mut html, "Senha", "password", "password", "", MAX_PASSWORD_LEN);
    html.push_str("<button type=\"submit\">Salvar</button>\n</form></body></html>\n");
    html
}
