//! HTTP client adapter.
//!
//! One connection per POST: the collector is plain HTTP on a slow link and
//! a kept-alive socket would outlive most WiFi drops anyway.  A response
//! body is drained and discarded; only the status matters.

use log::debug;

use crate::app::ports::HttpPort;
use crate::error::TransportError;

/// Upper bound on one request, connect to last response byte.
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

#[cfg(target_os = "espidf")]
use core::time::Duration;
#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::{Method, Status, client::Client},
    io::{Read, Write},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

#[derive(Default)]
pub struct HttpClient {
    /// Simulation: status codes (or failures) handed out in order; once
    /// drained every POST returns 200.
    #[cfg(not(target_os = "espidf"))]
    pub scripted: std::collections::VecDeque<Result<u16, TransportError>>,
    /// Simulation: every body posted so far.
    #[cfg(not(target_os = "espidf"))]
    pub sent: Vec<Vec<u8>>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(target_os = "espidf")]
impl HttpPort for HttpClient {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<u16, TransportError> {
        let conf = Configuration {
            timeout: Some(Duration::from_millis(REQUEST_TIMEOUT_MS)),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|_| TransportError::ConnectionRefused)?;
        let mut client = Client::wrap(conn);

        let len = body.len().to_string();
        let mut all: Vec<(&str, &str)> = headers.to_vec();
        all.push(("Content-Length", len.as_str()));

        let mut request = client
            .request(Method::Post, url, &all)
            .map_err(|_| TransportError::ConnectionRefused)?;
        request
            .write_all(body)
            .map_err(|_| TransportError::SendFailed)?;
        request.flush().map_err(|_| TransportError::SendFailed)?;
        let mut response = request.submit().map_err(|_| TransportError::ReadTimeout)?;
        let status = response.status();

        let mut sink = [0u8; 128];
        while matches!(response.read(&mut sink), Ok(n) if n > 0) {}

        debug!("HTTP: POST {} -> {}", url, status);
        Ok(status)
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpPort for HttpClient {
    fn post(
        &mut self,
        url: &str,
        _headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<u16, TransportError> {
        self.sent.push(body.to_vec());
        let result = self.scripted.pop_front().unwrap_or(Ok(200));
        debug!("HTTP(sim): POST {} -> {:?}", url, result);
        result
    }
}
