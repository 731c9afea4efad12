//! Wi-Fi adapter.
//!
//! Implements [`NetworkPort`]: station join with a bounded wait, link
//! status, a single bounded reconnect, and hosting the WPA2 access point
//! for the configuration portal.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp-idf-svc`.
//! - **all other targets**: an in-memory simulation for host runs.

use core::net::Ipv4Addr;
use core::time::Duration;

use log::{info, warn};

use crate::app::ports::{Link, LinkStatus, NetworkPort};
use crate::config::WifiCredentials;
use crate::error::ConnectivityError;

#[cfg(target_os = "espidf")]
use anyhow::{Context, anyhow};
#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi,
};

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
    /// Last credentials that joined successfully; used by `reconnect`.
    last: Option<WifiCredentials>,
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self { wifi, last: None }
    }

    fn try_join(&mut self, creds: &WifiCredentials, timeout: Duration) -> anyhow::Result<Link> {
        let auth_method = if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: creds.ssid.clone(),
                password: creds.password.clone(),
                auth_method,
                ..Default::default()
            }))
            .context("station configuration")?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        self.wifi.wifi_mut().connect().context("connect")?;
        self.wait_link(timeout)
    }

    fn wait_link(&self, timeout: Duration) -> anyhow::Result<Link> {
        self.wifi
            .wifi_wait_while(|| self.wifi.is_connected().map(|c| !c), Some(timeout))
            .context("association")?;
        self.wifi
            .ip_wait_while(
                || self.wifi.wifi().sta_netif().is_up().map(|up| !up),
                Some(timeout),
            )
            .context("DHCP")?;
        let ip = self.wifi.wifi().sta_netif().get_ip_info()?.ip;
        Ok(Link { ip })
    }

    fn try_host_ap(&mut self, ssid: &str, password: &str) -> anyhow::Result<Ipv4Addr> {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
        self.wifi
            .set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
                ssid: ssid.try_into().map_err(|_| anyhow!("AP SSID too long"))?,
                password: password
                    .try_into()
                    .map_err(|_| anyhow!("AP password too long"))?,
                auth_method: AuthMethod::WPA2Personal,
                channel: 1,
                ..Default::default()
            }))?;
        self.wifi.start()?;
        self.wifi.wait_netif_up()?;
        Ok(self.wifi.wifi().ap_netif().get_ip_info()?.ip)
    }

    fn link_status(&self) -> LinkStatus {
        let up = self.wifi.is_connected().unwrap_or(false)
            && self.wifi.wifi().sta_netif().is_up().unwrap_or(false);
        if !up {
            return LinkStatus::Down;
        }
        match self.wifi.wifi().sta_netif().get_ip_info() {
            Ok(info) => LinkStatus::Up(Link { ip: info.ip }),
            Err(_) => LinkStatus::Down,
        }
    }

    fn shutdown_ap(&mut self) {
        if let Err(e) = self.wifi.stop() {
            warn!("WiFi: stopping AP failed: {}", e);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

/// Host stand-in for the radio.  Joins succeed unless the SSID is listed in
/// `unreachable`.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimRadio {
    pub unreachable: Vec<String>,
    pub station_up: bool,
    pub ap: Option<String>,
    pub joins: u32,
}

#[cfg(not(target_os = "espidf"))]
const SIM_STATION_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);
#[cfg(not(target_os = "espidf"))]
const SIM_AP_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            sim: SimRadio::default(),
            last: None,
        }
    }

    pub fn sim(&mut self) -> &mut SimRadio {
        &mut self.sim
    }

    fn try_join(&mut self, creds: &WifiCredentials, _timeout: Duration) -> anyhow::Result<Link> {
        self.sim.joins += 1;
        if self.sim.unreachable.iter().any(|s| s == creds.ssid.as_str()) {
            self.sim.station_up = false;
            anyhow::bail!("network '{}' not found", creds.ssid);
        }
        self.sim.station_up = true;
        Ok(Link { ip: SIM_STATION_IP })
    }

    fn try_host_ap(&mut self, ssid: &str, _password: &str) -> anyhow::Result<Ipv4Addr> {
        self.sim.station_up = false;
        self.sim.ap = Some(ssid.to_owned());
        Ok(SIM_AP_IP)
    }

    fn link_status(&self) -> LinkStatus {
        if self.sim.station_up {
            LinkStatus::Up(Link { ip: SIM_STATION_IP })
        } else {
            LinkStatus::Down
        }
    }

    fn shutdown_ap(&mut self) {
        self.sim.ap = None;
    }
}

// ───────────────────────────────────────────────────────────────
// Port
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn join(
        &mut self,
        credentials: &WifiCredentials,
        timeout: Duration,
    ) -> Result<Link, ConnectivityError> {
        info!("WiFi: joining '{}'", credentials.ssid);
        match self.try_join(credentials, timeout) {
            Ok(link) => {
                info!("WiFi: connected, IP {}", link.ip);
                self.last = Some(credentials.clone());
                Ok(link)
            }
            Err(e) => {
                warn!("WiFi: join '{}' failed: {:#}", credentials.ssid, e);
                Err(ConnectivityError::ConnectionFailed)
            }
        }
    }

    fn status(&self) -> LinkStatus {
        self.link_status()
    }

    fn reconnect(&mut self, timeout: Duration) -> Result<Link, ConnectivityError> {
        let creds = self.last.clone().ok_or(ConnectivityError::NoCredentials)?;
        self.try_join(&creds, timeout).map_err(|e| {
            warn!("WiFi: reconnect failed: {:#}", e);
            ConnectivityError::Timeout
        })
    }

    fn host_ap(&mut self, ssid: &str, password: &str) -> Result<Ipv4Addr, ConnectivityError> {
        let ip = self.try_host_ap(ssid, password).map_err(|e| {
            warn!("WiFi: AP '{}' failed: {:#}", ssid, e);
            ConnectivityError::AccessPointFailed
        })?;
        info!("WiFi: AP '{}' up at {}", ssid, ip);
        Ok(ip)
    }

    fn stop_ap(&mut self) {
        self.shutdown_ap();
    }
}
