//! Error taxonomy for the furnace agent.
//!
//! Every failure is contained at the smallest scope that can absorb it:
//!
//! | Error                 | Scope        | Recovery                          |
//! |-----------------------|--------------|-----------------------------------|
//! | [`StoreError`]        | config medium| fall back to defaults             |
//! | [`SensorFault`]       | one channel  | reported as `status: false`       |
//! | [`ConnectivityError`] | one cycle    | cycle dropped, next cycle retries |
//! | [`TransportError`]    | one cycle    | cycle dropped, next cycle retries |
//! | [`ProvisioningFailure`]| device      | full restart                      |
//!
//! All variants are `Copy` so they travel through events and outcomes
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Config store
// ---------------------------------------------------------------------------

/// Failure of the settings/credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The medium rejected a write; the previous configuration is still in force.
    WriteFailed,
    /// A value could not be encoded for storage.
    Encoding,
    /// The value failed range validation and was not persisted.
    Rejected(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write failed"),
            Self::Encoding => write!(f, "value could not be encoded"),
            Self::Rejected(why) => write!(f, "rejected: {why}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from the raw key/value medium ([`StoragePort`](crate::app::ports::StoragePort)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Per-channel acquisition fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Thermocouple not connected (MAX6675 D2 set).
    OpenCircuit,
    /// Chip-select or clock line could not be driven, or MISO not read.
    Bus,
    /// Channel index outside the array.
    NoSuchChannel,
    /// Converter produced a non-finite value.
    NotANumber,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCircuit => write!(f, "thermocouple open"),
            Self::Bus => write!(f, "bus error"),
            Self::NoSuchChannel => write!(f, "no such channel"),
            Self::NotANumber => write!(f, "reading is not a number"),
        }
    }
}

impl std::error::Error for SensorFault {}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    Timeout,
    AccessPointFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::Timeout => write!(f, "WiFi connection timed out"),
            Self::AccessPointFailed => write!(f, "access point could not be started"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

/// HTTP transport failure before any response status was received.
///
/// Codes follow the negative `HTTPC_ERROR_*` numbering the collector's
/// operators already know from the field logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    ConnectionRefused,
    SendFailed,
    NotConnected,
    ReadTimeout,
    Encoding,
    Other(i32),
}

impl TransportError {
    pub const fn code(self) -> i32 {
        match self {
            Self::ConnectionRefused => -1,
            Self::SendFailed => -3,
            Self::NotConnected => -4,
            Self::ReadTimeout => -11,
            Self::Encoding => -100,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionRefused => write!(f, "connection refused ({})", self.code()),
            Self::SendFailed => write!(f, "send payload failed ({})", self.code()),
            Self::NotConnected => write!(f, "not connected ({})", self.code()),
            Self::ReadTimeout => write!(f, "read timeout ({})", self.code()),
            Self::Encoding => write!(f, "payload encoding failed ({})", self.code()),
            Self::Other(code) => write!(f, "transport error ({code})"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Provisioning
// ---------------------------------------------------------------------------

/// Unrecoverable outcome of the provisioning state machine.
/// The binary answers every variant with a device restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningFailure {
    /// The local access point could not be started.
    AccessPointFailed,
    /// The portal waited its full timeout without a valid submission.
    PortalTimeout,
    /// The portal server could not be started.
    PortalFailed,
    /// Joining the network with freshly submitted credentials failed.
    JoinFailed,
}

impl fmt::Display for ProvisioningFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessPointFailed => write!(f, "access point could not be started"),
            Self::PortalTimeout => write!(f, "configuration portal timed out"),
            Self::PortalFailed => write!(f, "configuration portal could not be started"),
            Self::JoinFailed => write!(f, "could not join network with submitted credentials"),
        }
    }
}

impl std::error::Error for ProvisioningFailure {}
