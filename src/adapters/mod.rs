//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                     |
//! |-------------|--------------|---------------------------------|
//! | `device_id` |              | eFuse MAC (AP name)             |
//! | `http`      | HttpPort     | ESP-IDF HTTP client             |
//! | `log_sink`  | EventSink    | Serial log output               |
//! | `nvs`       | StoragePort  | NVS / in-memory map             |
//! | `portal`    | PortalPort   | ESP-IDF HTTP server             |
//! | `time`      | ClockPort    | ESP32 system timer, FreeRTOS    |
//! | `wifi`      | NetworkPort  | ESP-IDF WiFi STA + AP           |

pub mod device_id;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod portal;
pub mod time;
pub mod wifi;
