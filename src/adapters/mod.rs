//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                  |
//! |------------|---------------|------------------------------|
//! | `entropy`  | EntropyPort   | ESP32 hardware RNG / xorshift|
//! | `hardware` | ServoPort     | LEDC PWM via embedded-hal    |
//! | `log_sink` | EventSink     | Serial log output            |
//! | `mqtt`     | MessagingPort | ESP-IDF MQTT client / sim    |
//! | `nvs`      | ConfigPort    | NVS / in-memory store        |
//! | `time`     | —             | ESP32 system timer           |

pub mod entropy;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
