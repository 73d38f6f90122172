//! Servolink Firmware — Main Entry Point
//!
//! Hexagonal architecture with a fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (ServoPort)       (EventSink)    (ConfigPort) (uptime)        │
//! │  MqttAdapter       EspEntropy                                  │
//! │  (MessagingPort)   (EntropyPort)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  ByteQueue · Codec · FSM · ConnectionSupervisor        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use servolink::adapters::entropy::EspEntropy;
use servolink::adapters::hardware::HardwareAdapter;
use servolink::adapters::log_sink::LogEventSink;
use servolink::adapters::mqtt::MqttAdapter;
use servolink::adapters::nvs::NvsAdapter;
use servolink::adapters::time::Esp32TimeAdapter;
use servolink::app::service::AppService;
use servolink::config::ServoConfig;
use servolink::drivers::servo::ServoDriver;
use servolink::pins;

// WiFi credentials are baked in at build time.
const WIFI_SSID: &str = match option_env!("SERVOLINK_WIFI_SSID") {
    Some(s) => s,
    None => "servolink",
};
const WIFI_PASS: &str = match option_env!("SERVOLINK_WIFI_PASS") {
    Some(s) => s,
    None => "",
};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Servolink v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new(nvs_partition.clone())
        .and_then(|mut nvs| nvs.load_or_init(ServoConfig::default()))
    {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config unavailable ({}), using defaults", e);
            ServoConfig::default()
        }
    };

    // ── 3. Servo on LEDC channel 0 ────────────────────────────
    // gpio13 must match pins::SERVO_GPIO.
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(pins::SERVO_PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits14),
    )?;
    let channel = LedcDriver::new(peripherals.ledc.channel0, &timer, peripherals.pins.gpio13)?;
    let mut servo = HardwareAdapter::new(ServoDriver::new(channel));
    info!("Servo on GPIO{} @ {} Hz", pins::SERVO_GPIO, pins::SERVO_PWM_FREQ_HZ);

    // ── 4. WiFi (blocking until associated) ───────────────────
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?,
        sysloop,
    )?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|()| anyhow::anyhow!("SSID too long"))?,
        password: WIFI_PASS
            .try_into()
            .map_err(|()| anyhow::anyhow!("password too long"))?,
        auth_method: if WIFI_PASS.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.connect().context("WiFi association failed")?;
    wifi.wait_netif_up()?;
    info!("WiFi: connected to '{}'", WIFI_SSID);

    // TLS certificate validation needs wall-clock time.
    let _sntp = EspSntp::new_default()?;

    // ── 5. Application service ────────────────────────────────
    let mut mqtt = MqttAdapter::new(&config.broker_url)
        .map_err(|e| anyhow::anyhow!("MQTT adapter: {}", e))?;
    let mut rng = EspEntropy;
    let mut sink = LogEventSink::new();
    let clock = Esp32TimeAdapter::new();
    let interval_ms = config.control_loop_interval_ms;

    let mut app = AppService::new(config).map_err(|e| anyhow::anyhow!("{}", e))?;
    app.start(&mut sink);

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let now = clock.uptime_ms();
        app.tick(now, &mut servo, &mut mqtt, &mut rng, &mut sink);
        FreeRtos::delay_ms(interval_ms);
    }
}
