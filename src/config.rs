use std::net::SocketAddr;

use serde::Deserialize;
use thiserror::Error;

use crate::driver;

const DEFAULT_LED_COUNT: usize = 300;
const DEFAULT_BLIP_SIZE: u32 = 12;
const DEFAULT_OLA_ADDRESS: &str = "127.0.0.1:7770";
const DEFAULT_FREQUENCY_HZ: u32 = 1_200_000;
const DEFAULT_DMA_CHANNEL: u8 = 10;
const DEFAULT_GPIO_PINS: [u8; 2] = [18, 13];

#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(String);

/// Runtime settings, loadable from a TOML file. The defaults reproduce the
/// reference installation: two 300-LED strips on gpio 18 and 13, a 1.2 MHz
/// signal on DMA channel 10, full brightness.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub led_count: usize,
    pub blip_size: u32,
    /// A streak spawns on a line with chance 1 in `streak_spawn_odds` per tick.
    pub streak_spawn_odds: u32,
    /// A pulse spawns on a line with chance 1 in `pulse_spawn_odds` per tick.
    pub pulse_spawn_odds: u32,
    pub tail_length_min: i32,
    pub tail_length_max: i32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub tick_rate_hz: f32,
    pub ola_address: String,
    pub frequency_hz: u32,
    pub dma_channel: u8,
    pub lines: Vec<LineConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineConfig {
    pub gpio_pin: u8,
    pub invert: bool,
    pub brightness: u8,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            led_count: DEFAULT_LED_COUNT,
            blip_size: DEFAULT_BLIP_SIZE,
            streak_spawn_odds: 41,
            pulse_spawn_odds: 4,
            tail_length_min: 3,
            tail_length_max: 10,
            speed_min: 1.5,
            speed_max: 5.0,
            tick_rate_hz: 60.0,
            ola_address: DEFAULT_OLA_ADDRESS.to_string(),
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            dma_channel: DEFAULT_DMA_CHANNEL,
            lines: DEFAULT_GPIO_PINS
                .iter()
                .map(|&gpio_pin| LineConfig {
                    gpio_pin,
                    ..LineConfig::default()
                })
                .collect(),
        }
    }
}

impl Default for LineConfig {
    fn default() -> LineConfig {
        LineConfig {
            gpio_pin: DEFAULT_GPIO_PINS[0],
            invert: false,
            brightness: 255,
        }
    }
}

impl Config {
    /// Rejects constants the engine cannot run with. Called once at startup;
    /// a running scheduler never sees an invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.led_count == 0 {
            return Err(ConfigError("led_count must be positive".to_string()));
        }
        if self.blip_size == 0 {
            return Err(ConfigError("blip_size must be positive".to_string()));
        }
        if self.streak_spawn_odds == 0 || self.pulse_spawn_odds == 0 {
            return Err(ConfigError("spawn odds must be at least 1".to_string()));
        }
        if self.tail_length_min < 1 || self.tail_length_max < self.tail_length_min {
            return Err(ConfigError(format!(
                "tail length range {}..={} is degenerate",
                self.tail_length_min, self.tail_length_max
            )));
        }
        if self.speed_min <= 0.0 || self.speed_max < self.speed_min {
            return Err(ConfigError(format!(
                "speed range {}..={} is degenerate",
                self.speed_min, self.speed_max
            )));
        }
        if self.tick_rate_hz <= 0.0 {
            return Err(ConfigError("tick_rate_hz must be positive".to_string()));
        }
        if self.lines.is_empty() {
            return Err(ConfigError("at least one output line is required".to_string()));
        }
        self.target_addr()?;
        Ok(())
    }

    /// Parsed OLA endpoint.
    pub fn target_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.ola_address.parse().map_err(|_| {
            ConfigError(format!("cannot parse ola_address '{}'", self.ola_address))
        })
    }

    /// The contract handed across the driver boundary.
    pub fn driver_config(&self) -> driver::DriverConfig {
        driver::DriverConfig {
            lines: self
                .lines
                .iter()
                .map(|line| driver::LineConfig {
                    gpio_pin: line.gpio_pin,
                    led_count: self.led_count,
                    invert: line.invert,
                    brightness: line.brightness,
                })
                .collect(),
            frequency_hz: self.frequency_hz,
            dma_channel: self.dma_channel,
        }
    }
}
