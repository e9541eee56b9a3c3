use std::net::{SocketAddr, UdpSocket};

use rosc::{encoder, OscMessage, OscPacket, OscType};
use thiserror::Error;

use crate::color::{self, PackedColor};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("socket setup failed: {0}")]
    Socket(#[source] std::io::Error),
    #[error("frame transmission failed: {0}")]
    Send(#[source] std::io::Error),
    #[error("OSC encoding failed: {0}")]
    Encode(String),
    #[error("driver used before initialization")]
    NotInitialized,
    #[error("no output line {0}")]
    UnknownLine(usize),
}

/// Per-line hardware profile handed across the driver boundary.
#[derive(Debug, Clone)]
pub struct LineConfig {
    pub gpio_pin: u8,
    pub led_count: usize,
    pub invert: bool,
    pub brightness: u8,
}

/// Everything a backend needs to bring the signal generator up.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub lines: Vec<LineConfig>,
    pub frequency_hz: u32,
    pub dma_channel: u8,
}

/// Boundary to the LED hardware.
///
/// The scheduler depends only on this contract: bring the output up once,
/// push one frame per line per tick, and release the hardware on the way
/// out. `shutdown` is best-effort and must not fail observably.
pub trait LedDriver {
    fn initialize(&mut self, config: &DriverConfig) -> Result<(), DriverError>;
    fn render(&mut self, line: usize, frame: &[PackedColor]) -> Result<(), DriverError>;
    fn shutdown(&mut self);
}

/// Sends frames to an OLA daemon as OSC blobs, one DMX universe per line.
pub struct OlaDriver {
    target_addr: SocketAddr,
    socket: Option<UdpSocket>,
    lines: Vec<LineConfig>,
}

impl OlaDriver {
    pub fn new(target_addr: SocketAddr) -> OlaDriver {
        OlaDriver {
            target_addr,
            socket: None,
            lines: Vec::new(),
        }
    }

    fn send_frame(&self, line: usize, payload: Vec<u8>) -> Result<(), DriverError> {
        let socket = self.socket.as_ref().ok_or(DriverError::NotInitialized)?;
        let msg_buf = encoder::encode(&OscPacket::Message(OscMessage {
            addr: format!("/dmx/universe/{}", line),
            args: vec![OscType::Blob(payload)],
        }))
        .map_err(|err| DriverError::Encode(format!("{:?}", err)))?;

        socket
            .send_to(&msg_buf, self.target_addr)
            .map_err(DriverError::Send)?;
        Ok(())
    }
}

impl LedDriver for OlaDriver {
    fn initialize(&mut self, config: &DriverConfig) -> Result<(), DriverError> {
        let bind_addr = SocketAddr::from(([0, 0, 0, 0], 0));
        let socket = UdpSocket::bind(bind_addr).map_err(DriverError::Socket)?;

        for (index, line) in config.lines.iter().enumerate() {
            // gpio and invert describe the signal line of a GPIO backend; a
            // network sink only records them.
            log::info!(
                "line {}: {} LEDs on universe {} (gpio {}, invert {}, brightness {})",
                index,
                line.led_count,
                index,
                line.gpio_pin,
                line.invert,
                line.brightness
            );
        }
        log::debug!(
            "signal profile: {} Hz on DMA channel {}",
            config.frequency_hz,
            config.dma_channel
        );

        self.lines = config.lines.clone();
        self.socket = Some(socket);
        Ok(())
    }

    fn render(&mut self, line: usize, frame: &[PackedColor]) -> Result<(), DriverError> {
        let config = self.lines.get(line).ok_or(DriverError::UnknownLine(line))?;
        self.send_frame(line, line_payload(frame, config.brightness))
    }

    fn shutdown(&mut self) {
        // Leave the strips dark; failures here are only worth a log line.
        for line in 0..self.lines.len() {
            let led_count = self.lines[line].led_count;
            if let Err(err) = self.send_frame(line, vec![0; led_count * 3]) {
                log::warn!("blackout for line {} failed: {}", line, err);
            }
        }
        self.socket = None;
    }
}

/// Unpacks a line's GRB words into r,g,b wire order, scaled by brightness.
fn line_payload(frame: &[PackedColor], brightness: u8) -> Vec<u8> {
    let mut payload = Vec::with_capacity(frame.len() * 3);
    for &led in frame {
        let (green, red, blue) = color::channels(led);
        payload.push(scale(red, brightness));
        payload.push(scale(green, brightness));
        payload.push(scale(blue, brightness));
    }
    payload
}

fn scale(channel: u8, brightness: u8) -> u8 {
    (u16::from(channel) * u16::from(brightness) / 255) as u8
}
