//! Art-Net DMX output: renders the grid into ArtDMX UDP packets at a
//! configured refresh rate.
use std::net::UdpSocket;

use serde::{Deserialize, Serialize};

use crate::engine::Output;
use crate::grid::{now_millis, PanelGrid};

const ARTNET_HEADER: &[u8; 8] = b"Art-Net\0";
const OPCODE_DMX: u16 = 0x5000;
const PROTOCOL_VERSION: u16 = 14;
const DMX_LENGTH: usize = 512;

/// Startup configuration for the Art-Net sink; see the protocol table for
/// field semantics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtNetConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub net: u8,
    pub subnet: u8,
    pub universe: u8,
    pub start_channel: u16,
    pub channels_per_panel: u16,
    pub refresh_rate: f32,
}

impl Default for ArtNetConfig {
    fn default() -> Self {
        ArtNetConfig {
            enabled: false,
            host: "255.255.255.255".into(),
            port: 6454,
            net: 0,
            subnet: 0,
            universe: 0,
            start_channel: 1,
            channels_per_panel: 5,
            refresh_rate: 44.0,
        }
    }
}

/// Emits rate-limited ArtDMX datagrams over UDP. Reuses one 512-byte
/// buffer and one sequence counter across sends.
pub struct ArtNetOutput {
    config: ArtNetConfig,
    socket: Option<UdpSocket>,
    buffer: [u8; DMX_LENGTH],
    sequence: u8,
    last_send_ms: u64,
}

impl ArtNetOutput {
    pub fn new(config: ArtNetConfig) -> std::io::Result<Self> {
        let socket = if config.enabled {
            let socket = UdpSocket::bind("0.0.0.0:0")?;
            socket.set_broadcast(config.host == "255.255.255.255")?;
            socket.set_nonblocking(true)?;
            Some(socket)
        } else {
            None
        };

        Ok(ArtNetOutput {
            config,
            socket,
            buffer: [0u8; DMX_LENGTH],
            sequence: 0,
            last_send_ms: 0,
        })
    }

    fn min_interval_ms(&self) -> u64 {
        if self.config.refresh_rate <= 0.0 {
            0
        } else {
            (1000.0 / self.config.refresh_rate) as u64
        }
    }

    fn build_packet(&mut self, grid: &PanelGrid) -> Vec<u8> {
        self.buffer = [0u8; DMX_LENGTH];
        let channels_per_panel = self.config.channels_per_panel as usize;
        let start = self.config.start_channel as usize - 1;

        for (i, state) in grid.states().iter().enumerate() {
            let base = start + i * channels_per_panel;
            if base + channels_per_panel > DMX_LENGTH {
                continue;
            }
            let scaled = state.color.scaled(state.brightness);
            self.buffer[base] = scaled.r;
            self.buffer[base + 1] = scaled.g;
            self.buffer[base + 2] = scaled.b;
            self.buffer[base + 3] = scaled.cool;
            self.buffer[base + 4] = scaled.warm;
        }

        let port_address: u16 =
            ((self.config.net as u16) << 8) | ((self.config.subnet as u16) << 4) | self.config.universe as u16;

        let mut packet = Vec::with_capacity(18 + DMX_LENGTH);
        packet.extend_from_slice(ARTNET_HEADER);
        packet.extend_from_slice(&OPCODE_DMX.to_le_bytes());
        packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
        packet.push(self.sequence);
        packet.push(0); // physical
        packet.extend_from_slice(&port_address.to_le_bytes());
        packet.extend_from_slice(&(DMX_LENGTH as u16).to_be_bytes());
        packet.extend_from_slice(&self.buffer);

        self.sequence = self.sequence.wrapping_add(1);
        packet
    }

    /// Send one final zeroed (blackout) packet and drop the socket. Called
    /// from the process shutdown path.
    pub fn shutdown(&mut self) {
        if let Some(socket) = &self.socket {
            self.buffer = [0u8; DMX_LENGTH];
            let port_address: u16 =
                ((self.config.net as u16) << 8) | ((self.config.subnet as u16) << 4) | self.config.universe as u16;
            let mut packet = Vec::with_capacity(18 + DMX_LENGTH);
            packet.extend_from_slice(ARTNET_HEADER);
            packet.extend_from_slice(&OPCODE_DMX.to_le_bytes());
            packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
            packet.push(0);
            packet.push(0);
            packet.extend_from_slice(&port_address.to_le_bytes());
            packet.extend_from_slice(&(DMX_LENGTH as u16).to_be_bytes());
            packet.extend_from_slice(&self.buffer);
            let addr = format!("{}:{}", self.config.host, self.config.port);
            if let Err(e) = socket.send_to(&packet, &addr) {
                log::warn!("art-net blackout send failed: {e}");
            }
        }
        self.socket = None;
    }
}

impl Output for ArtNetOutput {
    fn render(&mut self, grid: &PanelGrid) {
        if !self.config.enabled {
            return;
        }
        let now = now_millis();
        if now.saturating_sub(self.last_send_ms) < self.min_interval_ms() {
            return;
        }
        self.last_send_ms = now;

        let packet = self.build_packet(grid);
        let addr = format!("{}:{}", self.config.host, self.config.port);
        if let Some(socket) = &self.socket {
            if let Err(e) = socket.send_to(&packet, &addr) {
                log::warn!("art-net send failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RgbcctColor;
    use crate::grid::TopologyMode;

    #[test]
    fn header_and_channel_layout_match_protocol() {
        let mut grid = PanelGrid::new(2, 1, TopologyMode::Linear);
        grid.set(1, RgbcctColor::new(10, 20, 30, 40, 50), 0.5).unwrap();

        let config = ArtNetConfig {
            enabled: true,
            net: 1,
            subnet: 2,
            universe: 3,
            start_channel: 1,
            channels_per_panel: 5,
            ..ArtNetConfig::default()
        };
        let mut output = ArtNetOutput::new(config).unwrap();
        let packet = output.build_packet(&grid);

        assert_eq!(&packet[0..8], b"Art-Net\0");
        assert_eq!(u16::from_le_bytes([packet[8], packet[9]]), OPCODE_DMX);
        assert_eq!(u16::from_be_bytes([packet[10], packet[11]]), 14);
        let port_address = u16::from_le_bytes([packet[14], packet[15]]);
        assert_eq!(port_address, 0x0123);
        assert_eq!(u16::from_be_bytes([packet[16], packet[17]]), 512);

        // panel 0 is all zero
        assert_eq!(&packet[18..23], &[0, 0, 0, 0, 0]);
        // panel 1: (10,20,30,40,50) scaled by 0.5
        assert_eq!(&packet[23..28], &[5, 10, 15, 20, 25]);
    }

    #[test]
    fn overflowing_panels_are_skipped_without_error() {
        let grid = PanelGrid::new(200, 1, TopologyMode::Linear);
        let config = ArtNetConfig {
            enabled: true,
            channels_per_panel: 5,
            ..ArtNetConfig::default()
        };
        let mut output = ArtNetOutput::new(config).unwrap();
        // 200 panels * 5 channels = 1000 > 512; should not panic
        let packet = output.build_packet(&grid);
        assert_eq!(packet.len(), 18 + DMX_LENGTH);
    }

    #[test]
    fn sequence_byte_increments_and_wraps() {
        let grid = PanelGrid::new(1, 1, TopologyMode::Singular);
        let mut output = ArtNetOutput::new(ArtNetConfig {
            enabled: true,
            ..ArtNetConfig::default()
        })
        .unwrap();
        let first = output.build_packet(&grid)[12];
        let second = output.build_packet(&grid)[12];
        assert_eq!(first, 0);
        assert_eq!(second, 1);

        output.sequence = 255;
        let _ = output.build_packet(&grid);
        assert_eq!(output.sequence, 0);
    }
}
