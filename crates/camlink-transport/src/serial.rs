use std::collections::BTreeMap;
use std::io::{Read, Write};

use serialport::{ClearBuffer, SerialPort, SerialPortInfo, SerialPortType};

use crate::config::LinkConfig;
use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// A serial port link (UART, USB CDC).
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    name: String,
    baud_rate: u32,
}

impl SerialLink {
    /// Open a serial port, 8N1, no flow control.
    pub fn open(config: &LinkConfig) -> Result<Self> {
        if config.baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(0));
        }

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        tracing::debug!(port = %config.port, baud = config.baud_rate, "serial link opened");

        Ok(Self {
            port,
            name: config.port.clone(),
            baud_rate: config.baud_rate,
        })
    }

    /// Port name this link was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drop everything queued in both directions.
    pub fn clear(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl Transport for SerialLink {
    fn available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        if baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(baud_rate));
        }
        self.port.set_baud_rate(baud_rate)?;
        self.baud_rate = baud_rate;
        tracing::debug!(port = %self.name, baud = baud_rate, "baud rate changed");
        Ok(())
    }

    fn discard_input(&mut self) -> Result<usize> {
        let pending = self.available()?;
        self.port.clear(ClearBuffer::Input)?;
        Ok(pending)
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("name", &self.name)
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}

/// Information about an available serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,
    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,
    /// USB product ID (if USB device)
    pub pid: Option<u16>,
    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb) => (Some(usb.vid), Some(usb.pid), usb.product),
            _ => (None, None, None),
        };
        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// List serial ports, ACM devices first, then USB serial adapters, then the rest.
pub fn list_ports() -> Vec<PortInfo> {
    let mut by_name: BTreeMap<String, PortInfo> = BTreeMap::new();
    match serialport::available_ports() {
        Ok(ports) => {
            for info in ports {
                let port = PortInfo::from(info);
                by_name.entry(port.name.clone()).or_insert(port);
            }
        }
        Err(err) => tracing::warn!(error = %err, "serial port enumeration failed"),
    }

    let mut ports: Vec<PortInfo> = by_name.into_values().collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports
}

fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        return (0, rest.parse().unwrap_or(usize::MAX), basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        return (1, rest.parse().unwrap_or(usize::MAX), basename.to_string());
    }
    (2, 0, basename.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_sort_acm_then_usb_then_rest() {
        let mut names = vec![
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "/dev/ttyS0",
            "/dev/ttyUSB0",
            "/dev/ttyACM10",
            "/dev/ttyACM0",
        ];
        names.sort_by_key(|n| port_sort_key(n));

        assert_eq!(
            names,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyACM10",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/ttyS0",
            ]
        );
    }

    #[test]
    fn open_rejects_zero_baud() {
        let cfg = LinkConfig::new("/dev/null").with_baud_rate(0);
        let err = SerialLink::open(&cfg).unwrap_err();
        assert!(matches!(err, TransportError::InvalidBaudRate(0)));
    }

    #[test]
    fn open_missing_port_reports_name() {
        let cfg = LinkConfig::new("/dev/camlink-does-not-exist");
        let err = SerialLink::open(&cfg).unwrap_err();
        match err {
            TransportError::Open { port, .. } => assert_eq!(port, "/dev/camlink-does-not-exist"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
