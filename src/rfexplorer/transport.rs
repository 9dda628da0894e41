//! Byte transport underneath the decoder.
//!
//! The decoder only needs a non-blocking "give me what has arrived" read and a write.
//! [`SerialTransport`] provides both over a local serial port; tests substitute an
//! in-memory implementation.
use thiserror::Error;

#[cfg(feature = "serial")]
use log::debug;
#[cfg(feature = "serial")]
use serialport::SerialPort;
#[cfg(feature = "serial")]
use std::io::{Read, Write};
#[cfg(feature = "serial")]
use std::time::Duration;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("error opening {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("error reading {port}: {reason}")]
    Read { port: String, reason: String },

    #[error("error writing {port}: {reason}")]
    Write { port: String, reason: String },

    #[error("error configuring {port}: {reason}")]
    Configure { port: String, reason: String },
}

pub trait Transport {
    /// Return whatever bytes have arrived since the last call without blocking.
    fn read_available(&mut self) -> Result<Vec<u8>, TransportError>;

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Change the local line rate after the device has been told to switch.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), TransportError>;

    fn name(&self) -> &str;
}

/// Serial port link to the analyzer.
#[cfg(feature = "serial")]
pub struct SerialTransport {
    name: String,
    port: Box<dyn SerialPort>,
}

#[cfg(feature = "serial")]
impl SerialTransport {
    /// Open the port 8N1 and discard anything already waiting in the input buffer.
    pub fn open(port_name: &str, baud_rate: u32, write_timeout: Duration) -> Result<Self, TransportError> {
        let mut builder = serialport::new(port_name, baud_rate).timeout(write_timeout);
        #[cfg(unix)]
        {
            builder = builder
                .data_bits(serialport::DataBits::Eight)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None);
        }
        let port = builder.open().map_err(|e| TransportError::Open {
            port: port_name.to_string(),
            reason: e.to_string(),
        })?;
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            debug!("Could not clear input buffer on {}: {}", port_name, e);
        }
        Ok(Self {
            name: port_name.to_string(),
            port,
        })
    }

    fn read_error(&self, reason: impl ToString) -> TransportError {
        TransportError::Read {
            port: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(feature = "serial")]
impl Transport for SerialTransport {
    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        let available = self.port.bytes_to_read().map_err(|e| self.read_error(e))? as usize;
        if available == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; available];
        match self.port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::Interrupted =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(self.read_error(e)),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port
            .write_all(data)
            .and_then(|_| self.port.flush())
            .map_err(|e| TransportError::Write {
                port: self.name.clone(),
                reason: e.to_string(),
            })
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), TransportError> {
        self.port
            .set_baud_rate(baud_rate)
            .map_err(|e| TransportError::Configure {
                port: self.name.clone(),
                reason: e.to_string(),
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
