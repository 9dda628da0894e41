//! # RF Explorer Device Communication Module
//!
//! Decodes the serial telemetry of RF Explorer handheld spectrum analyzers into device
//! identity, acquisition configuration and amplitude sweeps, and encodes the commands the
//! analyzer accepts.
//!
//! ## Layers
//!
//! - [`buffer`] - receive accumulation buffer
//! - [`framer`] - header matching, body extraction and resynchronization
//! - [`records`] - text record classification, `Setup` and `Configuration`
//! - [`sweep`] - sweep construction under the configuration in force
//! - [`state`] - the per-connection [`Decoder`] and its [`CommunicatorState`]
//! - [`command`] - outbound command framing
//! - [`transport`] - the byte link, with a serial port implementation
//!
//! ## Polling
//!
//! Nothing here blocks. The caller polls in a loop and sleeps briefly when a poll yields
//! no updates:
//!
//! ```rust,no_run
//! # #[cfg(feature = "serial")]
//! # fn main() -> anyhow::Result<()> {
//! use rfexplorer_logger::rfexplorer::RfExplorer;
//! use std::time::Duration;
//!
//! let mut explorer = RfExplorer::open("/dev/ttyUSB0", 500000)?;
//! explorer.send_request_config()?;
//! loop {
//!     if explorer.poll()?.is_empty() {
//!         std::thread::sleep(Duration::from_millis(10));
//!     }
//!     for sweep in explorer.drain_sweeps() {
//!         println!("{} {} points", sweep.timestamp, sweep.len());
//!     }
//! }
//! # }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```

pub mod buffer;
pub mod command;
pub mod framer;
pub mod records;
pub mod state;
pub mod sweep;
pub mod transport;

use log::{debug, info, trace};
use thiserror::Error;

pub use command::{Command, CommandError, BAUD_RATES};
pub use records::{Configuration, Setup};
pub use state::{CommunicatorState, Decoder, Update};
pub use sweep::Sweep;
#[cfg(feature = "serial")]
pub use transport::SerialTransport;
pub use transport::{Transport, TransportError};

use crate::logutil::escape_bytes;
use crate::metrics::DecodeCounters;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A connection to one analyzer: transport, decoder and device state.
pub struct RfExplorer<T: Transport> {
    transport: T,
    decoder: Decoder,
}

#[cfg(feature = "serial")]
impl RfExplorer<SerialTransport> {
    /// Open a serial connection with the write timeout the analyzer tolerates.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, TransportError> {
        info!(
            "Initializing RF Explorer on {} at {} baud",
            port_name, baud_rate
        );
        let transport = SerialTransport::open(
            port_name,
            baud_rate,
            std::time::Duration::from_millis(100),
        )?;
        Ok(Self::new(transport))
    }
}

impl<T: Transport> RfExplorer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: Decoder::new(),
        }
    }

    pub fn state(&self) -> &CommunicatorState {
        self.decoder.state()
    }

    pub fn drain_sweeps(&mut self) -> Vec<Sweep> {
        self.decoder.state_mut().drain_sweeps()
    }

    pub fn counters(&self) -> DecodeCounters {
        self.decoder.counters()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read whatever has arrived and decode every complete frame in it.
    /// An empty result means nothing new was decoded.
    pub fn poll(&mut self) -> Result<Vec<Update>, TransportError> {
        let data = self.transport.read_available()?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        trace!("RAW {} bytes: {}", data.len(), escape_bytes(&data));
        Ok(self.decoder.process(&data))
    }

    /// Encode and transmit a command. A baud change also retunes the local port.
    pub fn send(&mut self, command: Command) -> Result<(), DeviceError> {
        let data = command.encode()?;
        self.transport.write(&data)?;
        debug!("==> {}", escape_bytes(&data));
        if let Command::SetBaud(rate) = command {
            self.transport.set_baud_rate(rate)?;
            info!("{} switched to {} baud", self.transport.name(), rate);
        }
        Ok(())
    }

    pub fn send_request_config(&mut self) -> Result<(), DeviceError> {
        self.send(Command::RequestConfig)
    }

    pub fn send_request_shutdown(&mut self) -> Result<(), DeviceError> {
        self.send(Command::Shutdown)
    }

    pub fn send_request_hold(&mut self) -> Result<(), DeviceError> {
        self.send(Command::Hold)
    }

    pub fn send_request_reboot(&mut self) -> Result<(), DeviceError> {
        self.send(Command::Reboot)
    }

    pub fn send_change_baudrate(&mut self, baud_rate: u32) -> Result<(), DeviceError> {
        self.send(Command::SetBaud(baud_rate))
    }

    pub fn send_lcd_enable(&mut self, enable: bool) -> Result<(), DeviceError> {
        self.send(Command::SetLcd(enable))
    }

    pub fn send_dump_screen_enable(&mut self, enable: bool) -> Result<(), DeviceError> {
        self.send(Command::SetScreenDump(enable))
    }

    pub fn send_request_serial_number(&mut self) -> Result<(), DeviceError> {
        self.send(Command::RequestSerialNumber)
    }
}
