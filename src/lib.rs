//! # rfexplorer-logger - Sweep logging for RF Explorer spectrum analyzers
//!
//! Decodes the serial telemetry of an RF Explorer handheld spectrum analyzer into structured
//! records (device identity, acquisition configuration, amplitude sweeps) and logs the sweeps
//! as a timestamped CSV table.
//!
//! ## Features
//!
//! - **Incremental Decoding**: Frames are recovered from arbitrarily chunked input, with garbage
//!   skipping and resynchronization after corrupt bodies.
//! - **Stateful Sweeps**: Sweep payloads are interpreted under the most recent configuration
//!   record, with frequencies scaled to Hz.
//! - **Command Encoding**: Configuration, hold, reboot, shutdown, baud rate, LCD and screen
//!   dump commands.
//! - **Sweep Table**: One CSV row per sweep, one column per frequency.
//!
//! ## Quick Start
//!
//! ```rust
//! use rfexplorer_logger::rfexplorer::{Decoder, Update};
//!
//! let mut decoder = Decoder::new();
//! decoder.process(b"#C2-F:0096000,0000001,-010,-120,0003,0,000,0000015,0002700,0600000,00000,-005,0000\r\n");
//! let updates = decoder.process(&[b'$', b'S', 3, 10, 20, 30, b'\r', b'\n']);
//! assert!(matches!(updates[0], Update::Sweep(_)));
//! assert_eq!(decoder.state().sweeps.len(), 1);
//! ```
//!
//! ## Module Organization
//!
//! - [`rfexplorer`] - Frame decoding, device state, commands and transport
//! - [`sweeplog`] - CSV sweep table writer
//! - [`config`] - Configuration management and validation
//! - [`metrics`] - Per-decoder counters
//! - [`logutil`] - Log-safe rendering of raw bytes

pub mod config;
pub mod logutil;
pub mod metrics;
pub mod rfexplorer;
pub mod sweeplog;
