//! Per-connection decode loop and the device state it maintains.
use chrono::Local;
use log::{debug, warn};

use super::framer::{Frame, FrameDecoder, FramerEvent, SCREEN_DUMP_SIZE};
use super::records::{parse_tracking_status, Configuration, Setup, TextRecord};
use super::sweep::Sweep;
use crate::logutil::escape_bytes;
use crate::metrics::DecodeCounters;

/// Last known device state plus the queue of completed sweeps.
#[derive(Debug, Clone, Default)]
pub struct CommunicatorState {
    pub serial_number: Option<String>,
    pub setup: Option<Setup>,
    pub configuration: Option<Configuration>,
    pub tracking_status: Option<bool>,
    pub screen_data: Option<Box<[u8; SCREEN_DUMP_SIZE]>>,
    /// Completed sweeps in arrival order; the caller is expected to drain them.
    pub sweeps: Vec<Sweep>,
}

impl CommunicatorState {
    pub fn drain_sweeps(&mut self) -> Vec<Sweep> {
        std::mem::take(&mut self.sweeps)
    }
}

/// State change produced by one decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    SerialNumber(String),
    Setup(Setup),
    /// A configuration record replaced the previous one. `changed` is false when the new
    /// record equals the one already in force.
    Configuration { config: Configuration, changed: bool },
    TrackingStatus(bool),
    ScreenDump,
    Sweep(Sweep),
}

/// Owns the receive buffer and the device state for one connection.
#[derive(Debug, Default)]
pub struct Decoder {
    framer: FrameDecoder,
    state: CommunicatorState,
    counters: DecodeCounters,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CommunicatorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CommunicatorState {
        &mut self.state
    }

    pub fn counters(&self) -> DecodeCounters {
        self.counters
    }

    /// Bytes buffered but not yet attributed to a frame.
    pub fn pending(&self) -> &[u8] {
        self.framer.pending()
    }

    /// Ingest a chunk and decode as many frames as the buffer allows.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<Update> {
        self.framer.push(chunk);
        let mut updates = Vec::new();
        while let Some(event) = self.framer.next_event() {
            match event {
                FramerEvent::Garbage(bytes) => {
                    self.counters.add_garbage(bytes.len());
                    debug!("*** Skipped RFE data {}", escape_bytes(&bytes));
                }
                FramerEvent::Unterminated { header } => {
                    self.counters.inc_unterminated();
                    warn!("*** Unterminated RFE frame {}", escape_bytes(&header));
                }
                FramerEvent::Frame(frame) => {
                    self.counters.inc_frames_decoded();
                    if let Some(update) = self.interpret(frame) {
                        updates.push(update);
                    }
                }
            }
        }
        updates
    }

    fn interpret(&mut self, frame: Frame) -> Option<Update> {
        match frame {
            Frame::ScreenDump(body) => {
                let bitmap: Box<[u8; SCREEN_DUMP_SIZE]> = body.into_boxed_slice().try_into().ok()?;
                self.state.screen_data = Some(bitmap);
                debug!("<== screen dump");
                Some(Update::ScreenDump)
            }
            Frame::Sweep(data) => self.add_sweep(&data),
            Frame::Text(text) => self.interpret_text(&text),
            Frame::Reserved(header) => {
                self.counters.inc_reserved();
                debug!("<== ignored RFE frame {}", escape_bytes(&header));
                None
            }
        }
    }

    fn interpret_text(&mut self, text: &str) -> Option<Update> {
        match TextRecord::classify(text) {
            TextRecord::Identity(serial) => {
                self.state.serial_number = Some(serial.to_string());
                debug!("<== S/N {}", serial);
                Some(Update::SerialNumber(serial.to_string()))
            }
            TextRecord::Setup(payload) => {
                let setup = Setup::parse(payload);
                debug!("<== {:?}", setup);
                self.state.setup = Some(setup.clone());
                Some(Update::Setup(setup))
            }
            TextRecord::Configuration(payload) => match Configuration::parse(payload) {
                Ok(config) => {
                    let changed = self.state.configuration.as_ref() != Some(&config);
                    debug!("<== {:?}", config);
                    self.state.configuration = Some(config.clone());
                    Some(Update::Configuration { config, changed })
                }
                Err(e) => {
                    self.counters.inc_bad_configuration();
                    warn!("*** Bad RFE config {:?}: {}", text, e);
                    None
                }
            },
            TextRecord::TrackingStatus(payload) => match parse_tracking_status(payload) {
                Some(status) => {
                    self.state.tracking_status = Some(status);
                    debug!("<== tracking status {}", status);
                    Some(Update::TrackingStatus(status))
                }
                None => {
                    self.counters.inc_unknown_text();
                    warn!("*** Bad RFE tracking status {:?}", text);
                    None
                }
            },
            TextRecord::Unknown(_) => {
                self.counters.inc_unknown_text();
                debug!("*** Unknown RFE text {:?}", text);
                None
            }
        }
    }

    fn add_sweep(&mut self, data: &[u8]) -> Option<Update> {
        match Sweep::build(self.state.configuration.as_ref(), data, Local::now()) {
            Ok(sweep) => {
                self.counters.inc_sweeps_built();
                if sweep.len() != data.len() {
                    self.counters.inc_sweeps_collapsed();
                    warn!(
                        "*** RFE sweep of {} points covers only {} distinct frequencies",
                        data.len(),
                        sweep.len()
                    );
                }
                debug!("<== sweep of {} points", sweep.len());
                self.state.sweeps.push(sweep.clone());
                Some(Update::Sweep(sweep))
            }
            Err(e) => {
                self.counters.inc_sweeps_discarded();
                warn!("*** Dropped RFE sweep: {}", e);
                None
            }
        }
    }
}
