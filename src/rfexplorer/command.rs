//! Outbound command encoding.
//!
//! Commands are ASCII text framed as `#` + length byte + text + CRLF, where the length byte
//! counts the text plus the two leading framing bytes.
use std::fmt;
use thiserror::Error;

/// Baud rates the analyzer accepts; a baud change is sent as an index into this list.
pub const BAUD_RATES: [u32; 9] = [500000, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Encoded commands must stay below this many bytes.
pub const MAX_ENCODED_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command too long ({len} bytes): {text:?}")]
    TooLong { text: String, len: usize },

    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),

    #[error("unknown command {0:?}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RequestConfig,
    Shutdown,
    Hold,
    Reboot,
    /// Switch the device to a new rate; the local port must follow.
    SetBaud(u32),
    SetLcd(bool),
    SetScreenDump(bool),
    RequestSerialNumber,
}

fn flag(enable: bool) -> char {
    if enable {
        '1'
    } else {
        '0'
    }
}

impl Command {
    /// Wire text of the command, before framing.
    pub fn text(&self) -> Result<String, CommandError> {
        Ok(match self {
            Command::RequestConfig => "C0".to_string(),
            Command::Shutdown => "S".to_string(),
            Command::Hold => "CH".to_string(),
            Command::Reboot => "r".to_string(),
            Command::SetBaud(rate) => {
                let index = BAUD_RATES
                    .iter()
                    .position(|r| r == rate)
                    .ok_or(CommandError::UnsupportedBaud(*rate))?;
                format!("c{}", index)
            }
            Command::SetLcd(enable) => format!("L{}", flag(*enable)),
            Command::SetScreenDump(enable) => format!("D{}", flag(*enable)),
            Command::RequestSerialNumber => "Cn".to_string(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, CommandError> {
        encode_text(&self.text()?)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::RequestConfig => write!(f, "config"),
            Command::Shutdown => write!(f, "shutdown"),
            Command::Hold => write!(f, "hold"),
            Command::Reboot => write!(f, "reboot"),
            Command::SetBaud(rate) => write!(f, "baud={}", rate),
            Command::SetLcd(true) => write!(f, "lcd-on"),
            Command::SetLcd(false) => write!(f, "lcd-off"),
            Command::SetScreenDump(true) => write!(f, "dump-on"),
            Command::SetScreenDump(false) => write!(f, "dump-off"),
            Command::RequestSerialNumber => write!(f, "serial"),
        }
    }
}

impl std::str::FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || CommandError::Unknown(s.to_string());
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "config" => Command::RequestConfig,
            "shutdown" => Command::Shutdown,
            "hold" => Command::Hold,
            "reboot" => Command::Reboot,
            "lcd-on" => Command::SetLcd(true),
            "lcd-off" => Command::SetLcd(false),
            "dump-on" => Command::SetScreenDump(true),
            "dump-off" => Command::SetScreenDump(false),
            "serial" => Command::RequestSerialNumber,
            other => {
                let rate = other
                    .strip_prefix("baud=")
                    .and_then(|r| r.parse::<u32>().ok())
                    .ok_or_else(unknown)?;
                if !BAUD_RATES.contains(&rate) {
                    return Err(CommandError::UnsupportedBaud(rate));
                }
                Command::SetBaud(rate)
            }
        })
    }
}

/// Frame arbitrary ASCII command text.
pub fn encode_text(text: &str) -> Result<Vec<u8>, CommandError> {
    let data = text.as_bytes();
    let declared = data.len() + 2;
    if declared >= MAX_ENCODED_LEN {
        return Err(CommandError::TooLong {
            text: text.to_string(),
            len: declared,
        });
    }
    let mut out = Vec::with_capacity(declared + 2);
    out.push(b'#');
    out.push(declared as u8);
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    Ok(out)
}
