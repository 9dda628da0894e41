//! Incremental frame decoder for the RF Explorer serial link.
//!
//! The analyzer interleaves several frame shapes on one byte stream:
//!
//! | header          | body                                               |
//! |-----------------|----------------------------------------------------|
//! | `$C` + 3 bytes  | none (recognized, not decoded)                     |
//! | `$D`            | 1024-byte screen bitmap, then CRLF                 |
//! | `$q` + 1 byte   | none (recognized, not decoded)                     |
//! | `$Q` + 2 bytes  | none (recognized, not decoded)                     |
//! | `$S` + len      | `len` amplitude bytes, then CRLF                   |
//! | `$s` + n        | `(n or 256) * 16` amplitude bytes, then CRLF       |
//! | `$z` + hi, lo   | `hi * 256 + lo` amplitude bytes, then CRLF         |
//! | `#` ... CRLF    | ASCII text, self-delimited                         |
//! | `#` + len       | `len - 2` bytes of command text, then CRLF         |
//!
//! [`FrameDecoder`] can be fed arbitrary chunks and yields one [`FramerEvent`] at a time. The
//! earliest header in the buffer wins; anything in front of it is reported as garbage and
//! dropped before any body is extracted. Matching waits while a candidate at an earlier
//! offset is still undecided. A declared-length body that is not followed by CRLF
//! is treated as bogus: only its header is dropped and the following bytes are rescanned.
use super::buffer::FrameBuffer;

/// Size of a `$D` screen dump body (128 x 64 pixels, one bit each).
pub const SCREEN_DUMP_SIZE: usize = 128 * 8;

const TERMINATOR: &[u8; 2] = b"\r\n";

/// What a recognized header announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// `$C`, `$q` or `$Q`: complete once the header is present.
    Reserved,
    ScreenDump,
    Sweep { body_len: usize },
    /// `#...\r\n`; the header spans the whole frame. `prefixed` frames carry a length byte
    /// after the `#`, as outbound commands do.
    Text { prefixed: bool },
}

/// A header located in the buffered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Number of unmatched bytes in front of the header.
    pub offset: usize,
    /// Header length in bytes, not counting any declared body.
    pub len: usize,
    pub kind: HeaderKind,
}

/// A fully extracted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    ScreenDump(Vec<u8>),
    /// Raw amplitude bytes from `$S`, `$s` or `$z`.
    Sweep(Vec<u8>),
    /// Text between `#` and CRLF, non-ASCII bytes replaced.
    Text(String),
    /// Header bytes of a recognized but undecoded frame.
    Reserved(Vec<u8>),
}

/// One step of progress through the buffered bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramerEvent {
    /// Bytes that precede the next recognizable header.
    Garbage(Vec<u8>),
    Frame(Frame),
    /// A declared-length body was not followed by CRLF; its header was dropped.
    Unterminated { header: Vec<u8> },
}

/// Result of testing one buffer offset for a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan<T> {
    Found(T),
    /// No frame starts here, whatever bytes follow.
    Rejected,
    /// The bytes so far could still start a frame.
    Incomplete,
}

/// Locate the earliest recognizable header in `data`.
///
/// The scan stops at the first offset that cannot be decided yet, so a header further on is
/// never preferred over one that later input may complete. This keeps the result independent
/// of how the stream was chunked.
pub fn find_header(data: &[u8]) -> Option<Header> {
    for offset in 0..data.len() {
        match header_at(&data[offset..]) {
            Scan::Found((len, kind)) => return Some(Header { offset, len, kind }),
            Scan::Incomplete => return None,
            Scan::Rejected => {}
        }
    }
    None
}

fn header_at(rest: &[u8]) -> Scan<(usize, HeaderKind)> {
    match rest[0] {
        b'#' => match text_frame(rest) {
            Scan::Found((len, prefixed)) => Scan::Found((len, HeaderKind::Text { prefixed })),
            Scan::Rejected => Scan::Rejected,
            Scan::Incomplete => Scan::Incomplete,
        },
        b'$' => {
            let tag = match rest.get(1) {
                Some(&tag) => tag,
                None => return Scan::Incomplete,
            };
            let arg_len = match tag {
                b'C' => 3,
                b'D' => 0,
                b'q' | b'S' | b's' => 1,
                b'Q' | b'z' => 2,
                _ => return Scan::Rejected,
            };
            let len = 2 + arg_len;
            let args = match rest.get(2..len) {
                Some(args) => args,
                None => return Scan::Incomplete,
            };
            let kind = match tag {
                b'D' => HeaderKind::ScreenDump,
                b'S' => HeaderKind::Sweep {
                    body_len: args[0] as usize,
                },
                b's' => {
                    let blocks = if args[0] == 0 { 256 } else { args[0] as usize };
                    HeaderKind::Sweep {
                        body_len: blocks * 16,
                    }
                }
                b'z' => HeaderKind::Sweep {
                    body_len: (args[0] as usize) << 8 | args[1] as usize,
                },
                _ => HeaderKind::Reserved,
            };
            Scan::Found((len, kind))
        }
        _ => Scan::Rejected,
    }
}

/// Length of a `#` frame including its CRLF, and whether its second byte is a length byte
/// (`#` + len + text + CRLF with len = text + 2).
///
/// Apart from a leading length byte, the text may not contain a line feed. A length byte of
/// `\n` is only accepted when the frame ends exactly where it says.
fn text_frame(rest: &[u8]) -> Scan<(usize, bool)> {
    let declared = match rest.get(1) {
        Some(&b) => b as usize,
        None => return Scan::Incomplete,
    };
    let from = if declared == b'\n' as usize { 2 } else { 1 };
    let nl = match rest[from..].iter().position(|&b| b == b'\n') {
        Some(pos) => from + pos,
        None => return Scan::Incomplete,
    };
    if nl < 2 || rest[nl - 1] != b'\r' {
        return Scan::Rejected;
    }
    let prefixed = declared >= 2 && nl == declared + 1;
    if from == 2 && !prefixed {
        return Scan::Rejected;
    }
    Scan::Found((nl + 1, prefixed))
}

fn decode_ascii(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

/// Device text is trimmed; length-prefixed text is kept verbatim.
fn decode_text(raw: &[u8], prefixed: bool) -> String {
    if prefixed {
        decode_ascii(&raw[2..])
    } else {
        decode_ascii(&raw[1..])
            .trim_matches(|c: char| c.is_ascii_whitespace())
            .to_string()
    }
}

/// Stateful decoder over the receive buffer.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: FrameBuffer,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buf: FrameBuffer::new(),
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.ingest(data);
    }

    /// Bytes received but not yet attributed to a frame or to garbage.
    pub fn pending(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Make one step of progress. Returns None when more input is needed.
    pub fn next_event(&mut self) -> Option<FramerEvent> {
        let header = find_header(self.buf.as_slice())?;
        if header.offset > 0 {
            return Some(FramerEvent::Garbage(self.buf.take(header.offset)));
        }
        match header.kind {
            HeaderKind::Reserved => Some(FramerEvent::Frame(Frame::Reserved(
                self.buf.take(header.len),
            ))),
            HeaderKind::Text { prefixed } => {
                let raw = self.buf.take(header.len);
                let frame = &raw[..raw.len() - TERMINATOR.len()];
                Some(FramerEvent::Frame(Frame::Text(decode_text(frame, prefixed))))
            }
            HeaderKind::ScreenDump => self
                .take_body(header.len, SCREEN_DUMP_SIZE)
                .map(|r| r.map(Frame::ScreenDump)),
            HeaderKind::Sweep { body_len } => self
                .take_body(header.len, body_len)
                .map(|r| r.map(Frame::Sweep)),
        }
    }

    /// Extract a declared-length body sitting behind a header at the front of the buffer.
    fn take_body(&mut self, header_len: usize, size: usize) -> Option<BodyResult> {
        let data = self.buf.as_slice();
        let end = header_len + size;
        if data.len() < end + TERMINATOR.len() {
            return None;
        }
        if &data[end..end + TERMINATOR.len()] != TERMINATOR {
            return Some(BodyResult::Unterminated(self.buf.take(header_len)));
        }
        self.buf.consume(header_len);
        let body = self.buf.take(size);
        self.buf.consume(TERMINATOR.len());
        Some(BodyResult::Body(body))
    }
}

enum BodyResult {
    Body(Vec<u8>),
    Unterminated(Vec<u8>),
}

impl BodyResult {
    fn map(self, f: impl FnOnce(Vec<u8>) -> Frame) -> FramerEvent {
        match self {
            BodyResult::Body(body) => FramerEvent::Frame(f(body)),
            BodyResult::Unterminated(header) => FramerEvent::Unterminated { header },
        }
    }
}
