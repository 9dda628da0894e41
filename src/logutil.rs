//! Logging utilities for rendering raw serial bytes on a single log line.

const MAX_PREVIEW: usize = 96;

/// Render bytes for single-line logging:
/// - printable ASCII is kept
/// - `\r`, `\n`, `\t` and backslash are escaped
/// - everything else becomes `\xNN`
///
/// Long inputs are cut at `MAX_PREVIEW` bytes with an ellipsis and the total length.
pub fn escape_bytes(data: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(data.len().min(MAX_PREVIEW) + 16);
    for &b in data.iter().take(MAX_PREVIEW) {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(&mut out, "\\x{:02X}", b);
            }
        }
    }
    if data.len() > MAX_PREVIEW {
        let _ = write!(&mut out, "… ({} bytes)", data.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_bytes;

    #[test]
    fn escapes_control_and_binary() {
        assert_eq!(escape_bytes(b"#K1\r\n"), "#K1\\r\\n");
        assert_eq!(escape_bytes(&[b'$', b'S', 3, 0xFF]), "$S\\x03\\xFF");
    }

    #[test]
    fn truncates_long_input() {
        let data = vec![b'a'; 200];
        let esc = escape_bytes(&data);
        assert!(esc.starts_with(&"a".repeat(96)));
        assert!(esc.ends_with("… (200 bytes)"));
    }
}
