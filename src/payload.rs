//! Uplink payload rendering
//!
//! Builds the `{"name":...,"msg":...}` JSON object the shuttle forwards and
//! keeps raw control bytes out of it. The register frame has no escaping of
//! its own, so a stray newline inside the payload would corrupt the uplink.

use crate::config::payload::RENDER_CAPACITY;
use heapless::Vec;

/// Render one key/content pair as a JSON payload.
///
/// Both strings are escaped, then any remaining raw control bytes are
/// stripped. The result may exceed one register frame; the codec clamps it.
pub fn render(name: &str, msg: &str) -> Vec<u8, RENDER_CAPACITY> {
    let mut out: Vec<u8, RENDER_CAPACITY> = Vec::new();

    let _ = out.extend_from_slice(b"{\"name\":\"");
    push_escaped(&mut out, name);
    let _ = out.extend_from_slice(b"\",\"msg\":\"");
    push_escaped(&mut out, msg);
    let _ = out.extend_from_slice(b"\"}");

    strip_control_bytes(&mut out);
    out
}

/// Append a string with JSON escaping.
///
/// Quotes and backslashes are escaped so arbitrary input cannot break out of
/// the enclosing string; control characters become escape sequences.
fn push_escaped<const N: usize>(out: &mut Vec<u8, N>, text: &str) {
    for &byte in text.as_bytes() {
        match byte {
            b'"' => {
                let _ = out.extend_from_slice(b"\\\"");
            }
            b'\\' => {
                let _ = out.extend_from_slice(b"\\\\");
            }
            b'\n' => {
                let _ = out.extend_from_slice(b"\\n");
            }
            b'\r' => {
                let _ = out.extend_from_slice(b"\\r");
            }
            b'\t' => {
                let _ = out.extend_from_slice(b"\\t");
            }
            0x00..=0x1F => {
                let _ = out.extend_from_slice(b"\\u00");
                let _ = out.push(hex_digit(byte >> 4));
                let _ = out.push(hex_digit(byte & 0x0F));
            }
            _ => {
                let _ = out.push(byte);
            }
        }
    }
}

fn hex_digit(nibble: u8) -> u8 {
    match nibble {
        0..=9 => b'0' + nibble,
        _ => b'a' + (nibble - 10),
    }
}

/// Remove every raw newline, carriage return and tab byte in place,
/// preserving all other bytes and their order.
pub fn strip_control_bytes<const N: usize>(buf: &mut Vec<u8, N>) {
    let mut kept = 0;
    for index in 0..buf.len() {
        let byte = buf[index];
        if byte != b'\n' && byte != b'\r' && byte != b'\t' {
            buf[kept] = byte;
            kept += 1;
        }
    }
    buf.truncate(kept);
}
