//! Line ending and control line translation between FidoNet and WWIV text.
//!
//! FidoNet bodies end lines with a bare CR and mark kludge lines with ^A.
//! WWIV bodies use CRLF and mark hidden control lines with ^D0. Both sides
//! work on raw bytes so 8-bit text passes through untouched.

use crate::packet::field::NetText;

/// FidoNet kludge marker.
const KLUDGE: &[u8] = b"\x01";
/// WWIV control line marker.
const CONTROL: &[u8] = b"\x04";
/// DOS end-of-file marker some editors leave at the end of a message.
const CPM_EOF: u8 = 0x1a;

/// Convert a FidoNet body to WWIV text.
pub fn fido_to_wwiv_text(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + text.len() / 32);
    for line in fido_lines(text) {
        if let Some(kludge) = line.strip_prefix(KLUDGE) {
            out.extend_from_slice(CONTROL);
            out.push(b'0');
            out.extend_from_slice(kludge);
        } else {
            out.extend_from_slice(line);
        }
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Convert a WWIV body to FidoNet text.
///
/// `^D0` lines become kludges, except routing and gateway address lines.
/// Other `^D` lines are dropped.
pub fn wwiv_to_fido_text(text: &[u8]) -> Vec<u8> {
    let end = text
        .iter()
        .rposition(|&b| b != CPM_EOF)
        .map_or(0, |last| last + 1);
    let text = &text[..end];

    let mut out = Vec::with_capacity(text.len());
    for line in text.split_inclusive(|&b| b == b'\n') {
        let line = trim_end(trim_end(line, b'\n'), b'\r');
        if let Some(control) = line.strip_prefix(CONTROL) {
            match control.strip_prefix(b"0") {
                Some(rest) if !is_wwivnet_only(rest) => {
                    out.extend_from_slice(KLUDGE);
                    out.extend_from_slice(rest);
                    out.push(b'\r');
                }
                _ => {}
            }
            continue;
        }
        out.extend_from_slice(line);
        out.push(b'\r');
    }
    out
}

/// Value of the `AREA:` line of an echomail body, if any.
pub fn echomail_area_name(text: &[u8]) -> Option<NetText> {
    fido_lines(text)
        .find_map(|line| line.strip_prefix(b"AREA:"))
        .map(|area| NetText::from(area.trim_ascii()))
}

/// Lines of a FidoNet body; CR terminates a line and LF is ignored.
fn fido_lines(text: &[u8]) -> impl Iterator<Item = &[u8]> {
    text.split_inclusive(|&b| b == b'\r')
        .map(|line| trim_start(trim_end(trim_end(line, b'\r'), b'\n'), b'\n'))
}

fn trim_end(mut bytes: &[u8], byte: u8) -> &[u8] {
    while let [rest @ .., last] = bytes {
        if *last != byte {
            break;
        }
        bytes = rest;
    }
    bytes
}

fn trim_start(mut bytes: &[u8], byte: u8) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if *first != byte {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Control lines that only mean something inside WWIVnet.
fn is_wwivnet_only(control: &[u8]) -> bool {
    control.starts_with(b"R ") || control.starts_with(b"FidoAddr:") || control.starts_with(CONTROL)
}
