use chrono::{DateTime, Utc};
use std::ffi::{OsStr, OsString};
use std::fmt::Write;
use std::fs::Metadata;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::fs::MetadataExt;
use std::str;

pub fn change_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
}

pub fn encode_name(name: &OsStr) -> String {
    let mut bytes = name.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    loop {
        match str::from_utf8(bytes) {
            Ok(valid) => {
                push_escaped(&mut out, valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                if let Ok(valid) = str::from_utf8(valid) {
                    push_escaped(&mut out, valid);
                }
                let bad = err.error_len().unwrap_or(rest.len());
                for byte in &rest[..bad] {
                    let _ = write!(out, "\\x{:02x}", byte);
                }
                bytes = &rest[bad..];
            }
        }
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == '\\' {
            out.push_str("\\\\");
        } else {
            out.push(ch);
        }
    }
}

/// Unknown escapes are kept as written.
pub fn decode_name(name: &str) -> OsString {
    let src = name.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        if src[i] == b'\\' {
            match src.get(i + 1) {
                Some(b'\\') => {
                    out.push(b'\\');
                    i += 2;
                    continue;
                }
                Some(b'x') => {
                    if let Some(byte) = src.get(i + 2..i + 4).and_then(hex_byte) {
                        out.push(byte);
                        i += 4;
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push(src[i]);
        i += 1;
    }
    OsString::from_vec(out)
}

fn hex_byte(digits: &[u8]) -> Option<u8> {
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u8::from_str_radix(str::from_utf8(digits).ok()?, 16).ok()
}
