#[cfg(unix)]
pub mod unix;

use chrono::{DateTime, Utc};
use std::ffi::{OsStr, OsString};
use std::fs::Metadata;

/// Returns `(mtime, ctime)` for a file.
///
/// On Unix `ctime` is the inode change time. Elsewhere the creation time
/// stands in for it, falling back to `mtime` when the filesystem has none.
pub fn file_times(metadata: &Metadata) -> (DateTime<Utc>, DateTime<Utc>) {
    let mtime = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    (mtime, change_time(metadata).unwrap_or(mtime))
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    unix::change_time(metadata)
}

#[cfg(not(unix))]
fn change_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    metadata.created().ok().map(DateTime::<Utc>::from)
}

/// Text form of one path component, used in record identities.
///
/// On Unix the mapping is reversible: bytes that are not valid UTF-8 are
/// written as `\xNN` and a literal backslash as `\\`. Elsewhere names are
/// converted lossily.
#[cfg(unix)]
pub fn name_to_string(name: &OsStr) -> String {
    unix::encode_name(name)
}

#[cfg(not(unix))]
pub fn name_to_string(name: &OsStr) -> String {
    name.to_string_lossy().into_owned()
}

/// Inverse of `name_to_string`.
#[cfg(unix)]
pub fn name_from_string(name: &str) -> OsString {
    unix::decode_name(name)
}

#[cfg(not(unix))]
pub fn name_from_string(name: &str) -> OsString {
    OsString::from(name)
}
