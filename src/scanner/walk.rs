use std::fs::{FileType, Metadata};
use std::path::Path;
use walkdir::WalkDir;

use crate::platform;

/// Kind of a non-regular, non-directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    BlockDevice,
    CharacterDevice,
    Fifo,
    Socket,
    Unknown,
}

impl SpecialKind {
    #[cfg(unix)]
    fn of(file_type: &FileType) -> Self {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_block_device() {
            SpecialKind::BlockDevice
        } else if file_type.is_char_device() {
            SpecialKind::CharacterDevice
        } else if file_type.is_fifo() {
            SpecialKind::Fifo
        } else if file_type.is_socket() {
            SpecialKind::Socket
        } else {
            SpecialKind::Unknown
        }
    }

    #[cfg(not(unix))]
    fn of(_file_type: &FileType) -> Self {
        SpecialKind::Unknown
    }
}

/// One step of a depth-first walk.
#[derive(Debug)]
pub enum WalkEvent<'a> {
    /// A directory that passed the pre-descent veto and will be entered.
    Directory { path: &'a Path, relative_name: &'a str },
    File {
        path: &'a Path,
        relative_name: &'a str,
        metadata: Metadata,
    },
    Symlink { path: &'a Path },
    Special { path: &'a Path, kind: SpecialKind },
    /// Traversal failed; the walk stops after this event.
    Error { error: walkdir::Error },
    End,
}

/// What the visitor wants after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Walk `root` depth-first with entries sorted by file name, so discovery
/// order is deterministic.
///
/// `prune` is asked before descending into every directory below the root,
/// with its root-relative name; a vetoed directory is never read. Symlinks
/// are reported, not followed.
pub fn walk<P, V>(root: &Path, mut prune: P, mut visit: V)
where
    P: FnMut(&str) -> bool,
    V: FnMut(WalkEvent<'_>) -> Flow,
{
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            !prune(&relative_name(root, entry.path()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                visit(WalkEvent::Error { error });
                return;
            }
        };

        let file_type = entry.file_type();
        let path = entry.path();
        let flow = if file_type.is_dir() {
            let relative = relative_name(root, path);
            visit(WalkEvent::Directory {
                path,
                relative_name: &relative,
            })
        } else if file_type.is_file() {
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(error) => {
                    visit(WalkEvent::Error { error });
                    return;
                }
            };
            let relative = relative_name(root, path);
            visit(WalkEvent::File {
                path,
                relative_name: &relative,
                metadata,
            })
        } else if file_type.is_symlink() {
            visit(WalkEvent::Symlink { path })
        } else {
            visit(WalkEvent::Special {
                path,
                kind: SpecialKind::of(&file_type),
            })
        };

        if flow == Flow::Stop {
            return;
        }
    }

    visit(WalkEvent::End);
}

/// `path` relative to `root`, `/` separated. Empty for the root itself.
/// Components go through `platform::name_to_string`.
pub fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| platform::name_to_string(c.as_os_str()))
        .collect::<Vec<_>>()
        .join("/")
}
