use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::Path;

use super::{has_extension, Stage, StageKind};
use crate::error::ExtractionError;
use crate::model::{AudioTags, FileRecord};

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "m4a", "mp4", "aac", "ogg", "oga", "opus", "wav", "aiff", "aif", "ape", "wv",
    "wma",
];

/// Read title/artist/album/year from the primary tag, else the first tag.
pub fn read_audio_tags(path: &Path) -> Result<AudioTags, ExtractionError> {
    let tag_error = |source| ExtractionError::AudioTags {
        path: path.to_path_buf(),
        source,
    };
    let tagged_file = Probe::open(path)
        .map_err(tag_error)?
        .read()
        .map_err(tag_error)?;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .ok_or_else(|| ExtractionError::NoTags(path.to_path_buf()))?;

    Ok(AudioTags {
        title: tag.title().as_deref().and_then(clean_text),
        artist: tag.artist().as_deref().and_then(clean_text),
        album: tag.album().as_deref().and_then(clean_text),
        year: tag.year(),
    })
}

/// Drop embedded NULs (padding in some ID3 frames) and surrounding space.
fn clean_text(raw: &str) -> Option<String> {
    let text: String = raw.chars().filter(|c| *c != '\0').collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub struct AudioTagStage;

impl Stage for AudioTagStage {
    fn kind(&self) -> StageKind {
        StageKind::AudioTags
    }

    fn applies_to(&self, record: &FileRecord) -> bool {
        has_extension(record, AUDIO_EXTENSIONS)
    }

    fn is_done(&self, record: &FileRecord) -> bool {
        record.audio_tags.is_some()
    }

    fn apply(&self, path: &Path, record: &mut FileRecord) -> Result<(), ExtractionError> {
        record.audio_tags = Some(read_audio_tags(path)?);
        Ok(())
    }
}
