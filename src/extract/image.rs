use exif::{Context, Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{has_extension, Stage, StageKind};
use crate::error::ExtractionError;
use crate::model::{FileRecord, ImageMetadata};

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "tif", "tiff", "heic", "heif", "png", "webp",
];

/// Larger `UNDEFINED` blobs are vendor binary and not worth storing.
const MAX_UNDEFINED_LEN: usize = 64;

/// Offsets, pointers and vendor blobs that say nothing about the image.
const STRIPPED_TAGS: &[Tag] = &[
    Tag::MakerNote,
    Tag::GPSProcessingMethod,
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
];

pub fn read_image_metadata(path: &Path) -> Result<ImageMetadata, ExtractionError> {
    let file = File::open(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|source| ExtractionError::Exif {
            path: path.to_path_buf(),
            source,
        })?;

    let fields = exif
        .fields()
        .filter(|field| keep_field(field))
        .map(|field| {
            (
                field.tag.to_string(),
                field.display_value().with_unit(&exif).to_string(),
            )
        })
        .collect();
    Ok(ImageMetadata { fields })
}

/// Primary-image fields only, minus thumbnails, maker notes, raw GPS
/// processing bytes, interoperability data and oversized binary values.
pub fn keep_field(field: &Field) -> bool {
    if field.ifd_num != In::PRIMARY {
        return false;
    }
    if field.tag.context() == Context::Interop || STRIPPED_TAGS.contains(&field.tag) {
        return false;
    }
    !matches!(&field.value, Value::Undefined(bytes, _) if bytes.len() > MAX_UNDEFINED_LEN)
}

pub struct ImageMetadataStage;

impl Stage for ImageMetadataStage {
    fn kind(&self) -> StageKind {
        StageKind::ImageMetadata
    }

    fn applies_to(&self, record: &FileRecord) -> bool {
        has_extension(record, IMAGE_EXTENSIONS)
    }

    fn is_done(&self, record: &FileRecord) -> bool {
        record.image_metadata.is_some()
    }

    fn apply(&self, path: &Path, record: &mut FileRecord) -> Result<(), ExtractionError> {
        record.image_metadata = Some(read_image_metadata(path)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn field(tag: Tag, ifd_num: In, value: Value) -> Field {
        Field {
            tag,
            ifd_num,
            value,
        }
    }

    fn ascii(text: &str) -> Value {
        Value::Ascii(vec![text.as_bytes().to_vec()])
    }

    /// Little-endian TIFF with a single IFD holding `Make` and a thumbnail offset.
    fn tiny_tiff() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"II*\0");
        bytes.extend_from_slice(&8u32.to_le_bytes());
        // IFD0: 2 entries
        bytes.extend_from_slice(&2u16.to_le_bytes());
        // Make, ASCII, 6 chars at offset 38
        bytes.extend_from_slice(&0x010Fu16.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&6u32.to_le_bytes());
        bytes.extend_from_slice(&38u32.to_le_bytes());
        // JPEGInterchangeFormat, LONG, 1
        bytes.extend_from_slice(&0x0201u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        // no next IFD
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(bytes.len(), 38);
        bytes.extend_from_slice(b"Canon\0");
        bytes
    }

    #[test]
    fn test_keep_field_strips_thumbnail_and_opaque_data() {
        assert!(keep_field(&field(Tag::Make, In::PRIMARY, ascii("Canon"))));
        assert!(!keep_field(&field(Tag::Make, In::THUMBNAIL, ascii("Canon"))));
        assert!(!keep_field(&field(
            Tag::MakerNote,
            In::PRIMARY,
            Value::Undefined(vec![1, 2, 3], 0)
        )));
        assert!(!keep_field(&field(
            Tag::GPSProcessingMethod,
            In::PRIMARY,
            Value::Undefined(b"ASCII\0\0\0GPS".to_vec(), 0)
        )));
        assert!(!keep_field(&field(
            Tag::InteroperabilityIndex,
            In::PRIMARY,
            ascii("R98")
        )));
        assert!(!keep_field(&field(
            Tag::UserComment,
            In::PRIMARY,
            Value::Undefined(vec![0; MAX_UNDEFINED_LEN + 1], 0)
        )));
        assert!(keep_field(&field(
            Tag::ExifVersion,
            In::PRIMARY,
            Value::Undefined(b"0232".to_vec(), 0)
        )));
    }

    #[test]
    fn test_read_image_metadata_from_tiff() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.tif");
        fs::write(&path, tiny_tiff()).unwrap();

        let metadata = read_image_metadata(&path).unwrap();
        let make = metadata.fields.get("Make").expect("Make field");
        assert!(make.contains("Canon"));
        assert!(!metadata.fields.contains_key("JPEGInterchangeFormat"));
    }

    #[test]
    fn test_non_image_is_extraction_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            read_image_metadata(&path),
            Err(ExtractionError::Exif { .. })
        ));
    }
}
