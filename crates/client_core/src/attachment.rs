//! Profile picture capture from a drop or file picker.

use std::{path::Path, sync::Arc};

use thiserror::Error;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("no file was dropped")]
    Empty,
    #[error("only one picture can be attached, got {count}")]
    Multiple { count: usize },
    #[error("unsupported picture type for {filename}; expected .jpg, .jpeg or .png")]
    UnsupportedType { filename: String },
    #[error("pictures can only be attached while registering")]
    WrongMode,
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
}

/// A file handed over by the drop zone, before any checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub filename: String,
    pub bytes: Arc<[u8]>,
}

impl DroppedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| AttachmentError::Read {
                path: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| AttachmentError::Read {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self::new(filename, bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    bytes: Arc<[u8]>,
    filename: String,
    mime_type: String,
}

impl Attachment {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn has_accepted_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}

/// Accepts a single `.jpg`, `.jpeg` or `.png` file. Dropping several files at
/// once is rejected as a whole; nothing is kept from such a drop.
pub fn accept(mut files: Vec<DroppedFile>) -> Result<Attachment, AttachmentError> {
    let file = match files.len() {
        0 => return Err(AttachmentError::Empty),
        1 => files.remove(0),
        count => return Err(AttachmentError::Multiple { count }),
    };

    if !has_accepted_extension(&file.filename) {
        return Err(AttachmentError::UnsupportedType {
            filename: file.filename,
        });
    }

    let mime_type = mime_guess::from_path(&file.filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(Attachment {
        bytes: file.bytes,
        filename: file.filename,
        mime_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn accepts_single_png_with_mime_type() {
        let attachment =
            accept(vec![DroppedFile::new("avatar.PNG", b"\x89PNG".to_vec())]).expect("accept");
        assert_eq!(attachment.filename(), "avatar.PNG");
        assert_eq!(attachment.mime_type(), "image/png");
        assert_eq!(attachment.bytes(), b"\x89PNG");
    }

    #[test]
    fn jpg_and_jpeg_map_to_jpeg_mime() {
        for name in ["a.jpg", "b.jpeg"] {
            let attachment = accept(vec![DroppedFile::new(name, vec![1u8])]).expect("accept");
            assert_eq!(attachment.mime_type(), "image/jpeg");
        }
    }

    #[test]
    fn rejects_other_extensions() {
        for name in ["notes.txt", "anim.gif", "noext", "png"] {
            let err = accept(vec![DroppedFile::new(name, vec![0u8])]).expect_err("reject");
            assert_eq!(
                err,
                AttachmentError::UnsupportedType {
                    filename: name.to_string()
                }
            );
        }
    }

    #[test]
    fn rejects_multiple_files_entirely() {
        let err = accept(vec![
            DroppedFile::new("a.png", vec![1u8]),
            DroppedFile::new("b.png", vec![2u8]),
        ])
        .expect_err("reject");
        assert_eq!(err, AttachmentError::Multiple { count: 2 });
    }

    #[test]
    fn rejects_empty_drop() {
        assert_eq!(accept(Vec::new()), Err(AttachmentError::Empty));
    }

    #[tokio::test]
    async fn reads_dropped_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("me.jpeg");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(b"jpeg-bytes").expect("write");
        drop(file);

        let dropped = DroppedFile::read(&path).await.expect("read");
        assert_eq!(dropped.filename, "me.jpeg");
        assert_eq!(&*dropped.bytes, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn missing_file_reports_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = DroppedFile::read(dir.path().join("gone.png"))
            .await
            .expect_err("missing");
        assert!(matches!(err, AttachmentError::Read { .. }));
    }
}
