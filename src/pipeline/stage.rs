//! Staging: persist an input stream to a re-readable temporary artifact.
//!
//! The batch pipeline needs a file it can open (and in principle re-open),
//! while resolved inputs are one-shot streams. [`stage`] copies the stream
//! into a uniquely named temp file before returning, so a success means the
//! artifact's content byte-for-byte matches the source.
//!
//! The artifact owns its [`NamedTempFile`]: dropping it deletes the file on
//! every exit path — success, validation failure, render failure, or panic.
//! That is the whole cleanup contract; nothing else needs to remember to
//! unlink anything.

use crate::error::ValidateError;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A staged copy of the input, alive until dropped.
pub struct StagedArtifact {
    file: NamedTempFile,
    size_bytes: u64,
}

impl StagedArtifact {
    /// Filesystem path of the staged copy.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Exact size of the staged content.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Open the artifact for a fresh sequential read.
    pub fn open(&self) -> io::Result<File> {
        File::open(self.file.path())
    }
}

/// Copy `reader` fully into a new temp file.
///
/// Fails with [`ValidateError::StagingIo`] if temp-file creation or the copy
/// fails; a partially written file is deleted when the error is dropped, so
/// no cleanup falls to the caller on the failure path either.
pub fn stage(reader: &mut dyn Read) -> Result<StagedArtifact, ValidateError> {
    let mut file =
        NamedTempFile::new().map_err(|source| ValidateError::StagingIo { source })?;
    let size_bytes =
        io::copy(reader, file.as_file_mut()).map_err(|source| ValidateError::StagingIo { source })?;
    file.as_file_mut()
        .flush()
        .map_err(|source| ValidateError::StagingIo { source })?;

    debug!(path = %file.path().display(), size_bytes, "staged input");
    Ok(StagedArtifact { file, size_bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn staged_content_matches_source_byte_for_byte() {
        let data: Vec<u8> = (0u8..=255).cycle().take(70_000).collect();
        let artifact = stage(&mut Cursor::new(data.clone())).unwrap();

        assert_eq!(artifact.size_bytes(), data.len() as u64);
        let mut staged = Vec::new();
        artifact.open().unwrap().read_to_end(&mut staged).unwrap();
        assert_eq!(staged, data);
    }

    #[test]
    fn empty_stream_stages_to_zero_byte_artifact() {
        let artifact = stage(&mut Cursor::new(Vec::new())).unwrap();
        assert_eq!(artifact.size_bytes(), 0);
        let mut staged = Vec::new();
        artifact.open().unwrap().read_to_end(&mut staged).unwrap();
        assert!(staged.is_empty());
    }

    #[test]
    fn artifact_is_deleted_on_drop() {
        let path = {
            let artifact = stage(&mut Cursor::new(b"bytes".to_vec())).unwrap();
            let p = artifact.path().to_path_buf();
            assert!(p.exists());
            p
        };
        assert!(!path.exists(), "staged file must be removed on drop");
    }

    #[test]
    fn copy_failure_surfaces_as_staging_io() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "mid-copy failure"))
            }
        }
        match stage(&mut FailingReader) {
            Err(ValidateError::StagingIo { source }) => {
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe)
            }
            other => panic!("expected StagingIo, got {:?}", other.map(|_| "ok")),
        }
    }
}
