//! Input resolution: validate a user-supplied path before pdfium sees it.
//!
//! pdfium crashes unhelpfully on non-PDF input, so the magic bytes (`%PDF`)
//! are checked up front and callers get a typed error with the offending
//! bytes instead.

use crate::error::TurnusError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a local file path, validating existence, readability and PDF
/// magic bytes.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, TurnusError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(TurnusError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(TurnusError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TurnusError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(TurnusError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_file_not_found() {
        let err = resolve_local("/no/such/file.pdf").unwrap_err();
        assert!(matches!(err, TurnusError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"hello world").unwrap();

        let err = resolve_local(&path).unwrap_err();
        match err {
            TurnusError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();

        assert_eq!(resolve_local(&path).unwrap(), path);
    }
}
