//! Write-on-change publishing of mirrored files.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::PublishError;
use crate::TARGET_PUBLISH;

/// Write `data` to `path` unless the file already holds exactly those bytes.
///
/// Returns whether the file was written. An absent file always counts as
/// changed, even for empty `data`. Writes go to a temporary file in the same
/// directory which is then renamed over `path`, so readers see either the old
/// or the new content.
pub fn publish(path: &Path, data: &[u8]) -> Result<bool, PublishError> {
    match fs::read(path) {
        Ok(existing) if existing == data => {
            debug!(target: TARGET_PUBLISH, "{} unchanged ({} bytes)", path.display(), data.len());
            return Ok(false);
        }
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(source) => {
            return Err(PublishError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    write_atomic(path, data).map_err(|source| PublishError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(target: TARGET_PUBLISH, "Wrote {} bytes to {}", data.len(), path.display());
    Ok(true)
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    // Temp files are created owner-only; mirrored files are meant to be served
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Hex SHA-256 of a payload, as carried in run reports.
pub fn content_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
