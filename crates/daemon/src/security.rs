// Owner-only permissions for files that hold repository credentials.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};

pub fn ensure_owner_only_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if !path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(path)
            .with_context(|| format!("failed to read metadata for `{}`", path.display()))?;
        let mode = metadata.permissions().mode() & 0o777;
        if mode != 0o600 {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("failed to set owner-only mode on `{}`", path.display()))?;
        }
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}

pub fn ensure_owner_only_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if !path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(path)
            .with_context(|| format!("failed to read metadata for `{}`", path.display()))?;
        let mode = metadata.permissions().mode() & 0o777;
        if mode != 0o700 {
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))
                .with_context(|| format!("failed to set owner-only mode on `{}`", path.display()))?;
        }
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}

/// Open `path` for writing, truncating it; a new file is created 0600 so the
/// contents are never readable by others, not even briefly.
pub fn open_private_truncate(path: &Path) -> std::io::Result<std::fs::File> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;

        OpenOptions::new().create(true).write(true).truncate(true).mode(0o600).open(path)
    }
    #[cfg(not(unix))]
    {
        OpenOptions::new().create(true).write(true).truncate(true).open(path)
    }
}
