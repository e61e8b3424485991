//! Atomic replacement of small JSON documents on disk.

use std::io;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Replace the file at `path` with `contents`.
///
/// Writes a sibling `.tmp` file, syncs it, then renames it over `path`, so
/// readers see either the old or the new document. Missing parent
/// directories are created. Errors carry the step that failed.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| annotate(e, "create directory"))?;
        }
    }

    let temp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| annotate(e, "create temp file"))?;

    file.write_all(contents)
        .await
        .map_err(|e| annotate(e, "write"))?;

    file.sync_all().await.map_err(|e| annotate(e, "sync"))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| annotate(e, "rename"))
}

fn annotate(e: io::Error, step: &str) -> io::Error {
    io::Error::new(e.kind(), format!("{} failed: {}", step, e))
}
