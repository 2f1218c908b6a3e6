//! Small helpers shared across modules.
pub mod fs;

use std::path::Path;

/// Get the file stem (name without extension) from a path
pub fn file_stem<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|name| name.to_string_lossy().to_string())
}

/// Get the file extension from a path
pub fn file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
}
