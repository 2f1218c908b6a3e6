use std::path::{Component, Path, PathBuf};

use crate::kernel::constants;
use crate::utils::{file_extension, file_stem};

/// File name of the unit for plugin `name`
pub fn unit_file_name(name: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", name, constants::PLUGIN_UNIT_EXTENSION))
}

/// Stems starting with `_` or `.` are reserved and never name a plugin
pub fn is_reserved_stem(stem: &str) -> bool {
    stem.starts_with('_') || stem.starts_with('.')
}

/// Plugin name of a unit file, or `None` if the path is not a plugin unit.
///
/// The extension must match [`unit_file_name`] exactly, so every name listed
/// here resolves back to the same file.
pub fn unit_name(path: &Path) -> Option<String> {
    let ext = file_extension(path)?;
    if ext != constants::PLUGIN_UNIT_EXTENSION {
        return None;
    }
    file_stem(path).filter(|stem| !stem.is_empty() && !is_reserved_stem(stem))
}

/// Check that `name` is exactly one normal path component.
///
/// Returns the reason on failure.
pub fn check_single_component(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.contains('/') || name.contains('\\') {
        return Err("name contains a path separator".to_string());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err("name is not a plain file name".to_string()),
    }
}

/// Check that `name` can be used as a plugin name
pub fn check_plugin_name(name: &str) -> Result<(), String> {
    check_single_component(name)?;
    if is_reserved_stem(name) {
        return Err("names starting with '_' or '.' are reserved".to_string());
    }
    Ok(())
}
