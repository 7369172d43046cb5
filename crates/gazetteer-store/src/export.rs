//! Per-group export files

use crate::{write_json_atomic, StoreError};
use gazetteer_domain::StoreDocument;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<dir>/<prefix>_<sanitized group>.json`
pub fn export_path(dir: &Path, prefix: &str, group: &str) -> PathBuf {
    dir.join(format!("{}_{}.json", prefix, sanitize_file_component(group)))
}

/// True if `a` and `b` may name the same file
///
/// Relative paths are resolved against the working directory and `.`
/// components dropped. The comparison ignores case so that a collision on a
/// case-insensitive filesystem is caught too.
pub fn paths_collide(a: &Path, b: &Path) -> bool {
    comparable(a) == comparable(b)
}

fn comparable(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect::<PathBuf>()
        .to_string_lossy()
        .to_lowercase()
}

/// Write one group's slice of `document` to its own file
///
/// The file holds `{ "<group>": { unit: records } }`; a group with no stored
/// units is exported with an empty unit map. Returns the written path.
pub async fn export_group(
    document: &StoreDocument,
    group: &str,
    dir: &Path,
    prefix: &str,
) -> Result<PathBuf, StoreError> {
    let path = export_path(dir, prefix, group);
    let empty = BTreeMap::new();
    let units = document.group(group).unwrap_or(&empty);
    let slice = BTreeMap::from([(group, units)]);

    write_json_atomic(&path, &slice).await?;
    info!("Saved {} units for {} to {}", units.len(), group, path.display());
    Ok(path)
}
