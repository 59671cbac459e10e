use dashmap::{DashMap, DashSet};
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use tracing::error;

/// A regular file discovered by the walk.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub abs_path: String,
    pub size: u64,
}

/// Walk output: candidate files plus every subdirectory visited, both in
/// path order.
#[derive(Debug)]
pub struct WalkOutcome {
    pub files: Vec<WalkedFile>,
    pub dirs: Vec<String>,
}

/// Parallel traversal of the root directories. Skips hidden entries
/// (leading dot), symlinks, zero-byte files, and anything matching an
/// ignore glob. The roots themselves are not recorded as directories.
pub fn walk_roots(root_paths: &[&str], ignore_globs: &[&str]) -> io::Result<WalkOutcome> {
    let files: DashMap<String, u64> = DashMap::new();
    let dirs: DashSet<String> = DashSet::new();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    root_paths.par_iter().try_for_each(|root_dir| {
        visit_dirs(Path::new(root_dir), &files, &dirs, &ignore_patterns)
    })?;

    let mut file_list: Vec<WalkedFile> = files
        .into_iter()
        .map(|(abs_path, size)| WalkedFile { abs_path, size })
        .collect();
    file_list.sort_by(|a, b| a.abs_path.cmp(&b.abs_path));

    let mut dir_list: Vec<String> = dirs.into_iter().collect();
    dir_list.sort();

    Ok(WalkOutcome {
        files: file_list,
        dirs: dir_list,
    })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn visit_dirs(
    dir: &Path,
    files: &DashMap<String, u64>,
    dirs: &DashSet<String>,
    ignore_patterns: &[Pattern],
) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    if ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(dir))
    {
        return Ok(());
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() == io::ErrorKind::PermissionDenied {
                error!("Access denied reading directory {}: {}", dir.display(), err);
                return Ok(());
            } else {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error reading directory {}: {}", dir.display(), err),
                ));
            }
        }
    };

    entries.par_bridge().try_for_each(|entry_result| {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error reading entry in directory {}: {}", dir.display(), err),
                ));
            }
        };

        let path = entry.path();
        if is_hidden(&path) {
            return Ok(());
        }

        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error getting metadata for {}: {}", path.display(), err),
                ));
            }
        };

        if metadata.file_type().is_symlink() {
            return Ok(());
        }

        if metadata.is_dir() {
            if !ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(&path))
            {
                dirs.insert(path.to_string_lossy().into_owned());
                visit_dirs(&path, files, dirs, ignore_patterns)?;
            }
        } else if metadata.len() > 0 {
            if !ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(&path))
            {
                files.insert(path.to_string_lossy().into_owned(), metadata.len());
            }
        }
        Ok(())
    })?;

    Ok(())
}
