use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

/// Find every file under `root` with one of `extensions`, recursively
///
/// Entries are visited depth-first in file-name order, so the result is the
/// same on every run regardless of the order the filesystem lists them in.
/// Symlinks to regular files are included under the link's own path; symlinks
/// to directories are not followed, so link cycles cannot loop the walk.
pub async fn discover_files(root: &Path, extensions: &[&str]) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    // Stack of (path, is_dir); children are pushed in reverse so they pop in order
    let mut stack = vec![(root.to_path_buf(), true)];

    while let Some((path, is_dir)) = stack.pop() {
        if !is_dir {
            if has_extension(&path, extensions) {
                found.push(path);
            }
            continue;
        }

        let mut entries = fs::read_dir(&path).await?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let is_file = if file_type.is_symlink() {
                let is_file = fs::metadata(entry.path())
                    .await
                    .is_ok_and(|m| m.is_file());
                if !is_file {
                    debug!("skipping symlink {}", entry.path().display());
                }
                is_file
            } else {
                file_type.is_file()
            };
            if file_type.is_dir() || is_file {
                children.push((entry.path(), file_type.is_dir()));
            }
        }
        children.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
        stack.extend(children.into_iter().rev());
    }

    Ok(found)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext))
        .unwrap_or(false)
}
