use std::path::{Path, PathBuf};

const MARKER: &str = ".git";

/// Nearest ancestor of `start` (itself included) holding a `.git` entry.
///
/// A file start is resolved to its directory; relative paths are taken from
/// the current working directory. Returns `None` once the filesystem root is
/// passed without a match.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(start)
    };
    let dir = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start
    };
    let found = dir
        .ancestors()
        .find(|candidate| candidate.join(MARKER).exists())
        .map(Path::to_path_buf);
    if found.is_none() {
        log::debug!("no repository above {}", dir.display());
    }
    found
}

/// Metadata directory of the repository at `root`.
///
/// Worktrees and submodules carry a `.git` file (`gitdir: <path>`) instead
/// of a directory; the pointer is followed, relative to `root`.
pub fn git_dir(root: &Path) -> Option<PathBuf> {
    let marker = root.join(MARKER);
    if marker.is_dir() {
        return Some(marker);
    }
    let content = std::fs::read_to_string(&marker).ok()?;
    let target = content.trim().strip_prefix("gitdir:")?.trim();
    if target.is_empty() {
        return None;
    }
    let target = Path::new(target);
    Some(if target.is_absolute() {
        target.to_path_buf()
    } else {
        root.join(target)
    })
}
