use std::fmt;
use std::path::Path;

use crate::root::git_dir;

const BRANCH_PREFIX: &str = "refs/heads/";

/// What HEAD points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    Branch(String),
    Detached,
}

impl fmt::Display for HeadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(name) => f.write_str(name),
            Self::Detached => f.write_str("(detached)"),
        }
    }
}

/// Interpretation of HEAD contents alone, without consulting packed refs.
pub fn parse_head(content: &str) -> Option<HeadRef> {
    let content = content.trim();
    if is_commit_hash(content) {
        return Some(HeadRef::Detached);
    }
    content
        .strip_prefix("ref:")
        .map(str::trim)
        .and_then(|target| target.strip_prefix(BRANCH_PREFIX))
        .filter(|name| !name.is_empty())
        .map(|name| HeadRef::Branch(name.to_string()))
}

/// Branch checked out at `root`, read from `.git/HEAD`.
///
/// When HEAD is neither a branch ref nor a bare commit hash, `packed-refs`
/// is searched for a branch whose hash prefixes the HEAD content. Every I/O
/// problem yields `None`.
pub fn current_ref(root: &Path) -> Option<HeadRef> {
    let dir = git_dir(root)?;
    let head = match std::fs::read_to_string(dir.join("HEAD")) {
        Ok(head) => head,
        Err(err) => {
            log::warn!("cannot read HEAD under {}: {err}", dir.display());
            return None;
        }
    };
    let head = head.trim();
    parse_head(head).or_else(|| {
        let common = common_dir(&dir);
        let packed = std::fs::read_to_string(common.join("packed-refs")).ok()?;
        branch_from_packed_refs(&packed, head).map(HeadRef::Branch)
    })
}

fn branch_from_packed_refs(packed: &str, head: &str) -> Option<String> {
    packed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('^'))
        .filter_map(|line| line.split_once(' '))
        .find(|(hash, refname)| {
            !hash.is_empty() && head.starts_with(hash) && refname.starts_with(BRANCH_PREFIX)
        })
        .map(|(_, refname)| refname[BRANCH_PREFIX.len()..].to_string())
}

/// Linked worktrees keep shared refs in the directory named by `commondir`.
fn common_dir(dir: &Path) -> std::path::PathBuf {
    match std::fs::read_to_string(dir.join("commondir")) {
        Ok(content) if !content.trim().is_empty() => dir.join(content.trim()),
        _ => dir.to_path_buf(),
    }
}

fn is_commit_hash(content: &str) -> bool {
    content.len() == 40 && content.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HASH: &str = "3f786850e387550fdab836ed7e6dc881de23001b";

    #[test]
    fn head_forms() {
        assert_eq!(parse_head(HASH), Some(HeadRef::Detached));
        assert_eq!(
            parse_head("ref: refs/heads/feature-x\n"),
            Some(HeadRef::Branch("feature-x".to_string()))
        );
        assert_eq!(
            parse_head("ref: refs/heads/team/alerts"),
            Some(HeadRef::Branch("team/alerts".to_string()))
        );
        assert_eq!(parse_head("ref: refs/remotes/origin/main"), None);
        assert_eq!(parse_head("ref: refs/heads/"), None);
        assert_eq!(parse_head(&HASH[..39]), None);
    }

    #[test]
    fn packed_refs_lookup_skips_comments_and_peeled_lines() {
        let packed = format!(
            "# pack-refs with: peeled fully-peeled sorted\n^{HASH}\n{HASH} refs/tags/v1\n{HASH} refs/heads/release\n"
        );
        assert_eq!(
            branch_from_packed_refs(&packed, HASH),
            Some("release".to_string())
        );
        assert_eq!(branch_from_packed_refs(&packed, "deadbeef"), None);
    }

    #[test]
    fn display() {
        assert_eq!(HeadRef::Branch("main".into()).to_string(), "main");
        assert_eq!(HeadRef::Detached.to_string(), "(detached)");
    }
}
