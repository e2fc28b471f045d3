use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use crate::branches::parse_branch_list;

/// Branch operations that change repository state.
///
/// Only success or failure reaches the caller; details go to the log.
#[async_trait]
pub trait VcsCommands: Send + Sync {
    async fn list_branches(&self, root: &Path) -> Option<Vec<String>>;

    async fn checkout(&self, root: &Path, branch: &str) -> bool;

    /// Create `name` from `base` and switch to it.
    async fn create_branch(&self, root: &Path, name: &str, base: &str) -> bool;
}

/// [`VcsCommands`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, root: &Path, args: &[&str]) -> Option<Output> {
        let output = match Command::new(&self.program)
            .args(args)
            .current_dir(root)
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                log::warn!("failed to run {} {:?}: {err}", self.program.display(), args);
                return None;
            }
        };
        if !output.status.success() {
            log::warn!(
                "{} {:?} exited with {}: {}",
                self.program.display(),
                args,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }
        Some(output)
    }
}

#[async_trait]
impl VcsCommands for GitCli {
    async fn list_branches(&self, root: &Path) -> Option<Vec<String>> {
        let output = self
            .run(root, &["branch", "--list", "--no-color"])
            .await?;
        Some(parse_branch_list(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn checkout(&self, root: &Path, branch: &str) -> bool {
        if !is_safe_ref_name(branch) {
            log::warn!("refusing to check out `{branch}`");
            return false;
        }
        // `--` keeps a name that only exists as a file from being read as a path
        self.run(root, &["checkout", branch, "--"]).await.is_some()
    }

    async fn create_branch(&self, root: &Path, name: &str, base: &str) -> bool {
        if !is_safe_ref_name(name) || !is_safe_ref_name(base) {
            log::warn!("refusing to create `{name}` from `{base}`");
            return false;
        }
        self.run(root, &["checkout", "-b", name, base, "--"]).await.is_some()
    }
}

/// Names that git would read as options are never passed through.
fn is_safe_ref_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.starts_with('-') && !name.contains(char::is_whitespace)
}
