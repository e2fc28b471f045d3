use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::branches::pick_default_base;
use crate::vcs::VcsCommands;

/// Runs branch changes one at a time per repository root.
///
/// Two checkouts on the same root would race on the working tree; distinct
/// roots proceed in parallel.
pub struct BranchSwitcher<V> {
    vcs: V,
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl<V: VcsCommands> BranchSwitcher<V> {
    pub fn new(vcs: V) -> Self {
        Self {
            vcs,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub async fn list_branches(&self, root: &Path) -> Option<Vec<String>> {
        self.vcs.list_branches(root).await
    }

    pub async fn checkout(&self, root: &Path, branch: &str) -> bool {
        let lock = self.lock_for(root);
        let _guard = lock.lock().await;
        let ok = self.vcs.checkout(root, branch).await;
        log::info!("checkout `{branch}` in {}: {}", root.display(), status(ok));
        ok
    }

    /// Create `name` and switch to it. Without an explicit `base` the new
    /// branch starts from `main`, or `master`; with neither present this
    /// fails without touching the repository.
    pub async fn create_and_checkout(&self, root: &Path, name: &str, base: Option<&str>) -> bool {
        let lock = self.lock_for(root);
        let _guard = lock.lock().await;

        let base = match base {
            Some(base) => base.to_string(),
            None => {
                let Some(branches) = self.vcs.list_branches(root).await else {
                    log::warn!("cannot list branches in {}", root.display());
                    return false;
                };
                match pick_default_base(&branches) {
                    Some(base) => base.to_string(),
                    None => {
                        log::warn!(
                            "no `main` or `master` branch in {}; pass a base explicitly",
                            root.display()
                        );
                        return false;
                    }
                }
            }
        };
        let ok = self.vcs.create_branch(root, name, &base).await;
        log::info!(
            "create `{name}` from `{base}` in {}: {}",
            root.display(),
            status(ok)
        );
        ok
    }

    fn lock_for(&self, root: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let key = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // entries only the map still holds belong to finished operations
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(key).or_default().clone()
    }
}

fn status(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "failed"
    }
}
