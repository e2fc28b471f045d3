//! # Alertsmith Repo
//!
//! Repository state around the alert document.
//!
//! The read path ([`find_root`], [`current_ref`]) only looks at `.git`
//! metadata on disk and never fails: anything unexpected degrades to `None`.
//! Branch changes go through the `git` executable behind the
//! [`VcsCommands`] trait, serialized per repository root by
//! [`BranchSwitcher`].

mod branches;
mod head;
mod root;
mod switcher;
mod vcs;

pub use branches::{parse_branch_list, pick_default_base};
pub use head::{current_ref, parse_head, HeadRef};
pub use root::{find_root, git_dir};
pub use switcher::BranchSwitcher;
pub use vcs::{GitCli, VcsCommands};
