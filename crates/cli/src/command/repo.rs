use alertsmith_protocol::{check_root_layout, FsDirectoryProbe, ProtocolError};
use alertsmith_repo::{current_ref, BranchSwitcher, GitCli, HeadRef};
use anyhow::{bail, Result};
use serde::Serialize;

use super::Session;
use crate::{print_json, print_stdout, CheckLayoutArgs, CheckoutArgs, JsonArgs, NewBranchArgs};

#[derive(Serialize)]
struct BranchState {
    root: Option<String>,
    branch: Option<String>,
    detached: bool,
}

/// Never fails: an unknown state prints as `unknown`.
pub(crate) fn run_branch(session: &mut Session, args: JsonArgs) -> Result<()> {
    let root = match session.repo_root() {
        Ok(root) => Some(root),
        Err(err) => {
            log::debug!("{err:#}");
            None
        }
    };
    let head = root.as_deref().and_then(current_ref);

    if args.json {
        return print_json(&BranchState {
            root: root.map(|r| r.display().to_string()),
            branch: match &head {
                Some(HeadRef::Branch(name)) => Some(name.clone()),
                _ => None,
            },
            detached: head == Some(HeadRef::Detached),
        });
    }
    match head {
        Some(head) => print_stdout(&head.to_string()),
        None => print_stdout("unknown"),
    }
}

pub(crate) async fn run_checkout(session: &mut Session, args: CheckoutArgs) -> Result<()> {
    let root = session.repo_root()?;
    let switcher = BranchSwitcher::new(GitCli::default());
    if !switcher.checkout(&root, &args.branch).await {
        bail!("checkout of `{}` failed (see log above)", args.branch);
    }
    Ok(())
}

pub(crate) async fn run_new_branch(session: &mut Session, args: NewBranchArgs) -> Result<()> {
    let root = session.repo_root()?;
    let switcher = BranchSwitcher::new(GitCli::default());
    if !switcher
        .create_and_checkout(&root, &args.name, args.base.as_deref())
        .await
    {
        bail!("could not create branch `{}` (see log above)", args.name);
    }
    Ok(())
}

pub(crate) fn run_check_layout(session: &mut Session, args: CheckLayoutArgs) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => session.repo_root()?,
    };
    let required = &session.config().required_dirs;
    if required.is_empty() {
        log::warn!("layout.required_dirs is empty; nothing to check");
    }
    match check_root_layout(&FsDirectoryProbe, &root, required) {
        Ok(()) => {
            print_stdout(&format!("{}: ok", root.display()))?;
            Ok(())
        }
        Err(ProtocolError::MissingFolders { missing, .. }) => {
            for name in &missing {
                print_stdout(&format!("missing: {name}"))?;
            }
            bail!(
                "{} is missing {} required folder(s)",
                root.display(),
                missing.len()
            )
        }
        Err(err) => Err(err.into()),
    }
}
