use crate::{ProtocolError, Result};
use std::path::Path;

/// Directory existence and listing, as seen by the host.
pub trait DirectoryProbe {
    fn is_dir(&self, path: &Path) -> bool;

    /// Names of the direct children of `path`.
    fn list_dir(&self, path: &Path) -> std::io::Result<Vec<String>>;
}

/// Probe backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryProbe;

impl DirectoryProbe for FsDirectoryProbe {
    fn is_dir(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    fn list_dir(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

pub fn normalize_folder_name(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while value.starts_with("./") {
        value = value[2..].to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

/// Checks that `root` holds every folder named in `required` at its top level.
///
/// All missing names are reported together, in the order they were asked for.
pub fn check_root_layout(
    probe: &dyn DirectoryProbe,
    root: &Path,
    required: &[String],
) -> Result<()> {
    if !probe.is_dir(root) {
        return Err(ProtocolError::NotADirectory(root.display().to_string()));
    }
    let present = probe.list_dir(root)?;

    let missing: Vec<String> = required
        .iter()
        .map(|name| normalize_folder_name(name))
        .filter(|name| !name.is_empty())
        .filter(|name| !present.iter().any(|p| p == name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        log::debug!("{} missing folders: {missing:?}", root.display());
        Err(ProtocolError::MissingFolders {
            root: root.display().to_string(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    struct FixedProbe {
        dirs: Vec<&'static str>,
    }

    impl DirectoryProbe for FixedProbe {
        fn is_dir(&self, path: &Path) -> bool {
            path == Path::new("/repo")
        }

        fn list_dir(&self, _path: &Path) -> std::io::Result<Vec<String>> {
            Ok(self.dirs.iter().map(|d| d.to_string()).collect())
        }
    }

    #[test]
    fn normalizes_user_written_names() {
        assert_eq!(normalize_folder_name("./terraform/"), "terraform");
        assert_eq!(normalize_folder_name(" services "), "services");
        assert_eq!(normalize_folder_name("."), "");
    }

    #[test]
    fn reports_every_missing_folder_in_request_order() {
        let probe = FixedProbe {
            dirs: vec!["terraform"],
        };
        let required = vec![
            "services".to_string(),
            "./terraform".to_string(),
            "docs/".to_string(),
        ];
        let err = check_root_layout(&probe, &PathBuf::from("/repo"), &required).unwrap_err();
        match err {
            ProtocolError::MissingFolders { missing, .. } => {
                assert_eq!(missing, vec!["services".to_string(), "docs".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn filesystem_probe_lists_only_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("terraform")).unwrap();
        std::fs::create_dir(tmp.path().join("services")).unwrap();
        std::fs::write(tmp.path().join("docs"), "not a folder").unwrap();

        let probe = FsDirectoryProbe;
        assert_eq!(
            probe.list_dir(tmp.path()).unwrap(),
            vec!["services".to_string(), "terraform".to_string()]
        );
        let required = vec!["terraform".to_string(), "docs".to_string()];
        let err = check_root_layout(&probe, tmp.path(), &required).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingFolders { ref missing, .. } if missing == &["docs".to_string()]));
        assert!(!probe.is_dir(&tmp.path().join("docs")));
    }

    #[test]
    fn non_directory_root_fails_fast() {
        let probe = FixedProbe { dirs: vec![] };
        let err = check_root_layout(&probe, Path::new("/elsewhere"), &[]).unwrap_err();
        assert!(matches!(err, ProtocolError::NotADirectory(_)));
    }
}
