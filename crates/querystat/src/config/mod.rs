use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

pub const DEFAULT_DATASET_FILE: &str = "queries.tsv";
pub const DATASET_ENV_VAR: &str = "QUERYSTAT_DATASET";

/// Where the dataset path came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSource {
    Flag,
    Environment,
    Default,
}

impl DatasetSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Environment => "env",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    pub dataset_path: PathBuf,
    pub dataset_source: DatasetSource,
}

/// Resolves the dataset location: `--dataset`, then `QUERYSTAT_DATASET`, then
/// `queries.tsv` in the working directory. An empty environment value counts
/// as unset.
pub fn resolve_runtime_paths(
    home_dir: &Path,
    cwd: &Path,
    dataset_flag: Option<&Path>,
    dataset_env: Option<&OsStr>,
) -> Result<RuntimePaths> {
    let home_dir = absolute_root("home_dir", home_dir)?;
    let cwd = absolute_root("cwd", cwd)?;

    let env_path = dataset_env
        .filter(|value| !value.is_empty())
        .map(Path::new);
    let (candidate, dataset_source) = match (dataset_flag, env_path) {
        (Some(path), _) => (path, DatasetSource::Flag),
        (None, Some(path)) => (path, DatasetSource::Environment),
        (None, None) => (Path::new(DEFAULT_DATASET_FILE), DatasetSource::Default),
    };

    let expanded = expand_home(candidate, &home_dir)?;
    let dataset_path = clean_path(&cwd.join(expanded));

    Ok(RuntimePaths {
        home_dir,
        cwd,
        dataset_path,
        dataset_source,
    })
}

fn absolute_root(label: &str, path: &Path) -> Result<PathBuf> {
    if !path.is_absolute() {
        bail!("{label} must be absolute: {}", path.display());
    }
    Ok(clean_path(path))
}

/// Only a bare `~` first component is expanded; `~user` forms are rejected.
fn expand_home(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    if let Ok(rest) = path.strip_prefix("~") {
        return Ok(home_dir.join(rest));
    }

    let user_form = matches!(
        path.components().next(),
        Some(Component::Normal(first)) if first.to_string_lossy().starts_with('~')
    );
    if user_form {
        bail!(
            "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
            path.display()
        );
    }

    Ok(path.to_path_buf())
}

/// Drops `.` and folds `..` without touching the filesystem.
fn clean_path(path: &Path) -> PathBuf {
    path.components()
        .fold(PathBuf::new(), |mut cleaned, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir if cleaned.pop() => {}
                other => cleaned.push(other.as_os_str()),
            }
            cleaned
        })
}
