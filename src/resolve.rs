//! Executable resolution.
//!
//! A command is either a path (contains a separator) checked directly, or a
//! bare name searched for in `PATH`.

use std::path::{Path, PathBuf};

use crate::env::EnvSnapshot;

/// Decides whether a command is reachable at launch time
pub trait ExecutableResolver {
    /// Return the executable `command` refers to, or None when it cannot be found.
    ///
    /// `cwd` is the app's working directory, used for relative paths.
    fn resolve(&self, command: &str, cwd: Option<&Path>) -> Option<PathBuf>;
}

impl<R: ExecutableResolver + ?Sized> ExecutableResolver for &R {
    fn resolve(&self, command: &str, cwd: Option<&Path>) -> Option<PathBuf> {
        (**self).resolve(command, cwd)
    }
}

/// Resolves commands against a `PATH` list
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    dirs: Vec<PathBuf>,
}

impl PathResolver {
    /// Search the directories in the snapshot's `PATH`
    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self { dirs: env.search_path() }
    }

    /// Search exactly these directories
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Append directories searched after `PATH`
    pub fn extend<I: IntoIterator<Item = PathBuf>>(mut self, extra: I) -> Self {
        self.dirs.extend(extra);
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl ExecutableResolver for PathResolver {
    fn resolve(&self, command: &str, cwd: Option<&Path>) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }

        let as_path = Path::new(command);
        if as_path.components().count() > 1 || as_path.is_absolute() {
            let candidate = match cwd {
                Some(dir) if as_path.is_relative() => dir.join(as_path),
                _ => as_path.to_path_buf(),
            };
            return is_executable(&candidate).then_some(candidate);
        }

        self.dirs
            .iter()
            .map(|dir| dir.join(command))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
