//! Applying usage overlays from YAML text, files and the environment.

use std::path::Path;

use flagtree_core::Command;
use tracing::debug;

use crate::error::{Result, UsageError};
use crate::tree::UsageTree;

/// Parses `yaml` as a [`UsageTree`] and applies it to `cmd`.
///
/// ```
/// use flagtree_core::Command;
///
/// let mut root = Command::new();
/// root.command("get");
/// flagtree_usage::apply_yaml(&mut root, "commands:\n  get:\n    short: fetch\n").unwrap();
/// assert_eq!(root.commands()["get"].documentation().short, "fetch");
/// ```
///
/// # Errors
///
/// Returns [`UsageError::Yaml`] if `yaml` is not a valid usage document.
/// `cmd` is left untouched in that case.
pub fn apply_yaml(cmd: &mut Command, yaml: &str) -> Result<()> {
    UsageTree::from_yaml(yaml)?.apply(cmd);
    Ok(())
}

/// Reads the usage document at `path` and applies it to `cmd`.
///
/// # Errors
///
/// Returns [`UsageError::Io`] if the file cannot be read, or
/// [`UsageError::Yaml`] if its content is invalid.
pub fn apply_file(cmd: &mut Command, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path).map_err(|source| UsageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Applying usage file");
    apply_yaml(cmd, &yaml)
}

/// Applies the usage file named by the environment variable `var`, if the
/// variable is set and the file exists.
///
/// Returns `Ok(true)` if a file was applied. This lets a program ship
/// embedded usage text while allowing it to be edited and previewed without
/// rebuilding:
///
/// ```no_run
/// use flagtree_core::Command;
///
/// const USAGE: &str = "short: a tool\n";
///
/// let mut root = Command::new();
/// if !flagtree_usage::apply_env(&mut root, "TOOL_USAGE").unwrap_or(false) {
///     flagtree_usage::apply_yaml(&mut root, USAGE).unwrap();
/// }
/// ```
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn apply_env(cmd: &mut Command, var: &str) -> Result<bool> {
    let Some(path) = std::env::var_os(var) else {
        return Ok(false);
    };
    let path = Path::new(&path);
    if !path.exists() {
        debug!(var, path = %path.display(), "Usage file does not exist");
        return Ok(false);
    }
    apply_file(cmd, path)?;
    Ok(true)
}

/// Exports the documentation of `cmd` and its subcommands as YAML, suitable
/// as a starting point for an external usage file.
pub fn to_yaml(cmd: &Command) -> Result<String> {
    UsageTree::extract(cmd).to_yaml()
}

/// Exports the documentation of `cmd` and its subcommands as JSON.
pub fn to_json(cmd: &Command) -> Result<String> {
    UsageTree::extract(cmd).to_json()
}
