//! Path helpers: home expansion and slash normalization

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Expand a leading `~` or `$HOME` to the user's home directory.
///
/// Any other input is returned unchanged.
///
/// # Errors
///
/// Returns an error if expansion is required but no home directory can be
/// resolved.
pub fn expand_user(input: &str) -> Result<PathBuf> {
    let needs_home = input == "~"
        || input == "$HOME"
        || input.starts_with("~/")
        || input.starts_with("$HOME/");
    if !needs_home {
        return Ok(PathBuf::from(input));
    }

    let home = dirs::home_dir().ok_or(Error::HomeDirUnavailable)?;
    let rest = match input {
        "~" | "$HOME" => return Ok(home),
        _ if input.starts_with("~/") => &input[2..],
        _ => &input["$HOME/".len()..],
    };
    Ok(home.join(rest))
}

/// Render a relative path with forward slashes, regardless of platform.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}
