//! Symlink planning and materialization
//!
//! A link item is either a plain path (the link lives there and points at
//! the managed directory) or a `"<link> -> <source>"` mapping. Exactly one
//! plain item per entry is the primary link: the canonical symlink target
//! and, during init, the migration source.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// One concrete (source, link) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkPlan {
    pub source: PathBuf,
    pub link: PathBuf,
}

/// Resolve declared link items into concrete plans.
///
/// Expands `~`/`$HOME`, absolutizes both sides, and rejects the same link
/// path mapping to different sources.
///
/// # Errors
///
/// Returns a configuration error for empty declarations, malformed
/// mappings, or duplicate links with conflicting sources.
pub fn build_plans(
    entry_name: &str,
    items: &[String],
    default_source: &Path,
) -> Result<Vec<SymlinkPlan>> {
    if items.is_empty() {
        return Err(Error::LinkConfig {
            name: entry_name.to_string(),
            message: "entry is missing link configuration".to_string(),
        });
    }

    let mut plans = Vec::with_capacity(items.len());
    let mut seen: Vec<(PathBuf, PathBuf)> = Vec::new();
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            return Err(Error::LinkConfig {
                name: entry_name.to_string(),
                message: "link item cannot be empty".to_string(),
            });
        }

        let (link_raw, source_raw) = match trimmed.split_once("->") {
            Some((link, source)) => {
                let link = link.trim();
                let source = source.trim();
                if link.is_empty() || source.is_empty() {
                    return Err(Error::LinkConfig {
                        name: entry_name.to_string(),
                        message: format!(
                            "invalid link mapping, expected \"<link> -> <source>\", got: {trimmed}"
                        ),
                    });
                }
                (link.to_string(), PathBuf::from(conf_fs::path::expand_user(source)?))
            }
            None => (trimmed.to_string(), default_source.to_path_buf()),
        };

        let link = absolutize(&conf_fs::path::expand_user(&link_raw)?)?;
        let source = absolutize(&source_raw)?;

        if let Some((_, existing)) = seen.iter().find(|(l, _)| *l == link) {
            if *existing != source {
                return Err(Error::LinkConfig {
                    name: entry_name.to_string(),
                    message: format!(
                        "link conflict: {} maps to both {} and {}",
                        link.display(),
                        existing.display(),
                        source.display()
                    ),
                });
            }
        }
        seen.push((link.clone(), source.clone()));
        plans.push(SymlinkPlan { source, link });
    }

    Ok(plans)
}

/// The single plain (non-redirected) link path of an entry.
///
/// # Errors
///
/// Returns a configuration error when zero or multiple plain items exist.
pub fn primary_link_path(
    entry_name: &str,
    items: &[String],
    plans: &[SymlinkPlan],
) -> Result<PathBuf> {
    let plain: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, raw)| !raw.trim().is_empty() && !raw.contains("->"))
        .map(|(idx, _)| idx)
        .collect();
    match plain.as_slice() {
        [idx] => Ok(plans[*idx].link.clone()),
        [] => Err(Error::LinkConfig {
            name: entry_name.to_string(),
            message: "no primary link path found, provide one plain link path without \"->\""
                .to_string(),
        }),
        _ => Err(Error::LinkConfig {
            name: entry_name.to_string(),
            message:
                "multiple primary link paths found, keep exactly one plain link path without \"->\""
                    .to_string(),
        }),
    }
}

/// Materialize every plan, in order.
///
/// # Errors
///
/// Fails fast on the first link that cannot be created or verified.
pub fn ensure_symlinks(plans: &[SymlinkPlan]) -> Result<()> {
    for plan in plans {
        ensure_symlink(&plan.source, &plan.link)?;
    }
    Ok(())
}

/// Create the symlink, or accept an existing one pointing at the same
/// target; anything else at the link path is an error.
fn ensure_symlink(source: &Path, link: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(link) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = link.parent() {
                fs::create_dir_all(parent)?;
            }
            tracing::debug!(link = %link.display(), source = %source.display(), "creating symlink");
            return symlink_dir(source, link).map_err(Error::Io);
        }
        Err(e) => return Err(Error::Io(e)),
        Ok(metadata) => metadata,
    };

    if !metadata.file_type().is_symlink() {
        return Err(Error::LinkOccupied {
            path: link.to_path_buf(),
        });
    }

    let current = resolve_link_target(link)?;
    if current == source {
        return Ok(());
    }
    Err(Error::LinkTargetMismatch {
        link: link.to_path_buf(),
        current,
        expected: source.to_path_buf(),
    })
}

/// Read a symlink and absolutize its target relative to the link's parent.
pub fn resolve_link_target(link: &Path) -> Result<PathBuf> {
    let target = fs::read_link(link)?;
    if target.is_absolute() {
        return Ok(target);
    }
    let base = link.parent().unwrap_or(Path::new("."));
    absolutize(&base.join(target))
}

pub(crate) fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(unix)]
fn symlink_dir(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn symlink_dir(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(source, link)
}
