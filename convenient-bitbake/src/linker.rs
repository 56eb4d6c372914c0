//! Symlinks from the checkout to recipe work directories
//!
//! Existing links are left alone: linking over a stale `links/sources` fails
//! and the old link has to be removed by hand.

use crate::context::DirectoryContext;
use crate::environment::RecipeEnvironmentReader;
use crate::error::{BitbakeError, BitbakeResult};
use crate::recipe_dirs::{extract_field, RecipeVariable};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// True when `path` exists and is a directory (symlinks are followed)
pub fn folder_exists(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Create a symlink at `link` pointing to the directory `target`.
///
/// `target` is checked first; when it is not an existing directory nothing
/// is created and [`BitbakeError::PathNotFound`] is returned.
pub fn link_to(target: &Path, link: &Path) -> BitbakeResult<()> {
    if !folder_exists(target) {
        return Err(BitbakeError::PathNotFound(target.to_path_buf()));
    }

    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| BitbakeError::IoError(parent.to_path_buf(), e.to_string()))?;
    }

    info!(
        "create symbolic link from {} into {}",
        target.display(),
        link.display()
    );
    symlink_dir(target, link).map_err(|error| BitbakeError::SymlinkFailed {
        target: target.to_path_buf(),
        link: link.to_path_buf(),
        error,
    })
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Extract one work directory of `target` and link it into the checkout.
///
/// Returns the directory the link points to.
pub fn link_recipe_dir<E: RecipeEnvironmentReader + ?Sized>(
    reader: &E,
    ctx: &DirectoryContext,
    target: &str,
    variable: RecipeVariable,
) -> BitbakeResult<PathBuf> {
    let folder = extract_field(reader, ctx, target, variable)?;
    link_to(&folder, variable.link_dir(ctx))?;
    Ok(folder)
}
