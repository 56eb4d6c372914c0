//! Well-known directories of a BSP checkout
//!
//! All paths are derived from a single top directory, normally the working
//! directory of the process:
//!
//! ```text
//! <top>/
//! ├── generated/        bitbake build directory
//! ├── external/         cloned layer repositories
//! └── links/
//!     ├── sources       -> ${S} of the last linked recipe
//!     ├── builds        -> ${B}
//!     └── install       -> ${D}
//! ```

use std::path::{Path, PathBuf};

/// Immutable set of directories shared by every operation of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryContext {
    /// Checkout root
    pub top_dir: PathBuf,
    /// Build directory handed to the project setup script
    pub generated_dir: PathBuf,
    /// Symlink to the recipe source directory (`S`)
    pub source_link_dir: PathBuf,
    /// Symlink to the recipe build directory (`B`)
    pub build_link_dir: PathBuf,
    /// Symlink to the recipe install directory (`D`)
    pub install_link_dir: PathBuf,
}

impl DirectoryContext {
    pub fn from_top_dir(top_dir: impl AsRef<Path>) -> Self {
        let ctx = Self {
            top_dir: top_dir.as_ref().to_path_buf(),
            ..Self::default()
        };
        let links = ctx.links_dir();
        Self {
            generated_dir: ctx.top_dir.join("generated"),
            source_link_dir: links.join("sources"),
            build_link_dir: links.join("builds"),
            install_link_dir: links.join("install"),
            ..ctx
        }
    }

    /// A default-constructed context has no top directory and must not be used
    pub fn is_initialized(&self) -> bool {
        !self.top_dir.as_os_str().is_empty()
    }

    pub fn links_dir(&self) -> PathBuf {
        self.top_dir.join("links")
    }

    /// Where layer repositories are cloned during bootstrap
    pub fn external_dir(&self) -> PathBuf {
        self.top_dir.join("external")
    }
}
