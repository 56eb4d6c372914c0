//! BSP configuration
//!
//! Everything is optional in the YAML file; omitted keys keep the defaults
//! for the Xilinx 2022.2 release:
//!
//! ```yaml
//! git_url: https://github.com/Xilinx/
//! branch: rel-v2022.2
//! repos:
//!   - meta-xilinx
//!   - poky
//! host_packages:
//!   - gawk
//! setup_script: setup_custom_project
//! ```

use convenient_bitbake::DEFAULT_SETUP_SCRIPT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Looked up in the top directory when no file is named on the command line
pub const DEFAULT_CONFIG_FILE: &str = "zynq-bsp.yml";

const XILINX_GIT: &str = "https://github.com/Xilinx/";
const XILINX_BRANCH: &str = "rel-v2022.2";

const XILINX_REPOS: &[&str] = &[
    "meta-xilinx",
    "meta-openembedded",
    "poky",
    "meta-xilinx-tools",
    "meta-xilinx-tsn",
];

/// Debian packages needed on the host to run a Yocto build
const HOST_PACKAGES: &[&str] = &[
    "gawk",
    "wget",
    "git",
    "diffstat",
    "unzip",
    "texinfo",
    "gcc",
    "build-essential",
    "chrpath",
    "socat",
    "cpio",
    "python3",
    "python3-pip",
    "python3-pexpect",
    "xz-utils",
    "debianutils",
    "iputils-ping",
    "python3-git",
    "python3-jinja2",
    "libegl1-mesa",
    "libsdl1.2-dev",
    "pylint3",
    "xterm",
    "python3-subunit",
    "mesa-common-dev",
    "zstd",
    "liblz4-tool",
];

/// Repositories, host packages and setup script of the BSP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BspConfig {
    /// Organization prefix; `<git_url><repo>.git` is cloned
    pub git_url: String,
    /// Branch checked out in every repository
    pub branch: String,
    /// Layer repositories cloned into `external/`
    pub repos: Vec<String>,
    /// Packages installed on the host with apt
    pub host_packages: Vec<String>,
    /// Environment script at the top of the checkout
    pub setup_script: String,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self {
            git_url: XILINX_GIT.to_string(),
            branch: XILINX_BRANCH.to_string(),
            repos: XILINX_REPOS.iter().map(|r| r.to_string()).collect(),
            host_packages: HOST_PACKAGES.iter().map(|p| p.to_string()).collect(),
            setup_script: DEFAULT_SETUP_SCRIPT.to_string(),
        }
    }
}

impl BspConfig {
    /// Parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load `explicit` if given, else `<top_dir>/zynq-bsp.yml` if it exists,
    /// else the defaults.
    pub fn resolve(explicit: Option<&Path>, top_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = top_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            debug!("Using configuration {}", candidate.display());
            return Self::load(candidate);
        }

        Ok(Self::default())
    }

    /// Clone URL of `repo`
    pub fn repo_url(&self, repo: &str) -> String {
        format!("{}{}.git", self.git_url, repo)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error at {}: {1}", .0.display())]
    IoError(PathBuf, String),

    #[error("Parse error in {}: {1}", .0.display())]
    ParseError(PathBuf, String),
}
