//! One-time setup of a build host: Yocto host packages and layer repositories

use crate::config::BspConfig;
use convenient_bitbake::{shell_quote, BitbakeError, CommandRunner, DirectoryContext};
use convenient_git::{Cloner, GitError, GitRepository};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What a bootstrap run changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub installed: Vec<String>,
    pub already_installed: Vec<String>,
    pub cloned: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Bitbake(#[from] BitbakeError),

    #[error("failed to clone repository {0}: {1}")]
    Clone(String, #[source] GitError),

    #[error("IO error at {}: {1}", .0.display())]
    IoError(PathBuf, String),

    #[error("failed to install host packages: {}", .0.join(", "))]
    HostPackages(Vec<String>),
}

/// Ask the dpkg database whether `package` is installed
pub fn is_installed<R: CommandRunner + ?Sized>(runner: &R, package: &str) -> bool {
    let command = format!("dpkg-query -W -f='${{Status}}' {}", shell_quote(package));
    match runner.run(&command) {
        Ok(status) => status.contains("install ok installed"),
        Err(e) => {
            debug!("{} not installed: {}", package, e);
            false
        }
    }
}

/// Install every missing package. A failed install is logged and the
/// remaining packages are still processed; the failures are returned.
pub fn install_host_packages<R: CommandRunner + ?Sized>(
    runner: &R,
    packages: &[String],
    report: &mut BootstrapReport,
) -> Vec<String> {
    let mut failed = Vec::new();

    for package in packages {
        if is_installed(runner, package) {
            report.already_installed.push(package.clone());
            continue;
        }

        info!("{} to be installed on host", package);
        match runner.run(&format!("sudo apt-get install -y {}", shell_quote(package))) {
            Ok(_) => report.installed.push(package.clone()),
            Err(e) => {
                warn!("Error installing {}: {}", package, e);
                failed.push(package.clone());
            }
        }
    }

    failed
}

/// Clone every configured repository that is not already present below
/// `external/`. The first clone failure aborts.
pub fn fetch_repositories<C: Cloner + ?Sized>(
    ctx: &DirectoryContext,
    config: &BspConfig,
    cloner: &C,
    report: &mut BootstrapReport,
) -> Result<(), BootstrapError> {
    let external_dir = ctx.external_dir();

    for name in &config.repos {
        let repo = GitRepository::new(
            external_dir.join(name),
            config.repo_url(name),
            config.branch.clone(),
        );

        let cloned = repo
            .ensure_cloned(cloner)
            .map_err(|e| BootstrapError::Clone(name.clone(), e))?;

        if cloned {
            report.cloned.push(name.clone());
        } else {
            report.skipped.push(name.clone());
        }
    }

    info!("All repositories processed successfully");
    Ok(())
}

/// Install host packages, then fetch the layer repositories.
pub fn bootstrap<R: CommandRunner + ?Sized, C: Cloner + ?Sized>(
    ctx: &DirectoryContext,
    config: &BspConfig,
    runner: &R,
    cloner: &C,
) -> Result<BootstrapReport, BootstrapError> {
    if !ctx.is_initialized() {
        return Err(BitbakeError::UninitializedContext.into());
    }

    let external_dir = ctx.external_dir();
    if !external_dir.exists() {
        info!("Creating directory: {}", external_dir.display());
        std::fs::create_dir_all(&external_dir)
            .map_err(|e| BootstrapError::IoError(external_dir.clone(), e.to_string()))?;
    }

    let mut report = BootstrapReport::default();
    let failed = install_host_packages(runner, &config.host_packages, &mut report);

    fetch_repositories(ctx, config, cloner, &mut report)?;

    if !failed.is_empty() {
        return Err(BootstrapError::HostPackages(failed));
    }

    Ok(report)
}
