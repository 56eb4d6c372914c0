//! bitbake invocations
//!
//! bitbake needs the environment prepared by the project setup script
//! (`setup_custom_project`, a wrapper around `oe-init-build-env`). Each shell
//! started by the [`CommandRunner`] is independent, so the script is sourced in
//! front of every bitbake command line.

use crate::context::DirectoryContext;
use crate::error::{BitbakeError, BitbakeResult};
use crate::runner::CommandRunner;
use std::path::Path;
use tracing::{info, warn};

/// Name of the setup script at the top of the checkout
pub const DEFAULT_SETUP_SCRIPT: &str = "setup_custom_project";

/// File written by `bitbake -g` listing every recipe of the dependency graph
pub const BUILDLIST_FILE: &str = "pn-buildlist";

/// Source of `bitbake -e` output for a target
pub trait RecipeEnvironmentReader {
    /// Full `KEY="value"` environment dump of `target`
    fn read_environment(&self, ctx: &DirectoryContext, target: &str) -> BitbakeResult<String>;
}

/// Outcome of [`Bitbake::fetch_dependencies`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub fetched: Vec<String>,
    pub failed: Vec<String>,
}

/// bitbake driven through a [`CommandRunner`]
#[derive(Debug, Clone)]
pub struct Bitbake<R> {
    runner: R,
    setup_script: String,
}

impl<R: CommandRunner> Bitbake<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            setup_script: DEFAULT_SETUP_SCRIPT.to_string(),
        }
    }

    /// Use another setup script, relative to the top directory
    pub fn with_setup_script(mut self, script: impl Into<String>) -> Self {
        self.setup_script = script.into();
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn setup_command(&self, ctx: &DirectoryContext) -> String {
        format!(
            "source {} {}",
            shell_quote(&ctx.top_dir.join(&self.setup_script).to_string_lossy()),
            shell_quote(&ctx.generated_dir.to_string_lossy())
        )
    }

    fn in_build_env(&self, ctx: &DirectoryContext, command: &str) -> String {
        format!("{} >/dev/null 2>&1 && {}", self.setup_command(ctx), command)
    }

    /// Source the setup script once on its own so a broken checkout fails
    /// before bitbake is started.
    pub fn setup(&self, ctx: &DirectoryContext) -> BitbakeResult<()> {
        if !ctx.is_initialized() {
            return Err(BitbakeError::UninitializedContext);
        }

        self.runner.run(&self.setup_command(ctx))?;
        Ok(())
    }

    /// Build `target`, returning bitbake's output
    pub fn build(&self, ctx: &DirectoryContext, target: &str) -> BitbakeResult<String> {
        self.setup(ctx)?;

        info!("Building {}", target);
        self.runner
            .run(&self.in_build_env(ctx, &format!("bitbake {}", shell_quote(target))))
    }

    /// Fetch the sources of every recipe `target` depends on.
    ///
    /// The dependency list comes from `bitbake -g`. A recipe whose fetch fails
    /// is recorded in the report and the remaining recipes are still fetched.
    pub fn fetch_dependencies(
        &self,
        ctx: &DirectoryContext,
        target: &str,
    ) -> BitbakeResult<FetchReport> {
        self.setup(ctx)?;

        self.runner
            .run(&self.in_build_env(ctx, &format!("bitbake -g {}", shell_quote(target))))?;

        let buildlist = ctx.generated_dir.join(BUILDLIST_FILE);
        let recipes = read_buildlist(&buildlist)?;
        info!("{} depends on {} recipes", target, recipes.len());

        let mut report = FetchReport::default();
        for recipe in recipes {
            let command = format!("bitbake -c fetch {}", shell_quote(&recipe));
            match self.runner.run(&self.in_build_env(ctx, &command)) {
                Ok(_) => {
                    info!("Fetched {}", recipe);
                    report.fetched.push(recipe);
                }
                Err(e) => {
                    warn!("Error fetching {}: {}", recipe, e);
                    report.failed.push(recipe);
                }
            }
        }

        Ok(report)
    }
}

impl<R: CommandRunner> RecipeEnvironmentReader for Bitbake<R> {
    fn read_environment(&self, ctx: &DirectoryContext, target: &str) -> BitbakeResult<String> {
        self.setup(ctx)?;

        self.runner
            .run(&self.in_build_env(ctx, &format!("bitbake -e {}", shell_quote(target))))
    }
}

fn read_buildlist(path: &Path) -> BitbakeResult<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BitbakeError::IoError(path.to_path_buf(), e.to_string()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Single-quote `value` for bash
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
