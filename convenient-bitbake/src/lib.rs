//! Convenient access to a bitbake build from the outside
//!
//! bitbake is driven as an external tool: commands are run through a shell,
//! `bitbake -e` output is read as text, and recipe work directories are
//! linked into the checkout so they can be opened without digging through
//! `tmp/work`.
//!
//! ```no_run
//! use convenient_bitbake::{link_recipe_dir, Bitbake, DirectoryContext, RecipeVariable, ShellRunner};
//!
//! # fn example() -> Result<(), convenient_bitbake::BitbakeError> {
//! let ctx = DirectoryContext::from_top_dir("/work/zynq-bsp");
//! let bitbake = Bitbake::new(ShellRunner::new());
//! let sources = link_recipe_dir(&bitbake, &ctx, "busybox", RecipeVariable::Source)?;
//! println!("{}", sources.display());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod environment;
pub mod error;
pub mod linker;
pub mod recipe_dirs;
pub mod runner;

pub use context::DirectoryContext;
pub use environment::{
    shell_quote, Bitbake, FetchReport, RecipeEnvironmentReader, DEFAULT_SETUP_SCRIPT,
};
pub use error::{BitbakeError, BitbakeResult};
pub use linker::{folder_exists, link_recipe_dir, link_to};
pub use recipe_dirs::{clean_variable_line, extract_field, normalize_path, RecipeQuery, RecipeVariable};
pub use runner::{CommandRunner, ShellRunner};
