//! Recipe directory extraction from `bitbake -e` output
//!
//! The environment dump prints every resolved variable as `KEY="value"`. The
//! work directories of a recipe are read from three of them:
//!
//! | variable | meaning                         | link            |
//! |----------|---------------------------------|-----------------|
//! | `S`      | unpacked sources                | `links/sources` |
//! | `B`      | out-of-tree build directory     | `links/builds`  |
//! | `D`      | staged install destination      | `links/install` |

use crate::context::DirectoryContext;
use crate::environment::RecipeEnvironmentReader;
use crate::error::{BitbakeError, BitbakeResult};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// A recipe variable holding a work directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeVariable {
    /// `S`
    Source,
    /// `B`
    Build,
    /// `D`
    Install,
}

impl RecipeVariable {
    pub const ALL: [RecipeVariable; 3] = [Self::Source, Self::Build, Self::Install];

    pub fn name(self) -> &'static str {
        match self {
            Self::Source => "S",
            Self::Build => "B",
            Self::Install => "D",
        }
    }

    /// Line prefix of this variable in the environment dump
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Source => "S=",
            Self::Build => "B=",
            Self::Install => "D=",
        }
    }

    /// Symlink location of this directory inside `ctx`
    pub fn link_dir(self, ctx: &DirectoryContext) -> &Path {
        match self {
            Self::Source => &ctx.source_link_dir,
            Self::Build => &ctx.build_link_dir,
            Self::Install => &ctx.install_link_dir,
        }
    }
}

impl fmt::Display for RecipeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `S`, `S=` and the grep anchored form `^S=`
impl FromStr for RecipeVariable {
    type Err = BitbakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix('^').unwrap_or(s);
        let name = name.strip_suffix('=').unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|variable| variable.name() == name)
            .ok_or_else(|| BitbakeError::PrefixNotSupported(s.to_string()))
    }
}

/// One extraction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery<'a> {
    pub target: &'a str,
    pub variable: RecipeVariable,
}

impl<'a> RecipeQuery<'a> {
    pub fn new(target: &'a str, variable: RecipeVariable) -> Self {
        Self { target, variable }
    }

    /// Pick the variable out of a recorded environment dump
    pub fn find_in(&self, environment: &str) -> BitbakeResult<PathBuf> {
        let prefix = self.variable.prefix();
        let line = environment
            .lines()
            .find(|line| line.starts_with(prefix))
            .ok_or_else(|| BitbakeError::VariableNotFound {
                target: self.target.to_string(),
                variable: self.variable.name().to_string(),
            })?;

        debug!("{} of {}: {}", self.variable, self.target, line);

        clean_variable_line(line, prefix).ok_or_else(|| BitbakeError::NotAPath {
            variable: self.variable.name().to_string(),
            value: line.to_string(),
        })
    }
}

/// Turn `PREFIX"/some/path"` into `/some/path`.
///
/// Quotes are dropped, then the prefix, then anything in front of the first
/// `/`. Returns `None` when no `/` is left.
pub fn clean_variable_line(line: &str, prefix: &str) -> Option<PathBuf> {
    let unquoted = line.replace('"', "");
    let unprefixed = unquoted.strip_prefix(prefix).unwrap_or(&unquoted);
    let slash = unprefixed.find('/')?;
    Some(normalize_path(Path::new(unprefixed[slash..].trim_end())))
}

/// Lexical path cleanup: drops `.`, resolves `..` against preceding names and
/// collapses repeated separators. The filesystem is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Resolve one work directory of `target` through bitbake.
pub fn extract_field<E: RecipeEnvironmentReader + ?Sized>(
    reader: &E,
    ctx: &DirectoryContext,
    target: &str,
    variable: RecipeVariable,
) -> BitbakeResult<PathBuf> {
    if !ctx.is_initialized() {
        return Err(BitbakeError::UninitializedContext);
    }

    let environment = reader.read_environment(ctx, target)?;
    RecipeQuery::new(target, variable).find_in(&environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const BUSYBOX_ENV: &str = r#"#
# $S [3 operations]
#   set /work/poky/meta/conf/bitbake.conf:404
#     "${WORKDIR}/${BP}"
# pre-expansion value:
#   "${WORKDIR}/${BP}"
S="/work/build/tmp/work/cortexa9t2hf-neon-xilinx-linux-gnueabi/busybox/1.35.0-r0/busybox-1.35.0"
SANITY_TESTED_DISTROS=""
B="/work/build/tmp/work/cortexa9t2hf-neon-xilinx-linux-gnueabi/busybox/1.35.0-r0/build"
D="/work/build/tmp/work/cortexa9t2hf-neon-xilinx-linux-gnueabi/busybox/1.35.0-r0/image"
DEPLOY_DIR="/work/build/tmp/deploy"
"#;

    struct CannedEnvironment {
        text: &'static str,
        reads: Cell<usize>,
    }

    impl CannedEnvironment {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                reads: Cell::new(0),
            }
        }
    }

    impl RecipeEnvironmentReader for CannedEnvironment {
        fn read_environment(&self, _ctx: &DirectoryContext, _target: &str) -> BitbakeResult<String> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.text.to_string())
        }
    }

    #[test]
    fn test_clean_variable_line_all_prefixes() {
        for variable in RecipeVariable::ALL {
            let line = format!("{}\"/some/path\"", variable.prefix());
            assert_eq!(
                clean_variable_line(&line, variable.prefix()),
                Some(PathBuf::from("/some/path"))
            );
        }
    }

    #[test]
    fn test_clean_variable_line_drops_leading_noise() {
        assert_eq!(
            clean_variable_line("S= x\"/a/b/\"", "S="),
            Some(PathBuf::from("/a/b"))
        );
        assert_eq!(
            clean_variable_line("S=\"//a/./b/../c\"\r", "S="),
            Some(PathBuf::from("/a/c"))
        );
    }

    #[test]
    fn test_clean_variable_line_without_slash() {
        assert_eq!(clean_variable_line("S=\"\"", "S="), None);
        assert_eq!(clean_variable_line("S=\"relative\"", "S="), None);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new("/x//y/")), PathBuf::from("/x/y"));
    }

    #[test]
    fn test_prefix_parsing() {
        assert_eq!("S".parse::<RecipeVariable>().unwrap(), RecipeVariable::Source);
        assert_eq!("B=".parse::<RecipeVariable>().unwrap(), RecipeVariable::Build);
        assert_eq!("^D=".parse::<RecipeVariable>().unwrap(), RecipeVariable::Install);
        match "WORKDIR=".parse::<RecipeVariable>() {
            Err(BitbakeError::PrefixNotSupported(prefix)) => assert_eq!(prefix, "WORKDIR="),
            other => panic!("Expected PrefixNotSupported, got {:?}", other),
        }
    }

    #[test]
    fn test_link_dir_per_variable() {
        let ctx = DirectoryContext::from_top_dir("/bsp");
        assert_eq!(RecipeVariable::Source.link_dir(&ctx), Path::new("/bsp/links/sources"));
        assert_eq!(RecipeVariable::Build.link_dir(&ctx), Path::new("/bsp/links/builds"));
        assert_eq!(RecipeVariable::Install.link_dir(&ctx), Path::new("/bsp/links/install"));
    }

    #[test]
    fn test_extract_each_directory() {
        let reader = CannedEnvironment::new(BUSYBOX_ENV);
        let ctx = DirectoryContext::from_top_dir("/work");
        let base = "/work/build/tmp/work/cortexa9t2hf-neon-xilinx-linux-gnueabi/busybox/1.35.0-r0";

        let source = extract_field(&reader, &ctx, "busybox", RecipeVariable::Source).unwrap();
        let build = extract_field(&reader, &ctx, "busybox", RecipeVariable::Build).unwrap();
        let install = extract_field(&reader, &ctx, "busybox", RecipeVariable::Install).unwrap();

        assert_eq!(source, PathBuf::from(format!("{base}/busybox-1.35.0")));
        assert_eq!(build, PathBuf::from(format!("{base}/build")));
        assert_eq!(install, PathBuf::from(format!("{base}/image")));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let reader = CannedEnvironment::new(BUSYBOX_ENV);
        let ctx = DirectoryContext::from_top_dir("/work");

        let first = extract_field(&reader, &ctx, "busybox", RecipeVariable::Source).unwrap();
        let second = extract_field(&reader, &ctx, "busybox", RecipeVariable::Source).unwrap();
        assert_eq!(first, second);
        assert_eq!(reader.reads.get(), 2);
    }

    #[test]
    fn test_extract_missing_variable() {
        let reader = CannedEnvironment::new("DEPLOY_DIR=\"/work/build/tmp/deploy\"\n");
        let ctx = DirectoryContext::from_top_dir("/work");

        match extract_field(&reader, &ctx, "busybox", RecipeVariable::Build) {
            Err(BitbakeError::VariableNotFound { target, variable }) => {
                assert_eq!(target, "busybox");
                assert_eq!(variable, "B");
            }
            other => panic!("Expected VariableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_empty_value_is_not_a_path() {
        let reader = CannedEnvironment::new("S=\"\"\n");
        let ctx = DirectoryContext::from_top_dir("/work");

        assert!(matches!(
            extract_field(&reader, &ctx, "busybox", RecipeVariable::Source),
            Err(BitbakeError::NotAPath { .. })
        ));
    }

    #[test]
    fn test_extract_requires_initialized_context() {
        let reader = CannedEnvironment::new(BUSYBOX_ENV);

        assert!(matches!(
            extract_field(&reader, &DirectoryContext::default(), "busybox", RecipeVariable::Source),
            Err(BitbakeError::UninitializedContext)
        ));
        assert_eq!(reader.reads.get(), 0);
    }

    #[test]
    fn test_prefix_must_start_the_line() {
        let reader = CannedEnvironment::new("export PS=\"/wrong\"\nS=\"/right\"\n");
        let ctx = DirectoryContext::from_top_dir("/work");

        assert_eq!(
            extract_field(&reader, &ctx, "busybox", RecipeVariable::Source).unwrap(),
            PathBuf::from("/right")
        );
    }
}
