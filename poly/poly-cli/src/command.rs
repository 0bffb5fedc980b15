//! Compiler command lines for build variants.

use std::borrow::Cow;

use poly_seed::MACRO_NAME;
use poly_variant::{BuildVariant, Seed};

use crate::manifest::Toolchain;

/// A compiler invocation, as argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    program: String,
    args: Vec<String>,
}

impl CompileCommand {
    /// `compiler flags... [-D MACRO=seed] source -o output`
    ///
    /// The define is emitted only when the variant carries a seed.
    pub fn for_variant(toolchain: &Toolchain, variant: &BuildVariant) -> Self {
        let mut args = toolchain.flags.clone();
        if let Some(seed) = variant.seed() {
            args.push("-D".into());
            args.push(define(seed));
        }
        args.push(variant.source_file().to_string_lossy().into_owned());
        args.push("-o".into());
        args.push(variant.output_path().to_string_lossy().into_owned());

        Self {
            program: toolchain.compiler.clone(),
            args,
        }
    }

    /// Program followed by arguments.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// A single POSIX shell line.
    pub fn to_shell(&self) -> String {
        self.argv()
            .into_iter()
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `__POLY_RANDOM_SEED__=<literal>`
pub fn define(seed: Seed) -> String {
    format!("{MACRO_NAME}={}", seed.to_literal())
}

/// Single-quote `arg` unless it is made only of shell-safe characters.
fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_./=+:,@%".contains(&b));
    if safe {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}
