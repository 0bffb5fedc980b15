//! Plan output formats.

use std::io::{self, Write};

use poly_variant::{BatchSpec, BuildVariant};
use serde::Serialize;

use crate::command::CompileCommand;

/// Receives a plan, batch by batch.
pub trait PlanWriter {
    /// Called once before anything else.
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Called before the variants of `spec`.
    fn batch(&mut self, _spec: &BatchSpec) -> io::Result<()> {
        Ok(())
    }

    /// Called for every variant, in order.
    fn variant(&mut self, variant: &BuildVariant, command: &CompileCommand) -> io::Result<()>;

    /// Called once after the last variant.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Shell
// ============================================================================

/// One shell command per line, optionally framed as an executable script.
pub struct ShellWriter<W> {
    out: W,
    script: bool,
}

impl<W: Write> ShellWriter<W> {
    /// Bare command lines.
    pub fn lines(out: W) -> Self {
        Self { out, script: false }
    }

    /// A `/bin/sh` script that stops at the first failing build.
    pub fn script(out: W) -> Self {
        Self { out, script: true }
    }
}

impl<W: Write> PlanWriter for ShellWriter<W> {
    fn begin(&mut self) -> io::Result<()> {
        if self.script {
            writeln!(self.out, "#!/bin/sh")?;
            writeln!(self.out, "set -e")?;
        }
        Ok(())
    }

    fn batch(&mut self, spec: &BatchSpec) -> io::Result<()> {
        if self.script {
            writeln!(
                self.out,
                "# {}: {} x {} ({})",
                spec.name_prefix,
                spec.count,
                spec.source_file.display(),
                spec.mode
            )?;
        }
        Ok(())
    }

    fn variant(&mut self, _variant: &BuildVariant, command: &CompileCommand) -> io::Result<()> {
        writeln!(self.out, "{}", command.to_shell())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

// ============================================================================
// JSON lines
// ============================================================================

/// One JSON object per variant.
pub struct JsonWriter<W> {
    out: W,
}

#[derive(Serialize)]
struct Record<'a> {
    #[serde(flatten)]
    variant: &'a BuildVariant,
    literal: Option<String>,
    argv: Vec<&'a str>,
}

impl<W: Write> JsonWriter<W> {
    /// Write records to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PlanWriter for JsonWriter<W> {
    fn variant(&mut self, variant: &BuildVariant, command: &CompileCommand) -> io::Result<()> {
        let record = Record {
            variant,
            literal: variant.seed().map(|s| s.to_literal()),
            argv: command.argv(),
        };
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use poly_variant::{SeedMode, generate};

    use super::*;
    use crate::manifest::Toolchain;

    fn render(writer: &mut dyn PlanWriter, spec: &BatchSpec) {
        let toolchain = Toolchain::default();
        let mut source = || 7_u64;
        writer.begin().unwrap();
        writer.batch(spec).unwrap();
        for variant in generate(spec, &mut source).unwrap() {
            let command = CompileCommand::for_variant(&toolchain, &variant);
            writer.variant(&variant, &command).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn shell_lines_one_per_variant() {
        let spec = BatchSpec::new(2, SeedMode::Random, "seeded", "simple.cpp", "output");
        let mut out = Vec::new();
        render(&mut ShellWriter::lines(&mut out), &spec);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("-o output/seeded1.exe"));
        assert!(lines[1].contains("__POLY_RANDOM_SEED__=7ull"));
    }

    #[test]
    fn shell_script_has_header() {
        let spec = BatchSpec::new(1, SeedMode::None, "random", "simple.cpp", "output");
        let mut out = Vec::new();
        render(&mut ShellWriter::script(&mut out), &spec);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("#!/bin/sh\nset -e\n# random: 1 x simple.cpp (none)\n"));
    }

    #[test]
    fn json_records_carry_seed() {
        let spec = BatchSpec::new(1, SeedMode::Fixed, "fixed", "simple.cpp", "output")
            .with_fixed_seed(1234567890_u64);
        let mut out = Vec::new();
        render(&mut JsonWriter::new(&mut out), &spec);

        let record: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(record["seed_mode"], "fixed");
        assert_eq!(record["seed"], 1234567890_u64);
        assert_eq!(record["literal"], "1234567890ull");
        assert_eq!(record["output_path"], "output/fixed1.exe");
        assert_eq!(record["argv"][0], "g++");
    }

    #[test]
    fn json_unseeded_literal_is_null() {
        let spec = BatchSpec::new(1, SeedMode::None, "random", "simple.cpp", "output");
        let mut out = Vec::new();
        render(&mut JsonWriter::new(&mut out), &spec);

        let record: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(record["seed"].is_null());
        assert!(record["literal"].is_null());
    }
}
