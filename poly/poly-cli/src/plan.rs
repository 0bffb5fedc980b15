//! Turning batches into a rendered plan.

use anyhow::{Context, Result};
use poly_variant::{BatchSpec, SeedSource, generate};

use crate::command::CompileCommand;
use crate::manifest::Toolchain;
use crate::render::PlanWriter;

/// Render every batch in order, returning the number of variants written.
///
/// All batches are validated before the first line is written, so a bad
/// batch never leaves a partial plan behind.
pub fn write_plan(
    toolchain: &Toolchain,
    batches: &[BatchSpec],
    source: &mut dyn SeedSource,
    writer: &mut dyn PlanWriter,
) -> Result<usize> {
    for (index, spec) in batches.iter().enumerate() {
        // Generation is lazy, so this validates without drawing.
        generate(spec, &mut || 0_u64)
            .with_context(|| format!("batch {} ('{}')", index + 1, spec.name_prefix))?;
    }

    writer.begin().context("writing plan")?;

    let mut written = 0;
    for spec in batches {
        writer.batch(spec).context("writing plan")?;

        let variants = generate(spec, source)?;
        tracing::info!(
            prefix = %spec.name_prefix,
            mode = %spec.mode,
            count = variants.len(),
            "planning batch"
        );

        for variant in variants {
            let command = CompileCommand::for_variant(toolchain, &variant);
            writer
                .variant(&variant, &command)
                .context("writing plan")?;
            written += 1;
        }
    }

    writer.finish().context("writing plan")?;
    Ok(written)
}
