//! `imageplan check` — Compile the manifest and report a summary.

use std::path::Path;

use clap::Args;

use super::PlanOptionArgs;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Compile options.
    #[command(flatten)]
    pub options: PlanOptionArgs,
}

/// Executes the `check` command.
///
/// Runs the full compilation, including exclusion validation, without
/// producing a pipeline description.
///
/// # Errors
///
/// Returns an error if loading or compilation fails.
pub fn execute(workspace: &Path, manifest: &Path, args: CheckArgs) -> anyhow::Result<()> {
    let plan = super::compile_workspace(workspace, manifest, args.options)?;
    print!("{}", crate::output::summarize(&plan));
    Ok(())
}
