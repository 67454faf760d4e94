//! `imageplan render` — Compile the manifest and print the pipeline description.

use std::path::{Path, PathBuf};

use clap::Args;
use imageplan_compose::render::{PlanRenderer, RenderFormat};

use super::PlanOptionArgs;

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Compile options.
    #[command(flatten)]
    pub options: PlanOptionArgs,

    /// Output format: cloudbuild or json.
    #[arg(long, default_value_t = RenderFormat::CloudBuild)]
    pub format: RenderFormat,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `render` command.
///
/// # Errors
///
/// Returns an error if compilation or rendering fails, or the output
/// file cannot be written.
pub fn execute(workspace: &Path, manifest: &Path, args: RenderArgs) -> anyhow::Result<()> {
    let plan = super::compile_workspace(workspace, manifest, args.options)?;
    let text = args.format.renderer().render(&plan)?;
    tracing::info!(format = %args.format, bytes = text.len(), "rendered build plan");
    crate::output::emit(&text, args.output.as_deref())
}
