//! CLI command definitions and dispatch.

pub mod check;
pub mod render;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use imageplan_common::config::OptionLayer;
use imageplan_common::constants::DEFAULT_MANIFEST_FILE;
use imageplan_compose::BuildPlan;

/// imageplan: generate multi-image build pipelines from versions.yaml.
#[derive(Parser, Debug)]
#[command(name = "imageplan", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Workspace directory holding the manifest and the tests/ catalog.
    #[arg(long, short = 'C', global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Manifest path, relative to the workspace.
    #[arg(long, global = true, default_value = DEFAULT_MANIFEST_FILE)]
    pub manifest: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the manifest and print the pipeline description.
    Render(render::RenderArgs),
    /// Compile the manifest and report a summary without rendering.
    Check(check::CheckArgs),
}

/// Compile options accepted on the command line.
///
/// Every flag is optional; unset flags fall back to the manifest's
/// `cloudbuild:` section, then to built-in defaults.
#[derive(Args, Debug, Default)]
pub struct PlanOptionArgs {
    /// Registry, e.g. 'gcr.io/my-project'.
    #[arg(long, env = "IMAGEPLAN_REGISTRY")]
    pub registry: Option<String>,

    /// Comma separated list of Dockerfile dirs to use.
    #[arg(long, value_delimiter = ',')]
    pub dirs: Option<Vec<String>>,

    /// Run tests.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub tests: Option<bool>,

    /// Require that image tags do not already exist.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub new_tags: Option<bool>,

    /// Ship only the first tag per version.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub first_tag: Option<bool>,

    /// Timeout in seconds. If not set, the host default timeout is used.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Machine type: N1_HIGHCPU_8, N1_HIGHCPU_32, E2_HIGHCPU_8 or E2_HIGHCPU_32.
    #[arg(long)]
    pub machine_type: Option<String>,

    /// Enable parallel build and bigger VM.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub enable_parallel: Option<bool>,

    /// Force parallel build and bigger VM.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub force_parallel: Option<bool>,
}

impl PlanOptionArgs {
    /// Converts the flags into the command-line option layer.
    #[must_use]
    pub fn into_layer(self) -> OptionLayer {
        OptionLayer {
            registry: self.registry,
            dirs: self.dirs,
            tests: self.tests,
            new_tags: self.new_tags,
            first_tag: self.first_tag,
            timeout: self.timeout,
            machine_type: self.machine_type,
            enable_parallel: self.enable_parallel,
            force_parallel: self.force_parallel,
        }
    }
}

/// Loads the manifest and catalog under `workspace` and compiles a plan.
///
/// # Errors
///
/// Returns an error if loading, option resolution, or compilation fails.
pub fn compile_workspace(
    workspace: &Path,
    manifest: &Path,
    flags: PlanOptionArgs,
) -> anyhow::Result<BuildPlan> {
    let manifest_path = workspace.join(manifest);
    let manifest = imageplan_compose::manifest::load_manifest(&manifest_path)?;
    let (registry, options) = manifest.options.merge(flags.into_layer()).resolve()?;
    let catalog = imageplan_compose::catalog::load_catalog(workspace)?;
    let plan = imageplan_compose::compile(&registry, &manifest.versions, &catalog, &options)?;
    Ok(plan)
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Render(args) => render::execute(&cli.workspace, &cli.manifest, args),
        Command::Check(args) => check::execute(&cli.workspace, &cli.manifest, args),
    }
}
