//! Output helpers for CLI commands.

use std::fmt::Write;
use std::path::Path;

use anyhow::Context;
use imageplan_compose::BuildPlan;

/// Writes rendered text to `path`, or to stdout when no path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn emit(text: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote build plan");
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Formats a human-readable summary of a plan.
#[must_use]
pub fn summarize(plan: &BuildPlan) -> String {
    let mut out = String::new();
    let mode = if plan.is_parallel() {
        "parallel"
    } else {
        "sequential"
    };
    let _ = writeln!(out, "Build plan ({mode})");
    for step in plan.steps() {
        let role = if step.builder { " [builder]" } else { "" };
        let _ = writeln!(out, "  + {}{role}", step.tag);
        let _ = writeln!(out, "      dir: {}", step.directory);
        if let Some(dep) = &step.depends_on {
            let _ = writeln!(out, "      waits for: {dep}");
        }
        if !step.structure_tests.is_empty() || !step.functional_tests.is_empty() {
            let _ = writeln!(
                out,
                "      tests: {} structure, {} functional",
                step.structure_tests.len(),
                step.functional_tests.len()
            );
        }
        for alias in &step.aliases {
            let _ = writeln!(out, "      alias: {alias}");
        }
    }
    let _ = writeln!(
        out,
        "  {} step(s), {} image(s) to ship.",
        plan.steps().len(),
        plan.images().len()
    );
    out
}
