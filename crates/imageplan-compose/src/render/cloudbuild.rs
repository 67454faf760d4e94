//! Cloud Build YAML renderer.
//!
//! Emits sections in a fixed order: tag checks, image builds, structure
//! tests, functional tests, alias tags, then the image list and global
//! options. `waitFor`/`id` keys only appear in parallel plans.

use std::fmt::{self, Write};

use imageplan_common::constants::{
    DOCKER_BUILDER, FUNCTIONAL_TEST_BUILDER, STRUCTURE_TEST_BUILDER, TAG_CHECK_BUILDER,
};
use imageplan_common::error::{ImagePlanError, Result};

use super::PlanRenderer;
use crate::plan::{BuildAction, BuildPlan, BuildStep};

/// Renders a plan as a `cloudbuild.yaml` document.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudBuildRenderer;

impl PlanRenderer for CloudBuildRenderer {
    fn render(&self, plan: &BuildPlan) -> Result<String> {
        let mut out = String::new();
        write_plan(&mut out, plan).map_err(|_| ImagePlanError::Render {
            format: "cloudbuild",
        })?;
        Ok(out)
    }
}

/// Single-quotes a YAML scalar.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn write_args(out: &mut String, args: &[&str]) -> fmt::Result {
    write!(out, "\n    args:")?;
    for arg in args {
        write!(out, "\n      - {}", quote(arg))?;
    }
    Ok(())
}

fn write_plan(out: &mut String, plan: &BuildPlan) -> fmt::Result {
    let parallel = plan.is_parallel();
    out.push_str("steps:");

    if !plan.preflight().is_empty() {
        out.push_str("\n# Check if tags exist.");
        for check in plan.preflight() {
            write!(out, "\n  - name: {TAG_CHECK_BUILDER}")?;
            write_args(
                out,
                &["python", "/main.py", format!("--image={}", check.image).as_str()],
            )?;
        }
    }

    out.push_str("\n\n# Build images");
    for step in plan.steps() {
        write_build(out, step, parallel)?;
    }

    let mut first = true;
    for step in plan.steps() {
        for test in &step.structure_tests {
            if first {
                out.push_str("\n\n# Run structure tests");
                first = false;
            }
            write!(out, "\n  - name: {STRUCTURE_TEST_BUILDER}")?;
            write_args(out, &["--image", step.tag.as_str(), "--config", test.as_str()])?;
        }
    }

    let runs = plan.test_runs();
    if !runs.is_empty() {
        out.push_str("\n\n# Run functional tests");
    }
    for run in &runs {
        write!(out, "\n  - name: {FUNCTIONAL_TEST_BUILDER}")?;
        write_args(
            out,
            &[
                "--verbose",
                "--vars",
                format!("IMAGE={}", run.image).as_str(),
                "--vars",
                format!("UNIQUE={}", run.unique).as_str(),
                "--test_spec",
                run.spec.as_str(),
            ],
        )?;
        if parallel {
            let waits: Vec<String> = run.wait_for.iter().map(|id| quote(id.as_str())).collect();
            write!(out, "\n    waitFor: [{}]", waits.join(", "))?;
            write!(out, "\n    id: {}", quote(run.id.as_str()))?;
        }
    }

    out.push_str("\n\n# Add alias tags");
    for tag in plan.alias_tags() {
        write!(out, "\n  - name: {DOCKER_BUILDER}")?;
        write_args(out, &["tag", tag.source.as_str(), tag.alias.as_str()])?;
        if parallel {
            out.push_str("\n    waitFor:");
            for id in &tag.wait_for {
                write!(out, "\n      - {}", quote(id.as_str()))?;
            }
        }
    }

    out.push_str("\n\nimages:");
    for image in plan.images() {
        write!(out, "\n  - {}", quote(image))?;
    }

    if let Some(timeout) = plan.timeout_seconds() {
        write!(out, "\n\ntimeout: {timeout}s")?;
    }

    if let Some(machine) = plan.machine_type() {
        write!(out, "\noptions:\n  machineType: {}", quote(machine))?;
    }

    out.push('\n');
    Ok(())
}

fn write_build(out: &mut String, step: &BuildStep, parallel: bool) -> fmt::Result {
    match &step.action {
        BuildAction::Docker => {
            write!(out, "\n  - name: {DOCKER_BUILDER}")?;
            write_args(
                out,
                &["build", format!("--tag={}", step.tag).as_str(), step.directory.as_str()],
            )?;
        }
        BuildAction::Builder { image, args } => {
            write!(out, "\n  - name: {image}")?;
            if args.is_empty() {
                out.push_str("\n    args: []");
            } else {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                write_args(out, &args)?;
            }
        }
    }
    if parallel {
        let waits: Vec<String> = step.wait_for().iter().map(|w| quote(w.as_str())).collect();
        write!(out, "\n    waitFor: [{}]", waits.join(", "))?;
        write!(out, "\n    id: {}", quote(step.id.as_str()))?;
    }
    Ok(())
}
