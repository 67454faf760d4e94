//! Build plan assembly.
//!
//! A [`BuildPlan`] is the immutable result of one compilation: preflight
//! tag checks, build steps in a deterministic order, the shippable image
//! list, and the global timeout, machine class, and scheduling mode.

use imageplan_common::config::CompileOptions;
use imageplan_common::constants::{PARALLEL_MACHINE_TYPE, START_IMMEDIATELY};
use imageplan_common::error::Result;
use imageplan_common::types::{Registry, StepId};
use serde::Serialize;

use crate::catalog::TestCatalog;
use crate::compiler::{CompiledSteps, compile_steps};
use crate::manifest::{self, ImageDefinition};

/// How a build step produces its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildAction {
    /// `docker build` of the step's directory.
    Docker,
    /// Invocation of a builder image that produces the step's image.
    Builder {
        /// Fully qualified builder image.
        image: String,
        /// Arguments passed to the builder image.
        args: Vec<String>,
    },
}

/// One compiled unit of work, built from one image definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStep {
    /// Scheduling identifier of this step.
    pub id: StepId,
    /// Source directory.
    pub directory: String,
    /// Canonical image name the step produces.
    pub tag: String,
    /// Build action.
    pub action: BuildAction,
    /// Step that must complete before this one may start.
    pub depends_on: Option<StepId>,
    /// Additional names tagged onto the built image.
    pub aliases: Vec<String>,
    /// Structure tests run against the image.
    pub structure_tests: Vec<String>,
    /// Functional tests run against the image.
    pub functional_tests: Vec<String>,
    /// Whether the image is a pure builder, never shipped.
    pub builder: bool,
}

impl BuildStep {
    /// Wait-conditions of this step under parallel scheduling.
    #[must_use]
    pub fn wait_for(&self) -> Vec<String> {
        self.depends_on.as_ref().map_or_else(
            || vec![START_IMMEDIATELY.to_string()],
            |dep| vec![dep.to_string()],
        )
    }
}

/// Precondition that an image name is not yet present in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCheck {
    /// Fully qualified image name.
    pub image: String,
}

/// A functional test run against one built image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRun {
    /// Scheduling identifier of the run.
    pub id: StepId,
    /// Image under test.
    pub image: String,
    /// Test descriptor path.
    pub spec: String,
    /// Token unique within the plan, `<image index>-<test index>`.
    pub unique: String,
    /// Steps the run waits for under parallel scheduling.
    pub wait_for: Vec<StepId>,
}

/// An alias tag applied to a built image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasTag {
    /// Canonical image name.
    pub source: String,
    /// Alias name.
    pub alias: String,
    /// Steps the aliasing waits for under parallel scheduling.
    pub wait_for: Vec<StepId>,
}

/// The immutable output of one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    preflight: Vec<TagCheck>,
    steps: Vec<BuildStep>,
    images: Vec<String>,
    timeout_seconds: Option<u64>,
    machine_type: Option<String>,
    parallel: bool,
}

impl BuildPlan {
    /// Tag checks to evaluate before any build step runs.
    #[must_use]
    pub fn preflight(&self) -> &[TagCheck] {
        &self.preflight
    }

    /// Build steps in plan order.
    #[must_use]
    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    /// Every shippable image name.
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Build timeout, if any.
    #[must_use]
    pub const fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    /// Machine class hint, if any.
    #[must_use]
    pub fn machine_type(&self) -> Option<&str> {
        self.machine_type.as_deref()
    }

    /// Whether the plan is scheduled in parallel.
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Functional test runs, grouped by image in plan order.
    ///
    /// Wait-conditions are empty for sequential plans.
    #[must_use]
    pub fn test_runs(&self) -> Vec<TestRun> {
        let mut runs = Vec::new();
        for (image_index, step) in self.steps.iter().enumerate() {
            for (test_index, spec) in step.functional_tests.iter().enumerate() {
                runs.push(TestRun {
                    id: StepId::test(&step.tag, test_index),
                    image: step.tag.clone(),
                    spec: spec.clone(),
                    unique: format!("{image_index}-{test_index}"),
                    wait_for: if self.parallel {
                        vec![step.id.clone()]
                    } else {
                        Vec::new()
                    },
                });
            }
        }
        runs
    }

    /// Alias tags, grouped by image in plan order.
    ///
    /// Under parallel scheduling an alias waits for its image and every
    /// functional test of that image.
    #[must_use]
    pub fn alias_tags(&self) -> Vec<AliasTag> {
        let mut tags = Vec::new();
        for step in &self.steps {
            let wait_for: Vec<StepId> = if self.parallel {
                std::iter::once(step.id.clone())
                    .chain((0..step.functional_tests.len()).map(|i| StepId::test(&step.tag, i)))
                    .collect()
            } else {
                Vec::new()
            };
            for alias in &step.aliases {
                tags.push(AliasTag {
                    source: step.tag.clone(),
                    alias: alias.clone(),
                    wait_for: wait_for.clone(),
                });
            }
        }
        tags
    }
}

/// Merges compiled steps and global options into a plan.
///
/// Parallel plans always run on [`PARALLEL_MACHINE_TYPE`]. A zero timeout
/// leaves the host default in place.
#[must_use]
pub fn assemble(compiled: CompiledSteps, options: &CompileOptions) -> BuildPlan {
    let CompiledSteps {
        steps,
        images,
        parallel,
    } = compiled;

    let preflight = if options.require_new_tags {
        images
            .iter()
            .map(|image| TagCheck {
                image: image.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let machine_type = if parallel {
        Some(PARALLEL_MACHINE_TYPE.to_string())
    } else {
        options.machine_type.clone()
    };

    BuildPlan {
        preflight,
        steps,
        images,
        timeout_seconds: (options.timeout_seconds > 0).then_some(options.timeout_seconds),
        machine_type,
        parallel,
    }
}

/// Compiles image definitions and a test catalog into a build plan.
///
/// Only definitions selected by the directory filter are checked.
///
/// # Errors
///
/// Returns an error if a selected definition is inconsistent, an
/// exclusion names an unknown test, or builder dependencies form a cycle.
/// No partial plan is ever returned.
pub fn compile(
    registry: &Registry,
    definitions: &[ImageDefinition],
    catalog: &TestCatalog,
    options: &CompileOptions,
) -> Result<BuildPlan> {
    tracing::info!(registry = %registry, versions = definitions.len(), "compiling build plan");
    manifest::validate(
        definitions
            .iter()
            .filter(|def| options.selects(&def.dir)),
    )?;
    let compiled = compile_steps(registry, definitions, catalog, options)?;
    Ok(assemble(compiled, options))
}
