//! Build graph compilation.
//!
//! Turns image definitions into build steps in manifest order, infers
//! builder dependencies, and decides whether the plan is scheduled in
//! parallel or sequentially.

use imageplan_common::config::CompileOptions;
use imageplan_common::error::{ImagePlanError, Result};
use imageplan_common::types::{Registry, StepId};

use crate::catalog::TestCatalog;
use crate::graph::WaitGraph;
use crate::manifest::ImageDefinition;
use crate::plan::{BuildAction, BuildStep};
use crate::selection::{SelectedTests, select_tests};

/// Output of the compiler, ready for plan assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSteps {
    /// One build step per selected image definition, in manifest order.
    pub steps: Vec<BuildStep>,
    /// Every shippable image name, builder-only images excluded.
    pub images: Vec<String>,
    /// Whether the plan is scheduled in parallel.
    pub parallel: bool,
}

/// Decides the scheduling mode for a whole plan.
///
/// `force_parallel` always wins. Otherwise parallel scheduling needs
/// `enable_parallel` and more than one version or functional test.
#[must_use]
pub const fn should_parallelize(
    options: &CompileOptions,
    version_count: usize,
    functional_test_count: usize,
) -> bool {
    if options.force_parallel {
        return true;
    }
    if !options.enable_parallel {
        return false;
    }
    version_count > 1 || functional_test_count > 1
}

/// Compiles image definitions into build steps.
///
/// Exclusions are checked against the whole catalog even when tests are
/// disabled, so a stale exclusion never goes unnoticed.
///
/// # Errors
///
/// Returns an error if an exclusion names an unknown test, a definition
/// has no tags or lacks its builder-derived name, or builder
/// dependencies form a cycle.
pub fn compile_steps(
    registry: &Registry,
    definitions: &[ImageDefinition],
    catalog: &TestCatalog,
    options: &CompileOptions,
) -> Result<CompiledSteps> {
    let mut steps = Vec::new();
    let mut images = Vec::new();

    for def in definitions {
        if !options.selects(&def.dir) {
            tracing::debug!(dir = %def.dir, "skipping unselected directory");
            continue;
        }

        let expanded = expand_tags(registry, def, options.first_tag_only);
        if !def.builder {
            images.extend(expanded.iter().cloned());
        }

        let selected = select_tests(catalog, def)?;
        let tests = if options.run_tests {
            selected
        } else {
            SelectedTests::default()
        };

        steps.push(build_step(registry, def, expanded, tests)?);
    }

    let functional_tests = if options.run_tests {
        catalog.functional.len()
    } else {
        0
    };
    let parallel = should_parallelize(options, definitions.len(), functional_tests);

    if parallel {
        let graph = WaitGraph::from_steps(&steps);
        let order = graph.resolve_order()?;
        tracing::debug!(nodes = order.len(), "wait graph is acyclic");
        for step in &steps {
            if let Some(dep) = &step.depends_on {
                if !graph.contains(dep) {
                    tracing::warn!(
                        step = %step.id,
                        waits_for = %dep,
                        "builder image is not built by this plan"
                    );
                }
            }
        }
    }

    tracing::info!(
        steps = steps.len(),
        images = images.len(),
        parallel,
        "compiled build steps"
    );
    Ok(CompiledSteps {
        steps,
        images,
        parallel,
    })
}

/// Expands the tag list into `<registry>/<repo>:<tag>` names.
fn expand_tags(registry: &Registry, def: &ImageDefinition, first_tag_only: bool) -> Vec<String> {
    let take = if first_tag_only { 1 } else { def.tags.len() };
    def.tags
        .iter()
        .take(take)
        .map(|tag| registry.image(&def.repo, tag))
        .collect()
}

/// Builds the step for one definition.
///
/// With a builder image the canonical tag is the builder-derived name and
/// every expanded tag becomes an alias; otherwise the first expanded tag is
/// canonical and the rest are aliases. Builder-only images never carry
/// aliases and are always built directly.
fn build_step(
    registry: &Registry,
    def: &ImageDefinition,
    expanded: Vec<String>,
    tests: SelectedTests,
) -> Result<BuildStep> {
    let (tag, aliases, builder_image) = match def.builder_image() {
        Some(reference) => {
            let derived = def.image_name_from_builder().ok_or_else(|| {
                ImagePlanError::inconsistency(format!(
                    "version in \"{}\" uses builder image \"{reference}\" but sets no imageNameFromBuilder",
                    def.dir
                ))
            })?;
            (derived.to_string(), expanded, Some(registry.qualify(reference)))
        }
        None => {
            let mut names = expanded.into_iter();
            let Some(first) = names.next() else {
                return Err(ImagePlanError::inconsistency(format!(
                    "version in \"{}\" declares no tags",
                    def.dir
                )));
            };
            (first, names.collect(), None)
        }
    };

    let (action, depends_on) = match builder_image {
        Some(image) if !def.builder => {
            let dep = StepId::image(&image);
            (
                BuildAction::Builder {
                    image,
                    args: def.builder_args.clone(),
                },
                Some(dep),
            )
        }
        _ => (BuildAction::Docker, None),
    };

    tracing::debug!(
        dir = %def.dir,
        tag = %tag,
        builder = def.builder,
        depends_on = ?depends_on,
        "compiled build step"
    );

    Ok(BuildStep {
        id: StepId::image(&tag),
        directory: def.dir.clone(),
        tag,
        action,
        depends_on,
        aliases: if def.builder { Vec::new() } else { aliases },
        structure_tests: tests.structure,
        functional_tests: tests.functional,
        builder: def.builder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::parse("gcr.io/proj").expect("registry")
    }

    fn make_definition(dir: &str, repo: &str, tags: &[&str]) -> ImageDefinition {
        ImageDefinition {
            dir: dir.into(),
            repo: repo.into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            ..ImageDefinition::default()
        }
    }

    fn parallel_options() -> CompileOptions {
        CompileOptions {
            force_parallel: true,
            ..CompileOptions::default()
        }
    }

    #[test]
    fn force_parallel_always_wins() {
        assert!(should_parallelize(&parallel_options(), 1, 0));
    }

    #[test]
    fn enable_parallel_needs_more_than_one_version_or_test() {
        let options = CompileOptions {
            enable_parallel: true,
            ..CompileOptions::default()
        };
        assert!(!should_parallelize(&options, 1, 0));
        assert!(!should_parallelize(&options, 1, 1));
        assert!(should_parallelize(&options, 2, 0));
        assert!(should_parallelize(&options, 1, 2));
    }

    #[test]
    fn parallel_is_off_by_default() {
        assert!(!should_parallelize(&CompileOptions::default(), 10, 10));
    }

    #[test]
    fn direct_build_uses_first_tag_and_aliases_the_rest() {
        let defs = [make_definition("a", "foo", &["1.0", "1", "latest"])];
        let compiled = compile_steps(&registry(), &defs, &TestCatalog::default(), &CompileOptions::default())
            .expect("compile");
        let step = &compiled.steps[0];
        assert_eq!(step.tag, "gcr.io/proj/foo:1.0");
        assert_eq!(step.id.as_str(), "image-gcr.io/proj/foo:1.0");
        assert_eq!(step.aliases, vec!["gcr.io/proj/foo:1", "gcr.io/proj/foo:latest"]);
        assert_eq!(step.action, BuildAction::Docker);
        assert_eq!(step.depends_on, None);
        assert_eq!(compiled.images.len(), 3);
    }

    #[test]
    fn builder_image_makes_derived_name_canonical() {
        let def = ImageDefinition {
            builder_image: Some("x/base".into()),
            builder_args: vec!["--out".into(), "app".into()],
            image_name_from_builder: Some("gcr.io/proj/app:built".into()),
            ..make_definition("app", "app", &["2.0", "latest"])
        };
        let compiled = compile_steps(&registry(), &[def], &TestCatalog::default(), &parallel_options())
            .expect("compile");
        let step = &compiled.steps[0];
        assert_eq!(step.tag, "gcr.io/proj/app:built");
        assert_eq!(step.aliases, vec!["gcr.io/proj/app:2.0", "gcr.io/proj/app:latest"]);
        assert_eq!(
            step.action,
            BuildAction::Builder {
                image: "gcr.io/proj/x/base".into(),
                args: vec!["--out".into(), "app".into()],
            }
        );
        assert_eq!(step.depends_on, Some(StepId::image("gcr.io/proj/x/base")));
    }

    #[test]
    fn builder_only_images_are_built_but_not_shipped() {
        let base = ImageDefinition {
            builder: true,
            ..make_definition("base", "base", &["1", "latest"])
        };
        let app = make_definition("app", "app", &["1"]);
        let compiled = compile_steps(
            &registry(),
            &[base, app],
            &TestCatalog::default(),
            &CompileOptions::default(),
        )
        .expect("compile");
        assert_eq!(compiled.steps.len(), 2);
        assert!(compiled.steps[0].builder);
        assert!(compiled.steps[0].aliases.is_empty());
        assert_eq!(compiled.images, vec!["gcr.io/proj/app:1"]);
    }

    #[test]
    fn first_tag_only_keeps_one_name_per_image() {
        let defs = [make_definition("a", "foo", &["1.0", "latest"])];
        let options = CompileOptions {
            first_tag_only: true,
            ..CompileOptions::default()
        };
        let compiled = compile_steps(&registry(), &defs, &TestCatalog::default(), &options)
            .expect("compile");
        assert_eq!(compiled.steps.len(), 1);
        assert_eq!(compiled.steps[0].tag, "gcr.io/proj/foo:1.0");
        assert!(compiled.steps[0].aliases.is_empty());
        assert_eq!(compiled.images, vec!["gcr.io/proj/foo:1.0"]);
    }

    #[test]
    fn directory_filter_skips_unselected_definitions() {
        let defs = [
            make_definition("a", "foo", &["1"]),
            make_definition("b", "bar", &["1"]),
        ];
        let options = CompileOptions {
            directories: ["b".to_string()].into_iter().collect(),
            ..CompileOptions::default()
        };
        let compiled = compile_steps(&registry(), &defs, &TestCatalog::default(), &options)
            .expect("compile");
        assert_eq!(compiled.steps.len(), 1);
        assert_eq!(compiled.steps[0].directory, "b");
    }

    #[test]
    fn parallel_counts_all_versions_not_only_selected() {
        let defs = [
            make_definition("a", "foo", &["1"]),
            make_definition("b", "bar", &["1"]),
        ];
        let options = CompileOptions {
            enable_parallel: true,
            directories: ["a".to_string()].into_iter().collect(),
            ..CompileOptions::default()
        };
        let compiled = compile_steps(&registry(), &defs, &TestCatalog::default(), &options)
            .expect("compile");
        assert!(compiled.parallel);
    }

    #[test]
    fn disabled_tests_still_validate_exclusions() {
        let def = ImageDefinition {
            exclude_tests: vec!["tests/gone_test.yaml".into()],
            ..make_definition("a", "foo", &["1"])
        };
        let options = CompileOptions {
            run_tests: false,
            ..CompileOptions::default()
        };
        let err = compile_steps(&registry(), &[def], &TestCatalog::default(), &options).unwrap_err();
        assert!(matches!(err, ImagePlanError::ManifestInconsistency { .. }));
    }

    #[test]
    fn disabled_tests_attach_nothing() {
        let catalog = TestCatalog::from_paths(
            ["/workspace/tests/a_test.yaml"],
            ["/workspace/tests/functional_tests/b_test.yaml"],
        );
        let options = CompileOptions {
            run_tests: false,
            ..CompileOptions::default()
        };
        let compiled = compile_steps(&registry(), &[make_definition("a", "foo", &["1"])], &catalog, &options)
            .expect("compile");
        assert!(compiled.steps[0].structure_tests.is_empty());
        assert!(compiled.steps[0].functional_tests.is_empty());
    }

    #[test]
    fn cyclic_builder_dependencies_fail_under_parallel() {
        let a = ImageDefinition {
            builder_image: Some("b:1".into()),
            image_name_from_builder: Some("gcr.io/proj/a:1".into()),
            ..make_definition("a", "a", &["1"])
        };
        let b = ImageDefinition {
            builder_image: Some("a:1".into()),
            image_name_from_builder: Some("gcr.io/proj/b:1".into()),
            ..make_definition("b", "b", &["1"])
        };
        let err = compile_steps(&registry(), &[a, b], &TestCatalog::default(), &parallel_options())
            .unwrap_err();
        assert!(err.to_string().contains("cyclic"), "got: {err}");
    }

    #[test]
    fn definition_without_tags_fails() {
        let err = compile_steps(
            &registry(),
            &[make_definition("a", "foo", &[])],
            &TestCatalog::default(),
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("declares no tags"), "got: {err}");
    }
}
