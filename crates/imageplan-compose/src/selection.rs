//! Per-image test selection.
//!
//! Every catalog test applies to every image unless the image excludes
//! it by name. Exclusions must name a discovered test: a stale exclusion
//! usually means a test was renamed or removed, so it aborts compilation.

use std::collections::HashSet;

use imageplan_common::constants::WORKSPACE_PREFIX;
use imageplan_common::error::{ImagePlanError, Result};

use crate::catalog::TestCatalog;
use crate::manifest::ImageDefinition;

/// Tests selected for one image, as workspace paths in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedTests {
    /// Structure tests to run.
    pub structure: Vec<String>,
    /// Functional tests to run.
    pub functional: Vec<String>,
}

/// Selects the catalog tests that apply to `image`.
///
/// # Errors
///
/// Returns a manifest inconsistency error if an exclusion does not match
/// any discovered test.
pub fn select_tests(catalog: &TestCatalog, image: &ImageDefinition) -> Result<SelectedTests> {
    let mut excluded = HashSet::new();
    for name in &image.exclude_tests {
        let path = format!("{WORKSPACE_PREFIX}{name}");
        if !catalog.contains(&path) {
            return Err(ImagePlanError::inconsistency(format!(
                "no such test to exclude: {name} (excluded by \"{}\")",
                image.dir
            )));
        }
        let _ = excluded.insert(path);
    }

    let keep = |path: &String| !excluded.contains(path);
    let selected = SelectedTests {
        structure: catalog
            .structure
            .iter()
            .map(|d| d.path.clone())
            .filter(keep)
            .collect(),
        functional: catalog
            .functional
            .iter()
            .map(|d| d.path.clone())
            .filter(keep)
            .collect(),
    };

    tracing::debug!(
        dir = %image.dir,
        excluded = image.exclude_tests.len(),
        structure = selected.structure.len(),
        functional = selected.functional.len(),
        "selected tests"
    );
    Ok(selected)
}
