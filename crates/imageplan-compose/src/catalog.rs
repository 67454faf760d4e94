//! Test catalog discovery.
//!
//! Scans the fixed catalog roots of a workspace for test descriptors.
//! A root that does not exist simply contributes no tests.

use std::path::Path;

use imageplan_common::constants::{
    FUNCTIONAL_TESTS_DIR, STRUCTURE_TESTS_DIR, TEST_SUFFIXES, TESTS_DIR, WORKSPACE_PREFIX,
};
use imageplan_common::error::{ImagePlanError, Result};
use imageplan_common::types::TestKind;
use serde::{Deserialize, Serialize};

/// A discovered test descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestDescriptor {
    /// Workspace path, e.g. `/workspace/tests/functional_tests/http_test.yaml`.
    pub path: String,
    /// Test category.
    pub kind: TestKind,
}

impl TestDescriptor {
    /// Creates a descriptor for `root/file_name` under the workspace prefix.
    #[must_use]
    pub fn new(root: &str, file_name: &str, kind: TestKind) -> Self {
        Self {
            path: format!("{WORKSPACE_PREFIX}{root}/{file_name}"),
            kind,
        }
    }
}

/// All tests available to a compilation, partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCatalog {
    /// Structure tests, in discovery order.
    pub structure: Vec<TestDescriptor>,
    /// Functional tests, in discovery order.
    pub functional: Vec<TestDescriptor>,
}

impl TestCatalog {
    /// Builds a catalog from explicit path lists.
    #[must_use]
    pub fn from_paths<S, F>(structure: S, functional: F) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let wrap = |path: String, kind| TestDescriptor { path, kind };
        Self {
            structure: structure
                .into_iter()
                .map(|p| wrap(p.into(), TestKind::Structure))
                .collect(),
            functional: functional
                .into_iter()
                .map(|p| wrap(p.into(), TestKind::Functional))
                .collect(),
        }
    }

    /// Returns `true` if no test was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structure.is_empty() && self.functional.is_empty()
    }

    /// Returns `true` if `path` names a discovered test of either kind.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.descriptors().any(|d| d.path == path)
    }

    /// Iterates over every descriptor, structure tests first.
    pub fn descriptors(&self) -> impl Iterator<Item = &TestDescriptor> {
        self.structure.iter().chain(&self.functional)
    }
}

/// Discovers the test catalog under `workspace`.
///
/// Structure tests come from the legacy `tests/` root followed by
/// `tests/structure_tests/`; functional tests from `tests/functional_tests/`.
///
/// # Errors
///
/// Returns an error if an existing root cannot be read.
pub fn load_catalog(workspace: &Path) -> Result<TestCatalog> {
    tracing::info!(workspace = %workspace.display(), "discovering test catalog");

    let mut structure = read_tests(workspace, TESTS_DIR, TestKind::Structure)?;
    structure.extend(read_tests(workspace, STRUCTURE_TESTS_DIR, TestKind::Structure)?);
    let functional = read_tests(workspace, FUNCTIONAL_TESTS_DIR, TestKind::Functional)?;

    tracing::info!(
        structure = structure.len(),
        functional = functional.len(),
        "test catalog discovered"
    );
    Ok(TestCatalog {
        structure,
        functional,
    })
}

/// Lists the descriptors directly inside one catalog root, sorted by name.
fn read_tests(workspace: &Path, root: &str, kind: TestKind) -> Result<Vec<TestDescriptor>> {
    let dir = workspace.join(root);
    if !dir.is_dir() {
        tracing::debug!(root, "catalog root absent");
        return Ok(Vec::new());
    }

    let io_err = |e| ImagePlanError::Io {
        path: dir.clone(),
        source: e,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if TEST_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .iter()
        .map(|name| TestDescriptor::new(root, name, kind))
        .collect())
}
