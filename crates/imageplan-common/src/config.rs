//! Compile options and their layered configuration sources.
//!
//! Options come from two layers: the `cloudbuild:` section of the
//! manifest supplies defaults, and command-line flags override them.
//! Both layers are merged into an [`OptionLayer`] and resolved once into
//! an immutable [`CompileOptions`] value plus the validated [`Registry`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::KNOWN_MACHINE_TYPES;
use crate::error::{ImagePlanError, Result};
use crate::types::Registry;

/// Options steering one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Directories to compile. Empty means every directory in the manifest.
    pub directories: BTreeSet<String>,
    /// Whether catalog tests are attached to build steps.
    pub run_tests: bool,
    /// Whether every shippable tag must not already exist in the registry.
    pub require_new_tags: bool,
    /// Whether only the first declared tag of each image is shipped.
    pub first_tag_only: bool,
    /// Build timeout in seconds. Zero leaves the host default in place.
    pub timeout_seconds: u64,
    /// Machine class hint for the build host.
    pub machine_type: Option<String>,
    /// Allow parallel scheduling when the plan is large enough.
    pub enable_parallel: bool,
    /// Always schedule in parallel. Takes precedence over `enable_parallel`.
    pub force_parallel: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            directories: BTreeSet::new(),
            run_tests: true,
            require_new_tags: false,
            first_tag_only: false,
            timeout_seconds: 0,
            machine_type: None,
            enable_parallel: false,
            force_parallel: false,
        }
    }
}

impl CompileOptions {
    /// Returns `true` if `dir` passes the directory filter.
    #[must_use]
    pub fn selects(&self, dir: &str) -> bool {
        self.directories.is_empty() || self.directories.contains(dir)
    }
}

/// One partially specified layer of options.
///
/// Field names follow the historical flag names so the same keys work in
/// the manifest's `cloudbuild:` section and on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionLayer {
    /// Registry prefix, e.g. `gcr.io/my-project`.
    pub registry: Option<String>,
    /// Dockerfile directories to restrict the build to.
    pub dirs: Option<Vec<String>>,
    /// Run tests.
    pub tests: Option<bool>,
    /// Require that image tags do not already exist.
    pub new_tags: Option<bool>,
    /// Ship only the first tag per version.
    pub first_tag: Option<bool>,
    /// Timeout in seconds.
    pub timeout: Option<u64>,
    /// Machine class for the build host.
    #[serde(alias = "machineType")]
    pub machine_type: Option<String>,
    /// Enable parallel build and bigger VM.
    pub enable_parallel: Option<bool>,
    /// Force parallel build and bigger VM.
    pub force_parallel: Option<bool>,
}

impl OptionLayer {
    /// Overlays `over` on top of `self`; values set in `over` win.
    #[must_use]
    pub fn merge(self, over: Self) -> Self {
        Self {
            registry: over.registry.or(self.registry),
            dirs: over.dirs.or(self.dirs),
            tests: over.tests.or(self.tests),
            new_tags: over.new_tags.or(self.new_tags),
            first_tag: over.first_tag.or(self.first_tag),
            timeout: over.timeout.or(self.timeout),
            machine_type: over.machine_type.or(self.machine_type),
            enable_parallel: over.enable_parallel.or(self.enable_parallel),
            force_parallel: over.force_parallel.or(self.force_parallel),
        }
    }

    /// Resolves the layer into a registry and immutable compile options.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the registry is missing or empty,
    /// or if the machine type is not a known machine class.
    pub fn resolve(self) -> Result<(Registry, CompileOptions)> {
        let registry = Registry::parse(self.registry.as_deref().unwrap_or_default())?;

        let machine_type = match self.machine_type.map(|m| m.trim().to_string()) {
            Some(m) if m.is_empty() => None,
            Some(m) if !KNOWN_MACHINE_TYPES.contains(&m.as_str()) => {
                return Err(ImagePlanError::config(format!(
                    "machine type \"{m}\" must be one of: {}",
                    KNOWN_MACHINE_TYPES.join(", ")
                )));
            }
            other => other,
        };

        let defaults = CompileOptions::default();
        let options = CompileOptions {
            directories: self
                .dirs
                .unwrap_or_default()
                .into_iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
            run_tests: self.tests.unwrap_or(defaults.run_tests),
            require_new_tags: self.new_tags.unwrap_or(defaults.require_new_tags),
            first_tag_only: self.first_tag.unwrap_or(defaults.first_tag_only),
            timeout_seconds: self.timeout.unwrap_or(defaults.timeout_seconds),
            machine_type,
            enable_parallel: self.enable_parallel.unwrap_or(defaults.enable_parallel),
            force_parallel: self.force_parallel.unwrap_or(defaults.force_parallel),
        };
        Ok((registry, options))
    }
}
