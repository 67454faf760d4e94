//! Domain primitive types used across the imageplan workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ImagePlanError, Result};

/// Registry prefix under which every image name is qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Registry(String);

impl Registry {
    /// Parses a registry option value.
    ///
    /// The first `:` is normalized to `/`, so `gcr.io:my-project` becomes
    /// `gcr.io/my-project`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ImagePlanError::config("--registry flag is required"));
        }
        Ok(Self(value.replacen(':', "/", 1)))
    }

    /// Returns the normalized registry prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualifies a repository path with this registry: `<registry>/<path>`.
    #[must_use]
    pub fn qualify(&self, path: &str) -> String {
        format!("{}/{path}", self.0)
    }

    /// Builds the full image name `<registry>/<repo>:<tag>`.
    #[must_use]
    pub fn image(&self, repo: &str, tag: &str) -> String {
        format!("{}/{repo}:{tag}", self.0)
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduling identifier used in wait-for references between steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(String);

impl StepId {
    /// Identifier of the build step producing `image`.
    #[must_use]
    pub fn image(image: &str) -> Self {
        Self(format!("image-{image}"))
    }

    /// Identifier of the `index`-th functional test run against `image`.
    #[must_use]
    pub fn test(image: &str, index: usize) -> Self {
        Self(format!("test-{image}-{index}"))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a discovered test descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Container structure test.
    Structure,
    /// Functional test run against a built image.
    Functional,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => write!(f, "structure"),
            Self::Functional => write!(f, "functional"),
        }
    }
}
