//! Plan renderers.
//!
//! A renderer turns a [`BuildPlan`] into the text of a concrete pipeline
//! description. Output is deterministic: the same plan always renders to
//! the same bytes, one step per build, test, or tag action, in plan order.

pub mod cloudbuild;
pub mod json;

use std::fmt;
use std::str::FromStr;

use imageplan_common::error::{ImagePlanError, Result};

use crate::plan::BuildPlan;

pub use self::cloudbuild::CloudBuildRenderer;
pub use self::json::JsonRenderer;

/// Serializes a build plan to text.
pub trait PlanRenderer {
    /// Renders `plan`.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be serialized.
    fn render(&self, plan: &BuildPlan) -> Result<String>;
}

/// Output formats known to the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderFormat {
    /// Cloud Build YAML.
    #[default]
    CloudBuild,
    /// The plan itself as JSON.
    Json,
}

impl RenderFormat {
    /// Returns the renderer for this format.
    #[must_use]
    pub fn renderer(self) -> Box<dyn PlanRenderer> {
        match self {
            Self::CloudBuild => Box::new(CloudBuildRenderer),
            Self::Json => Box::new(JsonRenderer),
        }
    }
}

impl FromStr for RenderFormat {
    type Err = ImagePlanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cloudbuild" | "yaml" => Ok(Self::CloudBuild),
            "json" => Ok(Self::Json),
            other => Err(ImagePlanError::config(format!(
                "unknown output format \"{other}\", expected cloudbuild or json"
            ))),
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CloudBuild => write!(f, "cloudbuild"),
            Self::Json => write!(f, "json"),
        }
    }
}
