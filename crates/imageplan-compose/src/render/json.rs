//! JSON renderer exposing the plan as structured data.

use imageplan_common::error::Result;

use super::PlanRenderer;
use crate::plan::BuildPlan;

/// Renders a plan as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl PlanRenderer for JsonRenderer {
    fn render(&self, plan: &BuildPlan) -> Result<String> {
        let mut text = serde_json::to_string_pretty(plan)?;
        text.push('\n');
        Ok(text)
    }
}
