//! # imageplan-compose
//!
//! Compiles a versions manifest into an abstract multi-image build plan.
//!
//! Handles:
//! - **Manifest**: Loading and checking `versions.yaml` image definitions.
//! - **Catalog**: Discovery of structure and functional test descriptors.
//! - **Selection**: Per-image test selection honoring exclusions.
//! - **Compiler**: Build steps, builder dependencies, and scheduling mode.
//! - **Graph**: Wait-for graph validation and topological ordering.
//! - **Plan**: Assembly of the immutable [`plan::BuildPlan`].
//! - **Render**: Swappable `BuildPlan → text` renderers.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod catalog;
pub mod compiler;
pub mod graph;
pub mod manifest;
pub mod plan;
pub mod render;
pub mod selection;

pub use plan::{BuildPlan, compile};
