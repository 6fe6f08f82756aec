//! Screenflow Layout Library
//!
//! This library places the screens of a sitemap graph on a 2D canvas: rows
//! encode navigation depth from the entry screens, and positions within a row
//! follow the parents' positions, then the order screens were recorded in.

pub mod engine;
pub mod levels;
pub mod ordering;

pub use engine::{Layout, LayoutEngine};
pub use levels::LevelAssigner;
pub use ordering::LevelOrderer;

use serde::{Deserialize, Serialize};

/// Result type for screenflow-layout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for screenflow-layout operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Screenflow core error: {0}")]
    Core(#[from] screenflow_core::Error),

    #[error("Graph inconsistency: {0}")]
    GraphInconsistency(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Node size and spacing of the diagram, in canvas units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal space between nodes of the same level
    pub gap_x: f64,
    /// Vertical space between levels
    pub gap_y: f64,
    /// Empty border around the whole diagram
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 260.0,
            node_height: 200.0,
            gap_x: 80.0,
            gap_y: 120.0,
            margin: 40.0,
        }
    }
}

impl LayoutConfig {
    /// Checks that sizes are positive and spacings non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("node_width", self.node_width), ("node_height", self.node_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [("gap_x", self.gap_x), ("gap_y", self.gap_y), ("margin", self.margin)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must not be negative, got {value}")));
            }
        }
        Ok(())
    }
}
