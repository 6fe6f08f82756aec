//! Screenflow Core Library
//!
//! This library provides the data structures shared by the screenflow crates:
//! captured keyframes, the sitemap graph produced by screen analysis, and the
//! request/response boundary of the analysis service.

pub mod analysis;
pub mod frame;
pub mod sitemap;

pub use analysis::{AnalysisFrame, AnalysisRequest, AnalysisService};
pub use frame::{CapturedFrame, ImageEncoding};
pub use sitemap::{FlowEdge, LayoutNode, ScreenNode, SitemapGraph};

/// Result type for screenflow-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for screenflow-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analysis service error: {0}")]
    AnalysisService(String),
}
