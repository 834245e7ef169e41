//! Core library for the SLA compliance dashboard
//!
//! This crate provides:
//! - Artifact loading for the offline-trained classifier and encoders
//! - The prediction pipeline (normalizer, encoder lookup, scaler, classifier)
//! - The SQLite ticket store with aggregate statistics
//! - Health checks and observability

pub mod artifacts;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod store;

pub use artifacts::{ArtifactError, ArtifactSet, ModelMeta};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{DashboardMetrics, StructuredLogger};
pub use predictor::{PredictError, SlaPredictor, ValidationError};
pub use store::{ImportSummary, SortOrder, StoreError, TicketQuery, TicketStore};
