//! Loading of the offline training artifacts
//!
//! Everything here is produced by the external training pipeline and
//! consumed read-only: the exported classifier, its metadata, the
//! category encoders, the scaler parameters, the ordered feature list,
//! the importance ranking, and the optional holiday and clustering
//! exports. Loaded once at startup; a missing required file aborts the
//! process with a listing of every absent artifact.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{ClusterReport, ClusterSummary, FeatureImportance};
use crate::predictor::{CategoryEncoderTable, HolidayCalendar, MinMaxScaler, ScaledColumns};

pub const MODEL_FILE: &str = "sla_model.onnx";
pub const MODEL_META_FILE: &str = "sla_model_meta.json";
pub const ENCODERS_FILE: &str = "label_encoders.json";
pub const SCALER_FILE: &str = "minmax_scaler.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const FEATURE_IMPORTANCE_FILE: &str = "feature_importances.json";
pub const HOLIDAYS_FILE: &str = "holidays.json";
pub const CLUSTERS_FILE: &str = "cluster_results.json";

const REQUIRED_FILES: [&str; 6] = [
    MODEL_FILE,
    MODEL_META_FILE,
    ENCODERS_FILE,
    SCALER_FILE,
    FEATURE_NAMES_FILE,
    FEATURE_IMPORTANCE_FILE,
];

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("missing artifact files in {}: {}", .dir, .files.join(", "))]
    Missing { dir: String, files: Vec<String> },
    #[error("failed to read {file}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {file}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("inconsistent artifacts: {0}")]
    Invalid(String),
}

/// Metadata exported next to the ONNX model
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMeta {
    pub model_version: String,
    /// Class labels in the classifier's output order
    pub classes: Vec<i64>,
    pub num_features: usize,
}

#[derive(Debug, Deserialize)]
struct RawScaler {
    /// Absent in exports from before per-column metadata was recorded
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RawClusters {
    num_clusters: u32,
    summary_per_cluster: HashMap<String, RawClusterSummary>,
}

#[derive(Debug, Deserialize)]
struct RawClusterSummary {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    mean_numerical: BTreeMap<String, f64>,
    #[serde(default)]
    mode_categorical: BTreeMap<String, String>,
}

/// The complete artifact set, held immutable for the process lifetime
pub struct ArtifactSet {
    pub model_bytes: Vec<u8>,
    pub meta: ModelMeta,
    pub encoders: Arc<CategoryEncoderTable>,
    pub scaler: MinMaxScaler,
    pub feature_names: Arc<Vec<String>>,
    pub importances: Vec<FeatureImportance>,
    /// `None` when the holiday export is absent; off-day flags then
    /// degrade to weekend-only
    pub holidays: Option<HolidayCalendar>,
    /// `None` when the clustering export is absent or unreadable
    pub clusters: Option<ClusterReport>,
}

impl ArtifactSet {
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let missing: Vec<String> = REQUIRED_FILES
            .iter()
            .filter(|file| !dir.join(file).exists())
            .map(|file| file.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ArtifactError::Missing {
                dir: dir.display().to_string(),
                files: missing,
            });
        }

        let model_bytes = fs::read(dir.join(MODEL_FILE)).map_err(|source| ArtifactError::Io {
            file: MODEL_FILE.to_string(),
            source,
        })?;
        let meta: ModelMeta = read_json(dir, MODEL_META_FILE)?;
        let encoder_fields: HashMap<String, Vec<String>> = read_json(dir, ENCODERS_FILE)?;
        let raw_scaler: RawScaler = read_json(dir, SCALER_FILE)?;
        let feature_names: Vec<String> = read_json(dir, FEATURE_NAMES_FILE)?;
        let importances: Vec<FeatureImportance> = read_json(dir, FEATURE_IMPORTANCE_FILE)?;

        if meta.num_features != feature_names.len() {
            return Err(ArtifactError::Invalid(format!(
                "model metadata expects {} features but {} lists {}",
                meta.num_features,
                FEATURE_NAMES_FILE,
                feature_names.len()
            )));
        }

        let scaler = build_scaler(raw_scaler)?;
        if scaler.used_fallback() {
            warn!(
                column = crate::predictor::FALLBACK_SCALED_COLUMN,
                "scaler export has no trained-column list, assuming historical single column"
            );
        }

        let holidays = load_holidays(dir)?;
        let clusters = load_clusters(dir);

        Ok(Self {
            model_bytes,
            meta,
            encoders: Arc::new(CategoryEncoderTable::new(encoder_fields)),
            scaler,
            feature_names: Arc::new(feature_names),
            importances,
            holidays,
            clusters,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ArtifactError> {
    let content = fs::read_to_string(dir.join(file)).map_err(|source| ArtifactError::Io {
        file: file.to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        file: file.to_string(),
        source,
    })
}

fn build_scaler(raw: RawScaler) -> Result<MinMaxScaler, ArtifactError> {
    if raw.data_min.len() != raw.data_max.len() {
        return Err(ArtifactError::Invalid(format!(
            "{} has {} minima but {} maxima",
            SCALER_FILE,
            raw.data_min.len(),
            raw.data_max.len()
        )));
    }

    match raw.feature_names {
        Some(names) => {
            if names.len() != raw.data_min.len() {
                return Err(ArtifactError::Invalid(format!(
                    "{} lists {} columns but {} bound pairs",
                    SCALER_FILE,
                    names.len(),
                    raw.data_min.len()
                )));
            }
            let bounds: HashMap<String, (f64, f64)> = names
                .iter()
                .cloned()
                .zip(raw.data_min.iter().copied().zip(raw.data_max.iter().copied()))
                .collect();
            Ok(MinMaxScaler::new(ScaledColumns::Trained(names), bounds))
        }
        None => {
            let (&min, &max) = raw
                .data_min
                .first()
                .zip(raw.data_max.first())
                .ok_or_else(|| {
                    ArtifactError::Invalid(format!("{} carries no bounds at all", SCALER_FILE))
                })?;
            let mut bounds = HashMap::new();
            bounds.insert(
                crate::predictor::FALLBACK_SCALED_COLUMN.to_string(),
                (min, max),
            );
            Ok(MinMaxScaler::new(ScaledColumns::Fallback, bounds))
        }
    }
}

fn load_holidays(dir: &Path) -> Result<Option<HolidayCalendar>, ArtifactError> {
    if !dir.join(HOLIDAYS_FILE).exists() {
        warn!(
            file = HOLIDAYS_FILE,
            "holiday calendar not found, off-day flags degrade to weekend-only"
        );
        return Ok(None);
    }
    let raw: Vec<String> = read_json(dir, HOLIDAYS_FILE)?;
    Ok(Some(HolidayCalendar::from_iso_dates(&raw)))
}

fn load_clusters(dir: &Path) -> Option<ClusterReport> {
    if !dir.join(CLUSTERS_FILE).exists() {
        warn!(
            file = CLUSTERS_FILE,
            "clustering export not found, serving built-in sample summaries"
        );
        return None;
    }
    match read_json::<RawClusters>(dir, CLUSTERS_FILE) {
        Ok(raw) => {
            let mut clusters: Vec<ClusterSummary> = raw
                .summary_per_cluster
                .into_iter()
                .filter_map(|(id, summary)| {
                    let cluster_id = id.parse().ok()?;
                    Some(ClusterSummary {
                        cluster_id,
                        size: summary.size,
                        centroid: summary.mean_numerical,
                        mode: summary.mode_categorical,
                    })
                })
                .collect();
            clusters.sort_by_key(|c| c.cluster_id);
            Some(ClusterReport {
                num_clusters: raw.num_clusters,
                clusters,
            })
        }
        Err(error) => {
            warn!(%error, "clustering export unreadable, serving built-in sample summaries");
            None
        }
    }
}
