//! Min-max rescaling of the feature vector
//!
//! Applies the training-time min/max transform to the subset of columns
//! the scaler was fitted on. Whether that subset is known is decided by
//! the artifact loader and carried here as an explicit variant instead
//! of being probed at call time.

use std::collections::HashMap;

/// Column the scaler historically covered when the export predates
/// per-column metadata. A known fragility, kept for artifact
/// compatibility.
pub const FALLBACK_SCALED_COLUMN: &str = "Days to Due";

/// Result of reading the scaler's trained-column list from the artifact
#[derive(Debug, Clone, PartialEq)]
pub enum ScaledColumns {
    /// The export records which columns were fitted
    Trained(Vec<String>),
    /// The export carries no column list; assume the historical single column
    Fallback,
}

/// Fixed affine rescaler using training-time per-column bounds
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    columns: Vec<String>,
    bounds: HashMap<String, (f64, f64)>,
    used_fallback: bool,
}

impl MinMaxScaler {
    pub fn new(columns: ScaledColumns, bounds: HashMap<String, (f64, f64)>) -> Self {
        let (columns, used_fallback) = match columns {
            ScaledColumns::Trained(names) => (names, false),
            ScaledColumns::Fallback => (vec![FALLBACK_SCALED_COLUMN.to_string()], true),
        };
        Self {
            columns,
            bounds,
            used_fallback,
        }
    }

    /// Scaler with nothing to rescale (used by tests)
    pub fn identity() -> Self {
        Self {
            columns: Vec::new(),
            bounds: HashMap::new(),
            used_fallback: false,
        }
    }

    /// True when the column list came from the hardcoded fallback
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rescale in place the columns present in both the trained list and
    /// the feature schema; everything else passes through unchanged.
    pub fn apply(&self, feature_names: &[String], vector: &mut [f32]) {
        for column in &self.columns {
            let Some(idx) = feature_names.iter().position(|n| n == column) else {
                continue;
            };
            let Some(&(min, max)) = self.bounds.get(column) else {
                continue;
            };
            let width = max - min;
            if width <= f64::EPSILON {
                continue;
            }
            if let Some(value) = vector.get_mut(idx) {
                *value = ((f64::from(*value) - min) / width) as f32;
            }
        }
    }
}
