//! Request-time feature reconstruction
//!
//! Rebuilds, from a raw prediction request, the exact numeric vector the
//! classifier saw at training time: calendar-derived fields, off-day
//! flags, encoded categoricals, zero defaults for everything else, then
//! min-max rescaling, all assembled in the training column order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;

use super::encoder::{
    CategoryEncoderTable, CATEGORY_FIELD, ITEM_FIELD, PRIORITY_FIELD, SUB_CATEGORY_FIELD,
};
use super::holidays::HolidayCalendar;
use super::scaler::MinMaxScaler;
use crate::models::PredictionRequest;

/// Request timestamp format, as produced by `<input type="datetime-local">`
pub const REQUEST_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Derived feature names, as recorded by the training pipeline
pub const DAYS_TO_DUE: &str = "Days to Due";
pub const OPEN_MONTH: &str = "Open Month";
pub const CREATION_DAY_OF_WEEK: &str = "Application Creation Day of Week";
pub const CREATION_HOUR: &str = "Application Creation Hour";
pub const DEADLINE_DAY_OF_WEEK: &str = "Application SLA Deadline Day of Week";
pub const DEADLINE_HOUR: &str = "Application SLA Deadline Hour";
pub const IS_OPEN_DATE_OFF: &str = "Is Open Date Off";
pub const IS_DUE_DATE_OFF: &str = "Is Due Date Off";

/// Malformed request input; the API layer maps this to a 400, never a 500.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} {value:?}: expected format YYYY-MM-DDTHH:MM")]
    BadTimestamp { field: &'static str, value: String },
}

/// The assembled vector plus the derived values echoed in the response
#[derive(Debug, Clone)]
pub struct NormalizedFeatures {
    pub vector: Vec<f32>,
    pub days_to_due: i64,
    pub open_hour: u32,
}

/// Converts raw prediction requests into training-order feature vectors
pub struct FeatureNormalizer {
    feature_names: Arc<Vec<String>>,
    encoders: Arc<CategoryEncoderTable>,
    scaler: MinMaxScaler,
    holidays: Option<HolidayCalendar>,
}

impl FeatureNormalizer {
    pub fn new(
        feature_names: Arc<Vec<String>>,
        encoders: Arc<CategoryEncoderTable>,
        scaler: MinMaxScaler,
        holidays: Option<HolidayCalendar>,
    ) -> Self {
        Self {
            feature_names,
            encoders,
            scaler,
            holidays,
        }
    }

    /// Build the complete fixed-length vector for one request.
    ///
    /// Vector length and column order come from the training schema; any
    /// schema column not derived here defaults to zero so the classifier
    /// always sees a complete input.
    pub fn normalize(
        &self,
        request: &PredictionRequest,
    ) -> Result<NormalizedFeatures, ValidationError> {
        let open = parse_timestamp("open_date", &request.open_date)?;
        let due = parse_timestamp("due_date", &request.due_date)?;

        // Signed calendar-day difference; negative when due precedes open
        let days_to_due = (due.date() - open.date()).num_days();

        let mut values: HashMap<&str, f64> = HashMap::new();
        values.insert(DAYS_TO_DUE, days_to_due as f64);
        values.insert(OPEN_MONTH, f64::from(open.month()));
        values.insert(
            CREATION_DAY_OF_WEEK,
            f64::from(open.weekday().number_from_monday()),
        );
        values.insert(CREATION_HOUR, f64::from(open.hour()));
        values.insert(
            DEADLINE_DAY_OF_WEEK,
            f64::from(due.weekday().number_from_monday()),
        );
        values.insert(DEADLINE_HOUR, f64::from(due.hour()));
        values.insert(IS_OPEN_DATE_OFF, self.off_day_flag(open.date()));
        values.insert(IS_DUE_DATE_OFF, self.off_day_flag(due.date()));

        for (field, raw) in [
            (PRIORITY_FIELD, request.priority.as_str()),
            (CATEGORY_FIELD, request.category.as_str()),
            (ITEM_FIELD, request.item.as_str()),
            (SUB_CATEGORY_FIELD, request.sub_category.as_str()),
        ] {
            if let Some(code) = self.encoders.encode(field, raw) {
                values.insert(field, code as f64);
            }
        }

        let mut vector: Vec<f32> = self
            .feature_names
            .iter()
            .map(|name| values.get(name.as_str()).copied().unwrap_or(0.0) as f32)
            .collect();

        self.scaler.apply(&self.feature_names, &mut vector);

        Ok(NormalizedFeatures {
            vector,
            days_to_due,
            open_hour: open.hour(),
        })
    }

    /// 1 iff the date is a Saturday/Sunday or a listed national holiday.
    /// Without a calendar this degrades to weekend-only.
    fn off_day_flag(&self, date: NaiveDate) -> f64 {
        let weekend = date.weekday().number_from_monday() >= 6;
        let holiday = self
            .holidays
            .as_ref()
            .is_some_and(|calendar| calendar.contains(date));
        if weekend || holiday {
            1.0
        } else {
            0.0
        }
    }
}

fn parse_timestamp(field: &'static str, raw: &str) -> Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, REQUEST_TIME_FORMAT))
        .map_err(|_| ValidationError::BadTimestamp {
            field,
            value: raw.to_string(),
        })
}
