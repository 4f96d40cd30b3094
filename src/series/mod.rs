//! Observed monthly history

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::temporal::months_between;

/// One month of transformed history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub period_date: NaiveDate,
    pub net_new: f64,
    pub marketing_spend: f64,
}

impl ObservationRecord {
    pub fn new(period_date: NaiveDate, net_new: f64, marketing_spend: f64) -> Self {
        ObservationRecord {
            period_date,
            net_new,
            marketing_spend,
        }
    }
}

/// Chronologically ordered monthly observations
///
/// Always holds at least one record, dates strictly increasing and every
/// value finite.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSeries {
    records: Vec<ObservationRecord>,
}

impl ObservedSeries {
    /// Validate and wrap records
    pub fn new(records: Vec<ObservationRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::MissingData(
                "observed series needs at least one record".to_string(),
            ));
        }

        for (i, rec) in records.iter().enumerate() {
            if !rec.net_new.is_finite() || !rec.marketing_spend.is_finite() {
                return Err(Error::MissingData(format!(
                    "record {} ({}) has a non-finite value",
                    i, rec.period_date
                )));
            }
        }

        for pair in records.windows(2) {
            let (prev, curr) = (pair[0].period_date, pair[1].period_date);
            if curr <= prev {
                return Err(Error::MissingData(format!(
                    "records out of chronological order: {} follows {}",
                    curr, prev
                )));
            }
            let gap = months_between(prev, curr);
            if gap > 1 {
                log::warn!(
                    "Calendar gap of {} months between {} and {}; treating records as consecutive",
                    gap - 1,
                    prev,
                    curr
                );
            }
        }

        Ok(ObservedSeries { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Never true for a validated series; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn net_new(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.net_new).collect()
    }

    pub fn marketing_spend(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.marketing_spend).collect()
    }

    pub fn period_dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.period_date).collect()
    }

    /// Date of the most recent observation
    pub fn last_period(&self) -> NaiveDate {
        // non-empty by construction
        self.records[self.records.len() - 1].period_date
    }
}
