//! Budget allocation linear program
//!
//! maximize    slope × Σ spend_t
//! subject to  Σ spend_t ≤ budget
//!             0 ≤ spend_t ≤ max_period_spend
//!
//! With a single aggregate constraint and identical objective weights the
//! program has a closed-form optimum: when spend helps, fill periods in
//! chronological order up to the cap until the budget runs out; otherwise
//! spend nothing.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats::regression::SpendResponseModel;
use crate::temporal::month_start;

/// Outcome reported by the allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    /// Negative or undefined bounds
    Infeasible,
    /// Spend helps and nothing caps it
    Unbounded,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        *self == SolveStatus::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::Unbounded => write!(f, "Unbounded"),
        }
    }
}

/// Prescribed spend for one period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub period_date: NaiveDate,
    pub optimal_spend: f64,
    pub estimated_net_new: f64,
}

/// Solver status and per-period spend
#[derive(Debug, Clone, PartialEq)]
pub struct Prescription {
    pub status: SolveStatus,
    pub records: Vec<PrescriptionRecord>,
}

impl Prescription {
    pub fn total_spend(&self) -> f64 {
        self.records.iter().map(|r| r.optimal_spend).sum()
    }

    pub fn total_estimated_net_new(&self) -> f64 {
        self.records.iter().map(|r| r.estimated_net_new).sum()
    }
}

/// Spreads a total budget over forecast periods under a per-period cap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetAllocator {
    budget: f64,
    max_period_spend: f64,
}

impl BudgetAllocator {
    pub fn new(budget: f64, max_period_spend: f64) -> Self {
        BudgetAllocator {
            budget,
            max_period_spend,
        }
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn max_period_spend(&self) -> f64 {
        self.max_period_spend
    }

    /// Status of the program for a given objective slope
    pub fn status(&self, slope: f64) -> SolveStatus {
        let (b, m) = (self.budget, self.max_period_spend);
        if b.is_nan() || m.is_nan() || b < 0.0 || m < 0.0 {
            SolveStatus::Infeasible
        } else if slope > 0.0 && b.is_infinite() && m.is_infinite() {
            SolveStatus::Unbounded
        } else {
            SolveStatus::Optimal
        }
    }

    /// Optimal spend per period; empty unless the status is optimal
    pub fn solve(&self, periods: usize, slope: f64) -> (SolveStatus, Vec<f64>) {
        let status = self.status(slope);
        if !status.is_optimal() {
            return (status, Vec::new());
        }
        if slope <= 0.0 || slope.is_nan() {
            return (status, vec![0.0; periods]);
        }

        let mut remaining = self.budget;
        let spends = (0..periods)
            .map(|_| {
                let spend = self.max_period_spend.min(remaining).max(0.0);
                remaining -= spend;
                spend
            })
            .collect();
        (status, spends)
    }

    /// Prescription for the given periods; status reported, not raised
    pub fn prescribe(&self, periods: &[NaiveDate], model: &SpendResponseModel) -> Prescription {
        let (status, spends) = self.solve(periods.len(), model.slope);
        let records = periods
            .iter()
            .zip(spends)
            .map(|(&date, spend)| PrescriptionRecord {
                period_date: month_start(date),
                optimal_spend: spend,
                estimated_net_new: model.predict(spend),
            })
            .collect();
        Prescription { status, records }
    }

    /// Prescription for the given periods; a non-optimal status is an error
    pub fn allocate(
        &self,
        periods: &[NaiveDate],
        model: &SpendResponseModel,
    ) -> Result<Prescription> {
        let prescription = self.prescribe(periods, model);
        log::info!("Optimization status: {}", prescription.status);

        match prescription.status {
            SolveStatus::Optimal => Ok(prescription),
            SolveStatus::Infeasible => Err(Error::InfeasibleAllocation {
                status: SolveStatus::Infeasible,
                reason: format!(
                    "budget {} and per-period cap {} must both be non-negative numbers",
                    self.budget, self.max_period_spend
                ),
            }),
            SolveStatus::Unbounded => Err(Error::InfeasibleAllocation {
                status: SolveStatus::Unbounded,
                reason: format!(
                    "slope {:.4} is positive and neither the budget nor the per-period cap is finite",
                    model.slope
                ),
            }),
        }
    }
}
