//! Prescriptive stage: spread a marketing budget across forecast periods

pub mod allocation;

pub use allocation::{BudgetAllocator, Prescription, PrescriptionRecord, SolveStatus};
