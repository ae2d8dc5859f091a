use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A raw payroll row as delivered by the upstream CSV/XLSX collaborator:
/// column name to string value.
pub type RawRow = HashMap<String, String>;

/// A normalized payroll record. Created once per batch row and never
/// mutated; the next batch supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub national_id: String,
    /// Ordinal pay-grade category; the peer group for salary comparison.
    pub job_group: String,
    pub department_id: String,
    pub gross_salary: f64,
    pub bank_account_id: String,
    pub device_id: Option<String>,
}

/// A row the normalizer refused, with enough context to trace it back.
#[derive(Debug, Clone, Serialize)]
pub struct RowRejection {
    pub row_index: usize,
    pub reason: String,
}
