use super::types::{Employee, RawRow, RowRejection};

/// Canonical column names. Upstream dual-casing ("name" vs "Full_Name") is
/// resolved here, at the boundary, so nothing downstream sees it.
const COL_EMPLOYEE_ID: &str = "employee_id";
const COL_NAME: &str = "name";
const COL_NATIONAL_ID: &str = "national_id";
const COL_JOB_GROUP: &str = "job_group";
const COL_DEPARTMENT: &str = "department";
const COL_GROSS_SALARY: &str = "gross_salary";
const COL_BANK_ACCOUNT: &str = "bank_account_id";
const COL_DEVICE_ID: &str = "device_id";

/// Normalize a batch of raw rows. A malformed row is rejected with its
/// index and reason; the batch continues. Holds no cross-call state, so a
/// batch can be re-normalized at will.
pub fn normalize_batch(rows: &[RawRow]) -> (Vec<Employee>, Vec<RowRejection>) {
    let mut employees = Vec::new();
    let mut rejections = Vec::new();

    for item in normalize_rows(rows) {
        match item {
            Ok(employee) => employees.push(employee),
            Err(rejection) => {
                tracing::debug!(
                    row_index = rejection.row_index,
                    reason = %rejection.reason,
                    "Rejected payroll row"
                );
                rejections.push(rejection);
            }
        }
    }

    tracing::info!(
        accepted = employees.len(),
        rejected = rejections.len(),
        "Normalized payroll batch"
    );
    (employees, rejections)
}

/// Lazy variant: one result per input row, in input order.
pub fn normalize_rows(
    rows: &[RawRow],
) -> impl Iterator<Item = Result<Employee, RowRejection>> + '_ {
    rows.iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index, row))
}

fn normalize_row(row_index: usize, row: &RawRow) -> Result<Employee, RowRejection> {
    let reject = |reason: String| RowRejection { row_index, reason };

    let id = required_field(row, COL_EMPLOYEE_ID).map_err(&reject)?;
    let name = required_field(row, COL_NAME).map_err(&reject)?;
    let national_id = required_field(row, COL_NATIONAL_ID).map_err(&reject)?;
    let job_group = required_field(row, COL_JOB_GROUP).map_err(&reject)?;
    let department_id = required_field(row, COL_DEPARTMENT).map_err(&reject)?;
    let bank_account_id = required_field(row, COL_BANK_ACCOUNT).map_err(&reject)?;

    let salary_raw = required_field(row, COL_GROSS_SALARY).map_err(&reject)?;
    let gross_salary = parse_salary(&salary_raw)
        .map_err(|e| reject(format!("invalid gross_salary '{}': {}", salary_raw, e)))?;

    // device_id is nullable: missing or empty means no check-in device.
    let device_id = row
        .get(COL_DEVICE_ID)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok(Employee {
        id,
        name,
        national_id,
        job_group,
        department_id,
        gross_salary,
        bank_account_id,
        device_id,
    })
}

fn required_field(row: &RawRow, column: &str) -> Result<String, String> {
    match row.get(column).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(format!("missing required field '{}'", column)),
    }
}

/// Payroll exports often carry thousand separators ("85,000.00").
fn parse_salary(raw: &str) -> Result<f64, String> {
    let cleaned = raw.replace(',', "");
    let value: f64 = cleaned
        .parse()
        .map_err(|_| "not a number".to_string())?;
    if !value.is_finite() {
        return Err("not a finite number".to_string());
    }
    if value < 0.0 {
        return Err("negative".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(fields: &[(&str, &str)]) -> RawRow {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    }

    fn valid_row() -> RawRow {
        row(&[
            ("employee_id", "EMP001"),
            ("name", "Jane Wanjiku"),
            ("national_id", "12345678"),
            ("job_group", "G1"),
            ("department", "Health"),
            ("gross_salary", "85,000"),
            ("bank_account_id", "ACC-9"),
            ("device_id", "DEV-1"),
        ])
    }

    #[test]
    fn test_normalize_valid_row() {
        let (employees, rejections) = normalize_batch(&[valid_row()]);
        assert!(rejections.is_empty());
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, "EMP001");
        assert_eq!(employees[0].gross_salary, 85000.0);
        assert_eq!(employees[0].device_id.as_deref(), Some("DEV-1"));
    }

    #[test]
    fn test_missing_device_is_none() {
        let mut r = valid_row();
        r.insert("device_id".to_string(), "  ".to_string());
        let (employees, _) = normalize_batch(&[r]);
        assert_eq!(employees[0].device_id, None);
    }

    #[test]
    fn test_rejects_do_not_abort_batch() {
        let mut bad = valid_row();
        bad.remove("national_id");
        let batch = vec![valid_row(), bad, valid_row()];
        let (employees, rejections) = normalize_batch(&batch);
        assert_eq!(employees.len(), 2);
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].row_index, 1);
        assert!(rejections[0].reason.contains("national_id"));
    }

    #[test]
    fn test_rejects_negative_salary() {
        let mut r = valid_row();
        r.insert("gross_salary".to_string(), "-5".to_string());
        let (employees, rejections) = normalize_batch(&[r]);
        assert!(employees.is_empty());
        assert!(rejections[0].reason.contains("gross_salary"));
    }

    #[test]
    fn test_rejects_non_numeric_salary() {
        let mut r = valid_row();
        r.insert("gross_salary".to_string(), "eighty".to_string());
        let (_, rejections) = normalize_batch(&[r]);
        assert_eq!(rejections.len(), 1);
    }

    #[test]
    fn test_rejects_empty_job_group() {
        let mut r = valid_row();
        r.insert("job_group".to_string(), "".to_string());
        let (_, rejections) = normalize_batch(&[r]);
        assert_eq!(rejections.len(), 1);
        assert!(rejections[0].reason.contains("job_group"));
    }
}
