use super::types::RawRow;

/// Read a payroll CSV into raw row maps keyed by the header row.
/// Column values are passed through untouched; validation happens in the
/// normalizer, not here.
pub fn read_csv_rows(path: &str) -> eyre::Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open payroll CSV '{}': {}", path, e))?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<RawRow> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        rows.push(row);
    }

    tracing::info!(rows = rows.len(), path, "Loaded payroll CSV");
    Ok(rows)
}
