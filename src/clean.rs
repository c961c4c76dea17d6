// src/clean.rs

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::codec::{open_xz_csv, XzCsvWriter};
use crate::error::{PipelineError, Result};

/// Column-specific value cleanup applied while concatenating.
fn normalize(column: &str, value: &str) -> String {
    match column {
        "cnpj_cpf" => digits_only(value),
        "reimbursement_value" => decimal_point(value),
        "date" => iso_date(value),
        _ => value.to_string(),
    }
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// `1.234,56` → `1234.56`. Values without a decimal comma are returned trimmed.
pub fn decimal_point(value: &str) -> String {
    let v = value.trim();
    if v.contains(',') {
        v.replace('.', "").replace(',', ".")
    } else {
        v.to_string()
    }
}

/// `dd/mm/yyyy` → `yyyy-mm-dd`. Already-ISO dates are kept; anything
/// unparseable becomes blank.
pub fn iso_date(value: &str) -> String {
    let v = value.trim();
    NaiveDate::parse_from_str(v, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(v, "%Y-%m-%d"))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Concatenate translated files at `sources`, in the given order, into one
/// compressed file at `out`. Columns are the union of every source header
/// in first-seen order; cells a source lacks are left blank.
///
/// Returns the number of rows written.
#[instrument(level = "info", skip(sources, out), fields(sources = sources.len(), out = %out.display()))]
pub fn concat_translated(sources: &[PathBuf], out: &Path) -> Result<usize> {
    let mut columns: Vec<String> = Vec::new();
    for src in sources {
        let mut rdr = open_xz_csv(src)?;
        let headers = rdr.headers().map_err(|e| PipelineError::csv(src, e))?;
        for h in headers {
            if !columns.iter().any(|c| c == h) {
                columns.push(h.to_string());
            }
        }
    }
    debug!(?columns, "combined header");

    let mut writer = XzCsvWriter::create(out)?;
    if columns.is_empty() {
        warn!("no translated files to combine");
        writer.finish()?;
        return Ok(0);
    }
    writer.write_record(&columns)?;

    let mut total = 0;
    for src in sources {
        let mut rdr = open_xz_csv(src)?;
        let headers = rdr
            .headers()
            .map_err(|e| PipelineError::csv(src, e))?
            .clone();
        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|c| headers.iter().position(|h| h == c))
            .collect();

        let mut rows = 0;
        for record in rdr.records() {
            let record = record.map_err(|e| PipelineError::csv(src, e))?;
            let cells: Vec<String> = columns
                .iter()
                .zip(&positions)
                .map(|(column, &pos)| {
                    pos.and_then(|i| record.get(i))
                        .map(|v| normalize(column, v))
                        .unwrap_or_default()
                })
                .collect();
            writer.write_record(&cells)?;
            rows += 1;
        }
        debug!(src = %src.display(), rows, "appended");
        total += rows;
    }

    writer.finish()?;
    info!(rows = total, "combined");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_translated(path: &Path, rows: &[&[&str]]) {
        let mut w = XzCsvWriter::create(path).unwrap();
        for r in rows {
            w.write_record(*r).unwrap();
        }
        w.finish().unwrap();
    }

    fn read_all(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut rdr = open_xz_csv(path).unwrap();
        let headers = rdr.headers().unwrap().iter().map(String::from).collect();
        let rows = rdr
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn value_cleanup() {
        assert_eq!(digits_only("00.000.000/0001-91"), "00000000000191");
        assert_eq!(decimal_point("1.500,00"), "1500.00");
        assert_eq!(decimal_point("35.2"), "35.2");
        assert_eq!(iso_date("10/09/2008"), "2008-09-10");
        assert_eq!(iso_date("2008-09-10"), "2008-09-10");
        assert_eq!(iso_date("31/02/2008"), "");
    }

    #[test]
    fn headers_are_unioned_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("federal-senate-2009.xz");
        let b = dir.path().join("federal-senate-2010.xz");
        let out = dir.path().join("federal-senate-reimbursements.xz");
        write_translated(
            &a,
            &[
                &["year", "cnpj_cpf", "date"],
                &["2009", "000.000.000-00", "01/01/2009"],
            ],
        );
        write_translated(
            &b,
            &[
                &["year", "document_code", "reimbursement_value"],
                &["2010", "77", "1.234,56"],
            ],
        );

        let n = concat_translated(&[a, b], &out).unwrap();
        assert_eq!(n, 2);

        let (headers, rows) = read_all(&out);
        assert_eq!(
            headers,
            vec!["year", "cnpj_cpf", "date", "document_code", "reimbursement_value"]
        );
        assert_eq!(rows[0], vec!["2009", "00000000000", "2009-01-01", "", ""]);
        assert_eq!(rows[1], vec!["2010", "", "", "77", "1234.56"]);
    }

    #[test]
    fn no_sources_still_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("federal-senate-reimbursements.xz");
        assert_eq!(concat_translated(&[], &out).unwrap(), 0);
        assert!(out.exists());
    }
}
