// src/translate.rs

use std::path::Path;
use tracing::{debug, info, instrument};

use crate::codec::{read_legacy_csv, XzCsvWriter};
use crate::error::{PipelineError, Result};

pub const YEAR_COLUMN: &str = "year";
pub const EXPENSE_TYPE_COLUMN: &str = "expense_type";

/// Legacy (Portuguese) header → normalized header.
static COLUMNS: &[(&str, &str)] = &[
    ("ANO", YEAR_COLUMN),
    ("MES", "month"),
    ("SENADOR", "congressperson_name"),
    ("TIPO_DESPESA", EXPENSE_TYPE_COLUMN),
    ("CNPJ_CPF", "cnpj_cpf"),
    ("FORNECEDOR", "supplier"),
    ("DOCUMENTO", "document_id"),
    ("DATA", "date"),
    ("DETALHAMENTO", "expense_details"),
    ("VALOR_REEMBOLSADO", "reimbursement_value"),
    ("COD_DOCUMENTO", "document_code"),
];

static EXPENSE_TYPES: &[(&str, &str)] = &[
    (
        "Aluguel de imóveis para escritório político, compreendendo despesas concernentes a eles.",
        "Rent of real estate for political office, comprising expenses concerning them",
    ),
    (
        "Aquisição de material de consumo para uso no escritório político, inclusive aquisição ou locação de software, despesas postais, aquisição de publicações, locação de móveis e de equipamentos.",
        "Acquisition of consumables for use in the political office, including acquisition or leasing of software, postal expenses, acquisition of publications, rental of furniture and equipment",
    ),
    (
        "Contratação de consultorias, assessorias, pesquisas, trabalhos técnicos e outros serviços de apoio ao exercício do mandato parlamentar",
        "Recruitment of consultancies, advisory services, research, technical work and other services in support of the exercise of the parliamentary mandate",
    ),
    (
        "Divulgação da atividade parlamentar",
        "Publicity of parliamentary activity",
    ),
    (
        "Locomoção, hospedagem, alimentação, combustíveis e lubrificantes",
        "Locomotion, lodging, food, fuels and lubricants",
    ),
    (
        "Passagens aéreas, aquáticas e terrestres nacionais",
        "National air, water and land transport",
    ),
    (
        "Serviços de Segurança Privada",
        "Private Security Services",
    ),
];

/// Normalized name for a legacy header. Unknown columns are kept, lower-cased.
pub fn normalize_column(legacy: &str) -> String {
    let key = legacy.trim();
    COLUMNS
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(key))
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| key.to_lowercase())
}

/// English label for a Portuguese expense category; unknown labels pass through.
pub fn translate_expense_type(label: &str) -> &str {
    let key = label.trim();
    EXPENSE_TYPES
        .iter()
        .find(|(pt, _)| *pt == key)
        .map(|(_, en)| *en)
        .unwrap_or(label)
}

/// Translate one raw yearly export at `raw` into compressed UTF-8 CSV at
/// `out`. Returns the number of data rows written. `raw` is only read.
#[instrument(level = "info", skip(raw, out), fields(raw = %raw.display()))]
pub fn translate_file(raw: &Path, out: &Path) -> Result<usize> {
    let table = read_legacy_csv(raw)?;

    let headers: Vec<String> = table.headers.iter().map(normalize_column).collect();
    if !headers.iter().any(|h| h == YEAR_COLUMN) {
        return Err(PipelineError::malformed(raw, "no year column (ANO) in header"));
    }
    let expense_idx = headers.iter().position(|h| h == EXPENSE_TYPE_COLUMN);
    debug!(?headers, "normalized header");

    let mut writer = XzCsvWriter::create(out)?;
    writer.write_record(&headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().enumerate().map(|(i, value)| {
            if Some(i) == expense_idx {
                translate_expense_type(value)
            } else {
                value
            }
        }))?;
    }
    writer.finish()?;

    info!(rows = table.rows.len(), out = %out.display(), "translated");
    Ok(table.rows.len())
}
