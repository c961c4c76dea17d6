// src/pipeline.rs

use glob::glob;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

use crate::clean::concat_translated;
use crate::config::DatasetConfig;
use crate::error::{PipelineError, Result};
use crate::fetch::{HttpStore, RemoteStore};
use crate::translate::translate_file;

/// What happened to a single year of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum YearOutcome {
    Found { year: i32, path: PathBuf },
    NotFound { year: i32, reason: String },
}

impl YearOutcome {
    pub fn year(&self) -> i32 {
        match self {
            Self::Found { year, .. } | Self::NotFound { year, .. } => *year,
        }
    }
}

/// One outcome per configured year, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub outcomes: Vec<YearOutcome>,
}

impl PipelineReport {
    fn push(&mut self, outcome: YearOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn found(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                YearOutcome::Found { path, .. } => Some(path.as_path()),
                YearOutcome::NotFound { .. } => None,
            })
            .collect()
    }

    pub fn not_found(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                YearOutcome::NotFound { reason, .. } => Some(reason.as_str()),
                YearOutcome::Found { .. } => None,
            })
            .collect()
    }

    /// The `(produced paths, not-found messages)` pair view.
    pub fn into_parts(self) -> (Vec<PathBuf>, Vec<String>) {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for outcome in self.outcomes {
            match outcome {
                YearOutcome::Found { path, .. } => found.push(path),
                YearOutcome::NotFound { reason, .. } => missing.push(reason),
            }
        }
        (found, missing)
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, YearOutcome::Found { .. }))
    }
}

/// Acquires, translates and cleans the per-year dataset files under one
/// local directory. The three steps only talk to each other through that
/// directory, so each can be run on its own.
pub struct DatasetPipeline<S> {
    config: DatasetConfig,
    store: S,
}

impl DatasetPipeline<HttpStore> {
    /// Pipeline that fetches over HTTP from `config.base_url()`.
    pub fn with_http(config: DatasetConfig) -> Result<Self> {
        let store = HttpStore::from_config(&config)?;
        Ok(Self::new(config, store))
    }
}

impl<S: RemoteStore> DatasetPipeline<S> {
    pub fn new(config: DatasetConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Download `<dataset>-<year>.csv` for every configured year into the
    /// local directory. Years the remote does not have are reported, not
    /// raised.
    #[instrument(level = "info", skip(self), fields(dir = %self.config.dir().display()))]
    pub fn fetch(&self) -> Result<PipelineReport> {
        let dir = self.config.dir();
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

        let mut report = PipelineReport::default();
        for year in self.config.years().iter() {
            let name = self.config.raw_name(year);
            let dest = self.config.raw_path(year);
            debug!(year, name = %name, "retrieving");

            match self.store.retrieve(&name, &dest) {
                Ok(()) => {
                    info!(year, path = %dest.display(), "fetched");
                    report.push(YearOutcome::Found { year, path: dest });
                }
                Err(e) if e.is_missing() => {
                    warn!(year, error = %e, "remote file missing");
                    report.push(YearOutcome::NotFound {
                        year,
                        reason: format!("{name} not found: {e}"),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(report)
    }

    /// Translate every fetched raw file in the year range into the
    /// normalized compressed format, next to the raw file.
    #[instrument(level = "info", skip(self), fields(dir = %self.config.dir().display()))]
    pub fn translate(&self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        for year in self.config.years().iter() {
            let raw = self.config.raw_path(year);
            if !raw.is_file() {
                let name = self.config.raw_name(year);
                warn!(year, name = %name, "raw file missing");
                report.push(YearOutcome::NotFound {
                    year,
                    reason: format!("{name} not found in {}", self.config.dir().display()),
                });
                continue;
            }

            let out = self.config.translated_path(year);
            translate_file(&raw, &out)?;
            report.push(YearOutcome::Found { year, path: out });
        }
        Ok(report)
    }

    /// Per-year translated files currently on disk, ascending by name.
    /// Independent of the configured year range.
    pub fn translated_files(&self) -> Result<Vec<PathBuf>> {
        let prefix = format!("{}-", self.config.dataset());
        let pattern = self.config.translated_pattern();

        let mut files: Vec<PathBuf> = glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.strip_prefix(&prefix))
                    .is_some_and(|year| year.parse::<i32>().is_ok())
            })
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Combine every translated file in the directory into
    /// `<dataset>-reimbursements.xz` and return its path.
    #[instrument(level = "info", skip(self), fields(dir = %self.config.dir().display()))]
    pub fn clean(&self) -> Result<PathBuf> {
        let sources = self.translated_files()?;
        info!(files = sources.len(), "cleaning");

        let out = self.config.cleaned_path();
        concat_translated(&sources, &out)?;
        Ok(out)
    }
}
