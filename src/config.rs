// src/config.rs

use chrono::{Datelike, Local};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

use crate::error::{PipelineError, Result};

pub const DEFAULT_DATASET: &str = "federal-senate";
pub const DEFAULT_BASE_URL: &str =
    "https://s3-sa-east-1.amazonaws.com/serenata-de-amor-data/federal-senate/";
/// First year the Senate published CEAPS reimbursements.
pub const FIRST_YEAR: i32 = 2008;

const RAW_EXT: &str = "csv";
const TRANSLATED_EXT: &str = "xz";

/// Half-open range of dataset years: `from` is included, `to` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    from: i32,
    to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Result<Self> {
        if from > to {
            return Err(PipelineError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// `FIRST_YEAR` up to and including the current calendar year.
    pub fn through_current_year() -> Self {
        let to = Local::now().year() + 1;
        Self {
            from: FIRST_YEAR,
            to: to.max(FIRST_YEAR),
        }
    }

    pub fn from(&self) -> i32 {
        self.from
    }

    pub fn to(&self) -> i32 {
        self.to
    }

    pub fn len(&self) -> usize {
        self.to.abs_diff(self.from) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Years in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.from..self.to
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::through_current_year()
    }
}

/// Everything a [`DatasetPipeline`](crate::pipeline::DatasetPipeline) needs
/// to address remote and local files.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    dir: PathBuf,
    years: YearRange,
    dataset: String,
    base_url: Url,
    timeout: Option<Duration>,
}

impl DatasetConfig {
    /// Config for `dir` with the default dataset name, bucket and years.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            years: YearRange::default(),
            dataset: DEFAULT_DATASET.to_string(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url parses"),
            timeout: None,
        }
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Sets the remote prefix. A trailing `/` is added when missing so
    /// file names join under it instead of replacing its last segment.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        self.base_url = Url::parse(&normalized).map_err(|source| PipelineError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// `<dataset>-<year>.csv`, the same name remotely and on disk.
    pub fn raw_name(&self, year: i32) -> String {
        format!("{}-{}.{}", self.dataset, year, RAW_EXT)
    }

    pub fn raw_path(&self, year: i32) -> PathBuf {
        self.dir.join(self.raw_name(year))
    }

    pub fn translated_name(&self, year: i32) -> String {
        format!("{}-{}.{}", self.dataset, year, TRANSLATED_EXT)
    }

    pub fn translated_path(&self, year: i32) -> PathBuf {
        self.dir.join(self.translated_name(year))
    }

    pub fn cleaned_name(&self) -> String {
        format!("{}-reimbursements.{}", self.dataset, TRANSLATED_EXT)
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.dir.join(self.cleaned_name())
    }

    /// Glob matching every translated per-year file (and the cleaned file,
    /// which callers must filter out).
    pub fn translated_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.dir.to_string_lossy());
        Path::new(&dir)
            .join(format!("{}-*.{}", glob::Pattern::escape(&self.dataset), TRANSLATED_EXT))
            .to_string_lossy()
            .to_string()
    }

    pub fn remote_url(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|source| PipelineError::InvalidUrl {
                url: format!("{}{}", self.base_url, name),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_half_open() {
        let r = YearRange::new(2008, 2009).unwrap();
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![2008]);
        assert_eq!(r.len(), 1);
        assert!(YearRange::new(2009, 2009).unwrap().is_empty());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = YearRange::new(2010, 2008).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRange { from: 2010, to: 2008 }));
    }

    #[test]
    fn widest_range_len_does_not_overflow() {
        let r = YearRange::new(i32::MIN, i32::MAX).unwrap();
        assert_eq!(r.len(), u32::MAX as usize);
        assert!(!r.is_empty());
    }

    #[test]
    fn default_range_starts_at_first_year() {
        let r = YearRange::default();
        assert_eq!(r.from(), FIRST_YEAR);
        assert!(r.to() > Local::now().year());
    }

    #[test]
    fn file_names_follow_dataset() {
        let cfg = DatasetConfig::new("/data");
        assert_eq!(cfg.raw_name(2008), "federal-senate-2008.csv");
        assert_eq!(cfg.translated_path(2008), Path::new("/data/federal-senate-2008.xz"));
        assert_eq!(
            cfg.cleaned_path(),
            Path::new("/data/federal-senate-reimbursements.xz")
        );
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_last_segment() {
        let cfg = DatasetConfig::new("/data")
            .with_base_url("https://example.com/bucket/senate")
            .unwrap();
        let url = cfg.remote_url("federal-senate-2010.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/bucket/senate/federal-senate-2010.csv"
        );
    }

    #[test]
    fn bad_base_url_is_reported() {
        let err = DatasetConfig::new("/data").with_base_url("not a url").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUrl { .. }));
    }
}
