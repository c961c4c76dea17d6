// src/codec.rs
//
// Reading the Senate's legacy CSV exports and reading/writing the
// xz-compressed UTF-8 CSV used for translated and cleaned files.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use encoding_rs::WINDOWS_1252;
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use xz2::{read::XzDecoder, write::XzEncoder};

use crate::error::{PipelineError, Result};

/// xz preset for written files; 6 is the `xz` command line default.
const XZ_PRESET: u32 = 6;
const LEGACY_DELIMITER: u8 = b';';

/// A fully decoded legacy table: header row plus data rows.
#[derive(Debug)]
pub struct LegacyTable {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

/// Read a raw Senate export: ISO-8859-1 text, `;` separated, with a
/// one-line "last updated" banner above the real header.
///
/// `encoding_rs` resolves the ISO-8859-1 label to windows-1252, which
/// agrees with it on every printable byte.
pub fn read_legacy_csv(path: &Path) -> Result<LegacyTable> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let (text, _, had_errors) = WINDOWS_1252.decode(&bytes);
    if had_errors {
        warn!(path = %path.display(), "replacement characters while decoding legacy text");
    }

    let body = match text.split_once('\n') {
        Some((_banner, rest)) => rest,
        None => return Err(PipelineError::malformed(path, "missing header after banner line")),
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(LEGACY_DELIMITER)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| csv_to_pipeline(path, e))?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::malformed(path, "empty header row"));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record.map_err(|e| csv_to_pipeline(path, e))?);
    }
    debug!(path = %path.display(), columns = headers.len(), rows = rows.len(), "decoded legacy csv");

    Ok(LegacyTable { headers, rows })
}

/// Ragged rows mean the file does not have the expected shape; anything
/// else stays a plain CSV error.
fn csv_to_pipeline(path: &Path, err: csv::Error) -> PipelineError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        let line = pos.as_ref().map(|p| p.line() + 1).unwrap_or_default();
        return PipelineError::malformed(
            path,
            format!("line {line} has {len} fields, header has {expected_len}"),
        );
    }
    PipelineError::csv(path, err)
}

pub type XzCsvReader = csv::Reader<XzDecoder<BufReader<File>>>;

/// Open an xz-compressed, comma separated UTF-8 file with a header row.
pub fn open_xz_csv(path: &Path) -> Result<XzCsvReader> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .from_reader(XzDecoder::new(BufReader::new(file))))
}

/// Writes xz-compressed CSV into a temp file next to `path` and renames it
/// into place on [`finish`](Self::finish). Dropping the writer early
/// discards the temp file and leaves any previous `path` untouched.
pub struct XzCsvWriter {
    path: PathBuf,
    inner: csv::Writer<XzEncoder<NamedTempFile>>,
}

impl XzCsvWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
        let inner = WriterBuilder::new().from_writer(XzEncoder::new(tmp, XZ_PRESET));
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner
            .write_record(record)
            .map_err(|e| PipelineError::csv(&self.path, e))
    }

    pub fn finish(self) -> Result<PathBuf> {
        let encoder = self
            .inner
            .into_inner()
            .map_err(|e| PipelineError::io(&self.path, e.into_error()))?;
        let tmp = encoder
            .finish()
            .map_err(|e| PipelineError::io(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| PipelineError::io(&self.path, e.error))?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_latin1(path: &Path, text: &str) {
        let (bytes, _, _) = WINDOWS_1252.encode(text);
        fs::File::create(path).unwrap().write_all(&bytes).unwrap();
    }

    #[test]
    fn legacy_banner_is_skipped_and_text_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        write_latin1(
            &path,
            "\"ULTIMA ATUALIZACAO\";\"01/02/2017\"\n\"ANO\";\"SENADOR\"\n\"2008\";\"JOÃO\"\n",
        );

        let table = read_legacy_csv(&path).unwrap();
        assert_eq!(table.headers.iter().collect::<Vec<_>>(), vec!["ANO", "SENADOR"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(&table.rows[0][1], "JOÃO");
    }

    #[test]
    fn ragged_row_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        write_latin1(&path, "banner\nANO;MES\n2008;1\n2008\n");

        let err = read_legacy_csv(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }), "{err}");
    }

    #[test]
    fn banner_only_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        write_latin1(&path, "\"ULTIMA ATUALIZACAO\";\"01/02/2017\"");

        let err = read_legacy_csv(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn xz_writer_replaces_target_only_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xz");

        let mut w = XzCsvWriter::create(&path).unwrap();
        w.write_record(["year", "month"]).unwrap();
        w.write_record(["2008", "1"]).unwrap();
        assert!(!path.exists());
        w.finish().unwrap();

        let mut rdr = open_xz_csv(&path).unwrap();
        assert_eq!(rdr.headers().unwrap().iter().collect::<Vec<_>>(), vec!["year", "month"]);
        let rows: Vec<StringRecord> = rdr.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "2008");

        // only the final file remains, no stray temp files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
