// src/fetch/mod.rs

use reqwest::{blocking::Client, StatusCode};
use std::{
    fs,
    io::{ErrorKind, Read, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::debug;
use url::Url;

use crate::config::DatasetConfig;
use crate::error::{PipelineError, RemoteError};

/// Retrieves a named object from wherever the dataset is published.
///
/// Implementations must fail with [`RemoteError::NotFound`] when the object
/// is absent, so the pipeline can report the year and move on.
pub trait RemoteStore {
    fn retrieve(&self, name: &str, dest: &Path) -> Result<(), RemoteError>;
}

/// Any `Fn(name, dest)` works as a store, which keeps test fakes short.
impl<F> RemoteStore for F
where
    F: Fn(&str, &Path) -> Result<(), RemoteError>,
{
    fn retrieve(&self, name: &str, dest: &Path) -> Result<(), RemoteError> {
        self(name, dest)
    }
}

/// Plain HTTP(S) GETs under a base URL, e.g. a public S3 bucket prefix.
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn from_config(config: &DatasetConfig) -> Result<Self, PipelineError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self::new(client, config.base_url().clone()))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl RemoteStore for HttpStore {
    fn retrieve(&self, name: &str, dest: &Path) -> Result<(), RemoteError> {
        let url = self.base.join(name).map_err(|e| RemoteError::Unreachable {
            url: format!("{}{}", self.base, name),
            source: Box::new(e),
        })?;
        let unreachable = |e: reqwest::Error| RemoteError::Unreachable {
            url: url.to_string(),
            source: Box::new(e),
        };

        debug!(%url, "GET");
        let mut resp = self.client.get(url.clone()).send().map_err(unreachable)?;

        // S3 answers 403 for missing keys when listing is not allowed.
        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::NotFound {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if let Err(e) = resp.error_for_status_ref() {
            return Err(unreachable(e));
        }

        let io_err = |e: std::io::Error| RemoteError::Io {
            path: dest.to_path_buf(),
            source: e,
        };
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        let bytes = copy_body(&mut resp, &mut tmp, url.as_str(), dest)?;
        tmp.persist(dest).map_err(|e| io_err(e.error))?;

        debug!(%url, bytes, dest = %dest.display(), "saved");
        Ok(())
    }
}

/// Stream `body` into `out`. Read failures are transfer problems and
/// count as unreachable; write failures are local and stay `Io`.
fn copy_body<R: Read, W: Write>(
    body: &mut R,
    out: &mut W,
    url: &str,
    dest: &Path,
) -> Result<u64, RemoteError> {
    let io_err = |e: std::io::Error| RemoteError::Io {
        path: dest.to_path_buf(),
        source: e,
    };
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(RemoteError::Unreachable {
                    url: url.to_string(),
                    source: Box::new(e),
                })
            }
        };
        out.write_all(&buf[..n]).map_err(io_err)?;
        total += n as u64;
    }
    out.flush().map_err(io_err)?;
    Ok(total)
}
