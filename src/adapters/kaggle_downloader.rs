// ============================================================
// Adapter - Kaggle Dataset Downloader
// ============================================================
// Implements DatasetSource against the Kaggle REST API.
//
//   authenticate() - resolve credentials (see infra::credentials)
//   download()     - GET /datasets/download/{owner}/{slug} as a
//                    zip archive, unpack it into the destination
//                    and delete the archive
//
// A dataset may be named `owner/slug` or by its page URL,
// e.g. https://www.kaggle.com/datasets/owner/slug/data

use std::{
    cell::RefCell,
    fs,
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use url::Url;

use crate::domain::{artifacts::DownloadedDataset, traits::DatasetSource};
use crate::infra::{
    config::KaggleConfig,
    credentials::{CredentialSources, KaggleCredentials},
};

/// `owner/slug` identifier of a Kaggle dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
    pub owner: String,
    pub slug:  String,
}

impl DatasetRef {
    /// Accepts `owner/slug` or a kaggle.com dataset URL.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.starts_with("http://") || name.starts_with("https://") {
            return Self::from_url(name);
        }

        let parts: Vec<&str> = name.trim_matches('/').split('/').collect();
        match parts.as_slice() {
            [owner, slug] if !owner.is_empty() && !slug.is_empty() => Ok(Self {
                owner: owner.to_string(),
                slug:  slug.to_string(),
            }),
            _ => anyhow::bail!("Invalid dataset name '{name}': expected 'owner/dataset-slug' or a Kaggle URL"),
        }
    }

    fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("Invalid dataset URL '{raw}'"))?;
        let host = url.host_str().unwrap_or_default();
        if host != "kaggle.com" && !host.ends_with(".kaggle.com") {
            anyhow::bail!("'{raw}' is not a Kaggle URL");
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        match segments.as_slice() {
            ["datasets", owner, slug, ..] => Ok(Self {
                owner: owner.to_string(),
                slug:  slug.to_string(),
            }),
            _ => anyhow::bail!("'{raw}' does not point at a dataset (expected /datasets/owner/slug)"),
        }
    }

    pub fn download_url(&self, api_base: &str) -> String {
        format!("{}/datasets/download/{}/{}", api_base.trim_end_matches('/'), self.owner, self.slug)
    }
}

impl std::fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

pub struct KaggleDownloaderAdapter {
    config:      KaggleConfig,
    sources:     CredentialSources,
    credentials: RefCell<Option<KaggleCredentials>>,
}

impl KaggleDownloaderAdapter {
    pub fn new(config: KaggleConfig) -> Self {
        Self::with_sources(config, CredentialSources::from_env())
    }

    pub fn with_sources(config: KaggleConfig, sources: CredentialSources) -> Self {
        Self { config, sources, credentials: RefCell::new(None) }
    }

    fn fetch_archive(&self, dataset: &DatasetRef, creds: &KaggleCredentials, archive: &Path) -> Result<()> {
        let url = dataset.download_url(&self.config.api_base);
        tracing::debug!("GET {}", url);

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("ml-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let mut response = client
            .get(&url)
            .basic_auth(&creds.username, Some(&creds.key))
            .send()
            .with_context(|| format!("Request to '{url}' failed"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Kaggle returned {status} for dataset '{dataset}'");
        }

        let mut file = fs::File::create(archive)
            .with_context(|| format!("Cannot create '{}'", archive.display()))?;
        let bytes = response
            .copy_to(&mut file)
            .with_context(|| format!("Failed while downloading '{dataset}'"))?;
        tracing::debug!("Downloaded {} bytes to '{}'", bytes, archive.display());
        Ok(())
    }
}

impl DatasetSource for KaggleDownloaderAdapter {
    fn authenticate(&self) -> Result<()> {
        let creds = self.sources.load()?;
        tracing::debug!("Authenticated as '{}'", creds.username);
        *self.credentials.borrow_mut() = Some(creds);
        Ok(())
    }

    fn download(&self, name: &str, destination: &Path) -> Result<DownloadedDataset> {
        let creds = self
            .credentials
            .borrow()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Not authenticated: call authenticate() before download()"))?;
        let dataset = DatasetRef::parse(name)?;

        fs::create_dir_all(destination)
            .with_context(|| format!("Cannot create '{}'", destination.display()))?;
        let archive = destination.join(format!("{}.zip", dataset.slug));
        let _cleanup = ArchiveGuard(&archive);

        self.fetch_archive(&dataset, &creds, &archive)?;
        let files = extract_zip(&archive, destination)?;
        tracing::info!("Extracted {} file(s) into '{}'", files.len(), destination.display());

        Ok(DownloadedDataset {
            name:      dataset.to_string(),
            directory: destination.to_path_buf(),
            files,
        })
    }
}

/// Removes the downloaded archive when the download ends, on
/// success and on every error path.
struct ArchiveGuard<'a>(&'a Path);

impl Drop for ArchiveGuard<'_> {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = fs::remove_file(self.0) {
                tracing::warn!("Cannot remove '{}': {}", self.0.display(), e);
            }
        }
    }
}

/// Unpack every file of `archive` under `destination`. Entries
/// whose names would escape the destination are skipped. If
/// extraction fails part-way, the files written so far are removed.
pub fn extract_zip(archive: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let file = fs::File::open(archive)
        .with_context(|| format!("Cannot open '{}'", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("'{}' is not a zip archive", archive.display()))?;

    let mut files = Vec::new();
    if let Err(e) = extract_entries(&mut zip, destination, &mut files) {
        for written in &files {
            let _ = fs::remove_file(written);
        }
        return Err(e);
    }
    Ok(files)
}

fn extract_entries(
    zip:         &mut zip::ZipArchive<fs::File>,
    destination: &Path,
    files:       &mut Vec<PathBuf>,
) -> Result<()> {
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry '{}'", entry.name());
            continue;
        };
        let out = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut target = fs::File::create(&out)
            .with_context(|| format!("Cannot create '{}'", out.display()))?;
        files.push(out.clone());
        io::copy(&mut entry, &mut target)
            .with_context(|| format!("Cannot extract '{}'", out.display()))?;
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Cursor, Read, Write},
        net::TcpListener,
        sync::mpsc,
        thread,
    };

    /// Answer one request on a free local port with a canned
    /// response. The raw request head is sent back on the channel.
    fn serve_once(status: &'static str, body: Vec<u8>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            tx.send(String::from_utf8_lossy(&request).into_owned()).unwrap();

            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        (format!("http://{addr}/api/v1"), rx)
    }

    fn authenticated(api_base: String) -> KaggleDownloaderAdapter {
        let sources = CredentialSources {
            env_username: Some("u".into()),
            env_key:      Some("k".into()),
            ..Default::default()
        };
        let adapter = KaggleDownloaderAdapter::with_sources(KaggleConfig { api_base }, sources);
        adapter.authenticate().unwrap();
        adapter
    }

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_download_extracts_and_removes_archive() {
        let body = zip_bytes(&[("iris.csv", b"a,b\n1,2\n"), ("notes.txt", b"hi")]);
        let (api_base, request) = serve_once("200 OK", body);
        let dir = tempfile::tempdir().unwrap();

        let dataset = authenticated(api_base).download("uciml/iris", dir.path()).unwrap();
        assert_eq!(dataset.name, "uciml/iris");
        assert_eq!(dataset.files.len(), 2);
        assert_eq!(dir_names(dir.path()), vec!["iris.csv", "notes.txt"]);
        assert_eq!(fs::read_to_string(dir.path().join("iris.csv")).unwrap(), "a,b\n1,2\n");

        let request = request.recv().unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /api/v1/datasets/download/uciml/iris "));
        // base64("u:k")
        assert!(request.contains("authorization: basic dtpr"));
    }

    #[test]
    fn test_error_status_is_reported_and_nothing_is_left() {
        let (api_base, _request) = serve_once("403 Forbidden", b"denied".to_vec());
        let dir = tempfile::tempdir().unwrap();

        let err = authenticated(api_base).download("uciml/iris", dir.path()).unwrap_err();
        assert!(err.to_string().contains("403"), "{err}");
        assert!(dir_names(dir.path()).is_empty());
    }

    #[test]
    fn test_corrupt_archive_is_removed() {
        let (api_base, _request) = serve_once("200 OK", b"this is not a zip file".to_vec());
        let dir = tempfile::tempdir().unwrap();

        let err = authenticated(api_base).download("uciml/iris", dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a zip archive"), "{err}");
        assert!(dir_names(dir.path()).is_empty());
    }

    #[test]
    fn test_parse_owner_slug() {
        let r = DatasetRef::parse("uciml/iris").unwrap();
        assert_eq!(r, DatasetRef { owner: "uciml".into(), slug: "iris".into() });
        assert_eq!(r.to_string(), "uciml/iris");
    }

    #[test]
    fn test_parse_url() {
        let r = DatasetRef::parse("https://www.kaggle.com/datasets/uciml/iris/data").unwrap();
        assert_eq!(r.owner, "uciml");
        assert_eq!(r.slug, "iris");
        assert_eq!(
            r.download_url("https://www.kaggle.com/api/v1/"),
            "https://www.kaggle.com/api/v1/datasets/download/uciml/iris"
        );
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        assert!(DatasetRef::parse("iris").is_err());
        assert!(DatasetRef::parse("a/b/c").is_err());
        assert!(DatasetRef::parse("https://example.com/datasets/a/b").is_err());
        assert!(DatasetRef::parse("https://www.kaggle.com/competitions/titanic").is_err());
    }

    #[test]
    fn test_download_requires_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = KaggleDownloaderAdapter::with_sources(KaggleConfig::default(), CredentialSources::default());
        let err = adapter.download("uciml/iris", dir.path()).unwrap_err();
        assert!(err.to_string().contains("authenticate"));
    }

    #[test]
    fn test_authenticate_stores_credentials() {
        let sources = CredentialSources {
            env_username: Some("u".into()),
            env_key:      Some("k".into()),
            ..Default::default()
        };
        let adapter = KaggleDownloaderAdapter::with_sources(KaggleConfig::default(), sources);
        adapter.authenticate().unwrap();
        assert_eq!(adapter.credentials.borrow().as_ref().unwrap().username, "u");
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("iris.zip");
        {
            let mut zip = zip::ZipWriter::new(fs::File::create(&archive).unwrap());
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("iris.csv", options).unwrap();
            zip.write_all(b"a,b\n1,2\n").unwrap();
            zip.start_file("extra/readme.txt", options).unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap();
        }

        let out = dir.path().join("out");
        let files = extract_zip(&archive, &out).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(fs::read_to_string(out.join("iris.csv")).unwrap(), "a,b\n1,2\n");
        assert!(out.join("extra/readme.txt").exists());
    }
}
