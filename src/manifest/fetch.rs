//! Manifest download with retry and archive fallback
//!
//! Each attempt walks an ordered list of endpoints: the live archive first,
//! then the archive of retired releases when the live archive answers 404.
//! [`next_endpoint`] decides every step of that walk.

use std::io::Read;
use std::thread;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use reqwest::header::REFERER;
use reqwest::StatusCode;

use super::{parse_manifest, Component, Package, PackageSource, SubRepo};
use crate::catalog::Release;
use crate::error::{Result, SliceDbError};

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive.ubuntu.com/ubuntu";
pub const DEFAULT_FALLBACK_ARCHIVE_URL: &str = "https://old-releases.ubuntu.com/ubuntu";
pub const DEFAULT_ARCH: &str = "amd64";

/// Archive hosts tried for each manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The live archive
    Primary,
    /// Retired releases
    Fallback,
}

impl Endpoint {
    /// Order in which endpoints are tried within one attempt
    pub const SEQUENCE: [Endpoint; 2] = [Endpoint::Primary, Endpoint::Fallback];
}

/// Endpoint to try after step `step` of an attempt got `status`
///
/// `status` is `None` for transport errors. Only a 404 moves on to the next
/// endpoint; anything else ends the attempt.
pub fn next_endpoint(step: usize, status: Option<u16>) -> Option<Endpoint> {
    match status {
        Some(404) => Endpoint::SEQUENCE.get(step + 1).copied(),
        _ => None,
    }
}

/// Base URLs and architecture of the package archive
#[derive(Debug, Clone)]
pub struct ArchiveMirrors {
    pub primary: String,
    pub fallback: String,
    pub arch: String,
}

impl Default for ArchiveMirrors {
    fn default() -> Self {
        Self {
            primary: DEFAULT_ARCHIVE_URL.to_string(),
            fallback: DEFAULT_FALLBACK_ARCHIVE_URL.to_string(),
            arch: DEFAULT_ARCH.to_string(),
        }
    }
}

impl ArchiveMirrors {
    fn base(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Primary => self.primary.trim_end_matches('/'),
            Endpoint::Fallback => self.fallback.trim_end_matches('/'),
        }
    }

    /// `<host>/dists/<codename>[-<subrepo>]/<component>/binary-<arch>`
    pub fn manifest_dir(
        &self,
        endpoint: Endpoint,
        release: &Release,
        component: Component,
        sub_repo: SubRepo,
    ) -> String {
        format!(
            "{}/dists/{}/{}/binary-{}",
            self.base(endpoint),
            sub_repo.dist_name(&release.short_codename()),
            component,
            self.arch
        )
    }

    pub fn manifest_url(
        &self,
        endpoint: Endpoint,
        release: &Release,
        component: Component,
        sub_repo: SubRepo,
    ) -> String {
        format!(
            "{}/Packages.gz",
            self.manifest_dir(endpoint, release, component, sub_repo)
        )
    }
}

/// Retry budget and timeouts
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub max_attempts: u32,
    /// Multiplied by the attempt number before each retry
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
    /// Applies to the response headers and to each read of the body
    /// stream, not to the whole download
    pub read_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Downloads and parses `Packages.gz` manifests
pub struct ManifestFetcher {
    client: Client,
    mirrors: ArchiveMirrors,
    options: FetchOptions,
}

/// Result of one request
enum Outcome {
    Manifest(String),
    Status(u16),
    Failed(String),
}

impl ManifestFetcher {
    pub fn new(mirrors: ArchiveMirrors, options: FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.read_timeout)
            .user_agent(format!("slicedb/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SliceDbError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            mirrors,
            options,
        })
    }

    pub fn mirrors(&self) -> &ArchiveMirrors {
        &self.mirrors
    }

    /// Download and decompress one manifest
    pub fn fetch_text(
        &self,
        release: &Release,
        component: Component,
        sub_repo: SubRepo,
    ) -> Result<String> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut last_url = String::new();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let mut step = 0;
            let mut endpoint = Endpoint::SEQUENCE[0];

            loop {
                let dir = self.mirrors.manifest_dir(endpoint, release, component, sub_repo);
                let url = format!("{}/Packages.gz", dir);

                let status = match self.request(&url, &dir) {
                    Outcome::Manifest(text) => {
                        tracing::debug!("Downloaded {} ({} bytes decompressed)", url, text.len());
                        return Ok(text);
                    }
                    Outcome::Status(code) => {
                        last_error = format!("HTTP status code: {}", code);
                        Some(code)
                    }
                    Outcome::Failed(message) => {
                        last_error = message;
                        None
                    }
                };
                last_url = url;

                match next_endpoint(step, status) {
                    Some(next) => {
                        tracing::debug!("{} not found, trying {:?} archive", last_url, next);
                        endpoint = next;
                        step += 1;
                    }
                    None => break,
                }
            }

            if attempt < max_attempts {
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}",
                    attempt,
                    max_attempts,
                    last_url,
                    last_error
                );
                thread::sleep(self.options.retry_delay * attempt);
            }
        }

        Err(SliceDbError::Network {
            url: last_url,
            message: format!("{} (after {} attempts)", last_error, max_attempts),
        })
    }

    fn request(&self, url: &str, referer: &str) -> Outcome {
        let response = match self.client.get(url).header(REFERER, referer).send() {
            Ok(response) => response,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        if response.status() != StatusCode::OK {
            return Outcome::Status(response.status().as_u16());
        }

        // Streaming keeps the client timeout per read rather than per download
        match decode_manifest(response) {
            Ok(text) => Outcome::Manifest(text),
            Err(e) => Outcome::Failed(format!("failed to read manifest: {}", e)),
        }
    }
}

impl PackageSource for ManifestFetcher {
    fn packages(
        &self,
        release: &Release,
        component: Component,
        sub_repo: SubRepo,
    ) -> Result<Vec<Package>> {
        let text = self.fetch_text(release, component, sub_repo)?;
        let packages = parse_manifest(&text, component, sub_repo);
        tracing::debug!(
            "Parsed {} packages for {} {}/{}",
            packages.len(),
            release,
            component,
            sub_repo.dist_name(&release.short_codename())
        );
        Ok(packages)
    }
}

/// Gunzip a manifest stream; text that is not UTF-8 is an error
fn decode_manifest(reader: impl Read) -> std::io::Result<String> {
    let mut text = String::new();
    GzDecoder::new(reader).read_to_string(&mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use httptest::matchers::request;
    use httptest::responders::status_code;
    use httptest::{Expectation, Server};
    use std::io::Write;

    const PRIMARY_PATH: &str = "/primary/dists/noble/main/binary-amd64/Packages.gz";
    const FALLBACK_PATH: &str = "/fallback/dists/noble/main/binary-amd64/Packages.gz";

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn noble() -> Release {
        Release::new("24.04", "Noble Numbat")
    }

    fn fetcher(server: &Server) -> ManifestFetcher {
        let mirrors = ArchiveMirrors {
            primary: server.url_str("/primary"),
            fallback: server.url_str("/fallback"),
            arch: DEFAULT_ARCH.to_string(),
        };
        let options = FetchOptions {
            retry_delay: Duration::ZERO,
            ..FetchOptions::default()
        };
        ManifestFetcher::new(mirrors, options).unwrap()
    }

    #[test]
    fn test_next_endpoint() {
        assert_eq!(next_endpoint(0, Some(404)), Some(Endpoint::Fallback));
        assert_eq!(next_endpoint(1, Some(404)), None);
        assert_eq!(next_endpoint(0, Some(500)), None);
        assert_eq!(next_endpoint(0, None), None);
    }

    #[test]
    fn test_manifest_urls() {
        let mirrors = ArchiveMirrors::default();
        assert_eq!(
            mirrors.manifest_url(Endpoint::Primary, &noble(), Component::Universe, SubRepo::Security),
            "https://archive.ubuntu.com/ubuntu/dists/noble-security/universe/binary-amd64/Packages.gz"
        );
        assert_eq!(
            mirrors.manifest_dir(Endpoint::Fallback, &noble(), Component::Main, SubRepo::Release),
            "https://old-releases.ubuntu.com/ubuntu/dists/noble/main/binary-amd64"
        );
    }

    #[test]
    fn test_primary_success() {
        let server = Server::run();
        let body = gzip("Package: bash\nVersion: 5.2\nSection: shells\nDescription: shell\n");
        server.expect(
            Expectation::matching(request::method_path("GET", PRIMARY_PATH))
                .respond_with(status_code(200).body(body)),
        );

        let packages = fetcher(&server)
            .packages(&noble(), Component::Main, SubRepo::Release)
            .unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "bash");
    }

    #[test]
    fn test_falls_back_to_old_releases_on_404() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", PRIMARY_PATH))
                .respond_with(status_code(404)),
        );
        let body = gzip("Package: hello\nVersion: 2.10\nSection: devel\nDescription: from fallback\n");
        server.expect(
            Expectation::matching(request::method_path("GET", FALLBACK_PATH))
                .respond_with(status_code(200).body(body)),
        );

        let packages = fetcher(&server)
            .packages(&noble(), Component::Main, SubRepo::Release)
            .unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].description, "from fallback");
    }

    #[test]
    fn test_server_error_exhausts_attempts_without_fallback() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", PRIMARY_PATH))
                .times(3)
                .respond_with(status_code(500)),
        );

        let err = fetcher(&server)
            .packages(&noble(), Component::Main, SubRepo::Release)
            .unwrap_err();
        match err {
            SliceDbError::Network { url, message } => {
                assert!(url.contains("/primary/"));
                assert!(message.contains("500"));
            }
            other => panic!("expected Network error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_everywhere_is_fatal() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", PRIMARY_PATH))
                .times(3)
                .respond_with(status_code(404)),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", FALLBACK_PATH))
                .times(3)
                .respond_with(status_code(404)),
        );

        let err = fetcher(&server)
            .packages(&noble(), Component::Main, SubRepo::Release)
            .unwrap_err();
        assert!(matches!(err, SliceDbError::Network { .. }));
    }

    #[test]
    fn test_non_utf8_manifest_fails_each_attempt() {
        let server = Server::run();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"Package: hello\nVersion: 2.10\nSection: devel\nDescription: caf\xe9\n")
            .unwrap();
        let body = encoder.finish().unwrap();
        server.expect(
            Expectation::matching(request::method_path("GET", PRIMARY_PATH))
                .times(3)
                .respond_with(status_code(200).body(body)),
        );

        let err = fetcher(&server)
            .packages(&noble(), Component::Main, SubRepo::Release)
            .unwrap_err();
        match err {
            SliceDbError::Network { message, .. } => {
                assert!(message.contains("UTF-8"), "{}", message);
                assert!(message.contains("after 3 attempts"), "{}", message);
            }
            other => panic!("expected Network error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_manifest_streams_large_body() {
        let stanzas: String = (0..20_000)
            .map(|i| format!("Package: pkg{i}\nVersion: 1.{i}\nSection: libs\nDescription: package {i}\n\n"))
            .collect();
        let compressed = gzip(&stanzas);

        let text = decode_manifest(compressed.as_slice()).unwrap();
        assert_eq!(text, stanzas);
        assert!(decode_manifest(&b"not gzip"[..]).is_err());
    }
}
