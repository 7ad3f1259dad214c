//! Local package archive over HTTP

use std::io::Write;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use httptest::matchers::{matches, not, request};
use httptest::responders::status_code;
use httptest::{Expectation, Server};

use slicedb::manifest::{ArchiveMirrors, FetchOptions};

pub fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Serves `main_manifest` for every `main` manifest and an empty manifest
/// for every other component, on the primary host only
pub struct ArchiveServer {
    server: Server,
}

impl ArchiveServer {
    pub fn new(main_manifest: &str) -> Self {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::path(matches(
                r"^/ubuntu/dists/[^/]+/main/binary-amd64/Packages\.gz$",
            )))
            .times(..)
            .respond_with(status_code(200).body(gzip(main_manifest))),
        );
        server.expect(
            Expectation::matching(request::path(not(matches(r"/main/binary-"))))
                .times(..)
                .respond_with(status_code(200).body(gzip(""))),
        );
        Self { server }
    }

    pub fn mirrors(&self) -> ArchiveMirrors {
        ArchiveMirrors {
            primary: self.server.url_str("/ubuntu"),
            fallback: self.server.url_str("/old-releases"),
            arch: "amd64".to_string(),
        }
    }

    pub fn fetch_options() -> FetchOptions {
        FetchOptions {
            retry_delay: Duration::ZERO,
            ..FetchOptions::default()
        }
    }
}
