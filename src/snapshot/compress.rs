//! Compressed copy of the snapshot

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use brotli::enc::BrotliEncoderParams;

use crate::error::Result;
use crate::fs_utils::{atomic_rename, remove_if_exists, with_appended_extension};

/// Appended to the database file name
pub const COMPRESSED_EXTENSION: &str = "br";

/// `snapshot.db` -> `snapshot.db.br`
pub fn compressed_path(db_path: &Path) -> PathBuf {
    with_appended_extension(db_path, COMPRESSED_EXTENSION)
}

/// A byte stream compressor
pub trait Compressor {
    /// Compress everything from `input` into `output`
    fn compress(&self, input: &mut dyn io::Read, output: &mut dyn Write) -> io::Result<()>;

    /// Compress `src` into `dst` via a sibling temporary file
    ///
    /// `dst` is replaced in one rename, so readers never see a partial artifact.
    fn compress_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let tmp = with_appended_extension(dst, "tmp");
        let written = (|| -> io::Result<()> {
            let mut input = BufReader::new(File::open(src)?);
            let mut output = BufWriter::new(File::create(&tmp)?);
            self.compress(&mut input, &mut output)?;
            output.flush()?;
            output.get_ref().sync_all()
        })();

        if let Err(e) = written {
            remove_if_exists(&tmp)?;
            return Err(e.into());
        }
        atomic_rename(&tmp, dst)?;
        Ok(())
    }
}

/// Brotli at its densest setting
#[derive(Debug, Clone, Copy)]
pub struct Brotli {
    /// 0..=11
    pub quality: i32,
    /// Window size as log2, 10..=24
    pub lgwin: i32,
}

impl Default for Brotli {
    fn default() -> Self {
        Self {
            quality: 11,
            lgwin: 22,
        }
    }
}

impl Compressor for Brotli {
    fn compress(&self, mut input: &mut dyn io::Read, mut output: &mut dyn Write) -> io::Result<()> {
        let mut params = BrotliEncoderParams::default();
        params.quality = self.quality;
        params.lgwin = self.lgwin;
        let written = brotli::BrotliCompress(&mut input, &mut output, &params)?;
        tracing::debug!("Brotli wrote {} bytes", written);
        Ok(())
    }
}
