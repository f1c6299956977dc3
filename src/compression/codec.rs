//! Compression codecs.

use std::io::Write;

use bytes::Bytes;
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;

use crate::compression::Encoding;
use crate::config::CompressionConfig;
use crate::error::EdgeError;

/// Brotli window size (log2).
const BROTLI_LGWIN: i32 = 22;

/// Compressor for response bodies.
#[derive(Debug, Clone)]
pub struct Compressor {
    enabled: bool,
    gzip_level: u32,
    brotli_quality: u32,
}

impl Compressor {
    pub fn new(config: &CompressionConfig) -> Self {
        Self {
            enabled: config.enabled,
            gzip_level: config.gzip_level,
            brotli_quality: config.brotli_quality,
        }
    }

    /// Whether negotiation should be attempted at all.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Compress `data` on the blocking pool.
    pub async fn compress(&self, data: Bytes, encoding: Encoding) -> Result<Bytes, EdgeError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.compress_sync(&data, encoding))
            .await
            .map_err(|e| EdgeError::Compression(std::io::Error::other(e)))?
            .map(Bytes::from)
    }

    /// Compress `data` on the current thread.
    pub fn compress_sync(&self, data: &[u8], encoding: Encoding) -> Result<Vec<u8>, EdgeError> {
        match encoding {
            Encoding::Brotli => self.compress_brotli(data),
            Encoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::new(self.gzip_level));
                encoder.write_all(data).map_err(EdgeError::Compression)?;
                encoder.finish().map_err(EdgeError::Compression)
            }
            Encoding::Deflate => {
                let mut encoder =
                    DeflateEncoder::new(Vec::new(), Compression::new(self.gzip_level));
                encoder.write_all(data).map_err(EdgeError::Compression)?;
                encoder.finish().map_err(EdgeError::Compression)
            }
        }
    }

    fn compress_brotli(&self, data: &[u8]) -> Result<Vec<u8>, EdgeError> {
        let mut params = brotli::enc::BrotliEncoderParams::default();
        params.quality = self.brotli_quality as i32;
        params.lgwin = BROTLI_LGWIN;

        let mut output = Vec::new();
        brotli::BrotliCompress(&mut &data[..], &mut output, &params)
            .map_err(EdgeError::Compression)?;
        Ok(output)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(&CompressionConfig::default())
    }
}
