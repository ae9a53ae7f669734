//! Request/response body compression.
//!
//! Routers accept gzip and brotli by default: incoming bodies are
//! decompressed per `Content-Encoding`, outgoing bodies are compressed
//! with whatever [`negotiate`] selects from the client's
//! `Accept-Encoding` preference.

use std::fmt;
use std::io::{self, Read, Write};

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 5;
const BROTLI_LG_WINDOW: u32 = 22;

/// A supported body compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Encoding {
    /// RFC 1952 gzip.
    Gzip,
    /// RFC 7932 brotli.
    Brotli,
}

impl Encoding {
    /// The token used in `Content-Encoding` / `Accept-Encoding` headers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Brotli => "br",
        }
    }

    /// Parse a header token, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("gzip") {
            Some(Self::Gzip)
        } else if name.eq_ignore_ascii_case("br") {
            Some(Self::Brotli)
        } else {
            None
        }
    }

    /// Compress a complete body.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying encoder.
    pub fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Brotli => {
                let mut out = Vec::new();
                {
                    let mut writer = brotli::CompressorWriter::new(
                        &mut out,
                        BROTLI_BUFFER_SIZE,
                        BROTLI_QUALITY,
                        BROTLI_LG_WINDOW,
                    );
                    writer.write_all(data)?;
                }
                Ok(out)
            }
        }
    }

    /// Decompress a complete body.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors, including malformed compressed input.
    pub fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Self::Gzip => {
                flate2::read::GzDecoder::new(data).read_to_end(&mut out)?;
            }
            Self::Brotli => {
                brotli::Decompressor::new(data, BROTLI_BUFFER_SIZE).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pick the response encoding from a client's `Accept-Encoding` value.
///
/// Honors the client's listed order, skips `q=0` entries, and returns the
/// first scheme the server supports. `None` means identity.
pub fn negotiate(accept_encoding: Option<&str>, supported: &[Encoding]) -> Option<Encoding> {
    let header = accept_encoding?;
    for entry in header.split(',') {
        let mut parts = entry.trim().split(';');
        let name = parts.next().unwrap_or("").trim();
        let rejected = parts.any(|param| {
            let param = param.trim();
            param
                .strip_prefix("q=")
                .or_else(|| param.strip_prefix("Q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q == 0.0)
        });
        if rejected {
            continue;
        }
        if let Some(encoding) = Encoding::from_name(name)
            && supported.contains(&encoding)
        {
            return Some(encoding);
        }
    }
    None
}
