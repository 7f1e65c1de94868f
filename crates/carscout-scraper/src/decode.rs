//! Response decoding that tolerates upstream mislabeling its own encoding.
//!
//! The listing API advertises `Content-Encoding` inconsistently: some
//! responses arrive already decompressed with the header still set, others
//! are compressed exactly as declared. The body is parsed as JSON first and
//! decompressed only if that fails.

use std::io::Read;

use serde_json::Value;

use crate::error::DecodeError;

/// Parses a response body into a JSON document.
///
/// `content_encoding` is the raw `Content-Encoding` header value, if any.
///
/// # Errors
///
/// - [`DecodeError::UnknownEncoding`] when the body is not JSON and the
///   declared encoding is neither `br` nor `gzip`.
/// - [`DecodeError::MissingCodec`] for `br` bodies when the crate is built
///   without the `brotli` feature.
/// - [`DecodeError::Decompress`] / [`DecodeError::Parse`] when the declared
///   codec fails or its output is not JSON.
pub fn decode_body(content_encoding: Option<&str>, body: &[u8]) -> Result<Value, DecodeError> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return Ok(value);
    }

    let encoding = content_encoding
        .map(|e| e.trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty());

    match encoding.as_deref() {
        Some("br") => {
            let raw = decompress_brotli(body)?;
            parse_decompressed(&raw, "brotli decompression")
        }
        Some("gzip" | "x-gzip") => {
            let raw = decompress_gzip(body)?;
            parse_decompressed(&raw, "gzip decompression")
        }
        _ => Err(DecodeError::UnknownEncoding { encoding }),
    }
}

fn parse_decompressed(raw: &[u8], stage: &'static str) -> Result<Value, DecodeError> {
    serde_json::from_slice(raw).map_err(|source| DecodeError::Parse { stage, source })
}

/// Decodes every gzip member in `body`, not just the first.
fn decompress_gzip(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = flate2::read::MultiGzDecoder::new(body);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|source| DecodeError::Decompress {
            encoding: "gzip",
            source,
        })?;
    Ok(out)
}

#[cfg(feature = "brotli")]
fn decompress_brotli(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = brotli::Decompressor::new(body, 4096);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|source| DecodeError::Decompress {
            encoding: "brotli",
            source,
        })?;
    Ok(out)
}

#[cfg(not(feature = "brotli"))]
fn decompress_brotli(_body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Err(DecodeError::MissingCodec { codec: "brotli" })
}
