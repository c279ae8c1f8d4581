//! Utility functions for feed fetching.

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use std::io::Read;
use tracing::{debug, warn};

use crate::TARGET_WEB_REQUEST;

/// Helper function to validate a URL
pub fn is_valid_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        parsed.scheme() == "http" || parsed.scheme() == "https"
    } else {
        false
    }
}

/// Undo the `Content-Encoding` a server declared.
///
/// Declared encodings that fail to decode (or decode to nothing) yield the raw
/// bytes unchanged. Unknown encodings and `identity` pass through untouched.
pub fn decode_body(bytes: &[u8], content_encoding: Option<&str>, url: &str) -> Vec<u8> {
    let encoding = match content_encoding.map(|e| e.trim().to_ascii_lowercase()) {
        Some(e) if !e.is_empty() && e != "identity" => e,
        _ => return bytes.to_vec(),
    };

    let decoded = match encoding.as_str() {
        // Concatenated gzip members are one stream
        "gzip" | "x-gzip" => read_all(MultiGzDecoder::new(bytes)),
        // "deflate" is meant to be zlib-wrapped, but raw deflate is common
        "deflate" => read_all(ZlibDecoder::new(bytes)).or_else(|| read_all(DeflateDecoder::new(bytes))),
        other => {
            debug!(target: TARGET_WEB_REQUEST, "Unsupported content encoding {} from {}, keeping body as is", other, url);
            return bytes.to_vec();
        }
    };

    match decoded {
        Some(decoded) => {
            debug!(target: TARGET_WEB_REQUEST, "Decoded {} body from {} ({} -> {} bytes)", encoding, url, bytes.len(), decoded.len());
            decoded
        }
        None => {
            warn!(target: TARGET_WEB_REQUEST, "Body from {} declared {} but could not be decoded, using raw bytes", url, encoding);
            bytes.to_vec()
        }
    }
}

fn read_all<R: Read>(mut reader: R) -> Option<Vec<u8>> {
    let mut decoded = Vec::new();
    match reader.read_to_end(&mut decoded) {
        Ok(_) if !decoded.is_empty() => Some(decoded),
        _ => None,
    }
}
