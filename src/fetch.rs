//! Byte sources for the dataset and the model artifact.
//!
//! A source is either an `http(s)://` URL or a local path. Anything ending in
//! `.gz` is decompressed after reading.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

/// Loads raw bytes from a local file path or over HTTP.
#[tracing::instrument]
pub fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        fetch_bytes(source).with_context(|| format!("failed to fetch '{source}'"))?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read '{source}'"))?
    };
    debug!(bytes = bytes.len(), "Source bytes received");

    if source.ends_with(".gz") {
        return gunzip(&bytes).with_context(|| format!("failed to decompress '{source}'"));
    }
    Ok(bytes)
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", std::env::temp_dir().display(), name)
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/data.csv"));
        assert!(is_remote("http://localhost/data.csv"));
        assert!(!is_remote("data/cleaned_data.csv"));
    }

    #[test]
    fn test_read_plain_file() {
        let path = temp_path("delivery_insights_fetch_plain.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let bytes = read_source(&path).unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_gzip_file() {
        let path = temp_path("delivery_insights_fetch.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"a,b\n1,2\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let bytes = read_source(&path).unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(read_source(&temp_path("delivery_insights_does_not_exist.csv")).is_err());
    }
}
