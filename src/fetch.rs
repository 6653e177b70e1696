//! Playlist retrieval
//!
//! Walks candidate sources in order and hands back the first playlist
//! text it can retrieve. HTTP(S) sources go through ureq; anything else
//! is read as a local file. The caller decides what an overall failure
//! means (typically: feed the parser nothing and let the catalog fall
//! back to its snapshot).

use std::fs;
use std::time::Duration;

use log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("No playlist source could be retrieved")]
    NoSource,
}

/// Fetch one source: URL or local file path.
pub fn fetch_source(source: &str, user_agent: &str) -> Result<String, FetchError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        download(source, user_agent)
    } else {
        Ok(fs::read_to_string(source)?)
    }
}

/// Try each candidate in order; first success wins.
pub fn fetch_playlist(sources: &[String], user_agent: &str) -> Result<String, FetchError> {
    for source in sources {
        match fetch_source(source, user_agent) {
            Ok(text) => return Ok(text),
            Err(e) => warn!("Playlist source {} unavailable: {}", source, e),
        }
    }
    Err(FetchError::NoSource)
}

fn download(url: &str, user_agent: &str) -> Result<String, FetchError> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(120)))
        .timeout_connect(Some(Duration::from_secs(30)))
        .build()
        .new_agent();

    let mut response = agent
        .get(url)
        .header("User-Agent", user_agent)
        .call()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if response.status() != 200 {
        return Err(FetchError::Status(response.status().as_u16()));
    }

    response
        .body_mut()
        .read_to_string()
        .map_err(|e| FetchError::Network(e.to_string()))
}
