//! M3U playlist parser
//!
//! Fail-soft by design: playlists are best-effort content, so malformed
//! input never errors out, it just yields fewer channels.

use crate::models::Channel;

/// Injectable channel-id generator so tests can assert exact ids.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Default id source: per-parse sequential counter. Ids are regenerated
/// on every parse, so they are only meaningful within one catalog
/// generation.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: u64,
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("ch-{}", self.counter)
    }
}

/// Parse M3U content and extract channels in encounter order.
///
/// Walks lines keeping at most one pending `#EXTINF` entry; a URL line
/// terminates it into a finished channel. A URL with no pending entry
/// still produces a placeholder channel rather than dropping the stream.
/// A pending entry never followed by a URL is discarded.
pub fn parse_channels(content: &str, ids: &mut dyn IdSource) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(info) = extinf_payload(line) {
            // New marker discards any unterminated previous entry
            pending = Some(PendingEntry::from_extinf(info));
        } else if !line.starts_with('#') {
            // URL line terminates the pending entry
            let entry = pending.take().unwrap_or_else(|| PendingEntry {
                name: format!("Stream {}", channels.len() + 1),
                logo: None,
                category: Some("Other".to_string()),
            });
            channels.push(Channel {
                id: ids.next_id(),
                name: entry.name,
                url: line.to_string(),
                logo: entry.logo,
                category: entry.category,
            });
        }
        // Other '#' comment lines are skipped
    }

    channels
}

struct PendingEntry {
    name: String,
    logo: Option<String>,
    category: Option<String>,
}

impl PendingEntry {
    fn from_extinf(info: &str) -> Self {
        // Display name is everything after the last comma
        let name = match info.rfind(',') {
            Some(pos) => {
                let trimmed = info[pos + 1..].trim();
                if trimmed.is_empty() {
                    "Unknown".to_string()
                } else {
                    trimmed.to_string()
                }
            }
            None => "Unknown".to_string(),
        };

        Self {
            name,
            logo: extract_quoted_attr(info, "tvg-logo")
                .or_else(|| extract_quoted_attr(info, "logo")),
            category: extract_quoted_attr(info, "group-title")
                .or_else(|| extract_quoted_attr(info, "category")),
        }
    }
}

/// Payload of an entry-metadata line, tolerating case variations and the
/// malformed hashless `EXTINF:` some real playlists contain.
fn extinf_payload(line: &str) -> Option<&str> {
    let body = line.strip_prefix('#').unwrap_or(line);
    if body.len() >= 7 && body.as_bytes()[..7].eq_ignore_ascii_case(b"extinf:") {
        Some(&body[7..])
    } else {
        None
    }
}

/// Extract a quoted `key="value"` attribute, case-insensitive on the key.
/// Byte-window search keeps offsets valid even when surrounding text is
/// multibyte (a window can only match the ASCII pattern if it is ASCII
/// itself).
fn extract_quoted_attr(line: &str, key: &str) -> Option<String> {
    let pattern = format!("{}=\"", key);
    let start = line
        .as_bytes()
        .windows(pattern.len())
        .position(|window| window.eq_ignore_ascii_case(pattern.as_bytes()))?;
    let rest = &line[start + pattern.len()..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
#[path = "m3u_parser_tests.rs"]
mod tests;
