//! Build daemon response parsing.
//!
//! The daemon answers a build request in one of two shapes. Newer clients get
//! an already structured `(image id, logs)` pair; otherwise the response is a
//! sequence of JSON records, one per line, each carrying a `stream` fragment
//! of build log text. Some daemon versions coalesce every record onto a single
//! physical line, which no longer decodes line by line. That payload is
//! salvaged by pattern matching `{"stream": "..."}` objects out of the first
//! line.
//!
//! The salvage pattern assumes `stream` is the only field of every record and
//! that its text contains no escaped double quote. Records outside that shape
//! are dropped in the coalesced branch.
//!
//! The image id comes from the first fragment reading
//! `Successfully built <hex>\n`. A build that tags several images reports the
//! first id, not the last.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

static SUCCESS_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^Successfully built ([a-f0-9]+)\n$").expect("success regex is valid"));

static STREAM_RECORD_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"\{\s*"stream"\s*:\s*"[^"]*"\s*\}"#).expect("stream record regex is valid"));

/// A raw response from the build daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResponse {
  /// The daemon already extracted the result.
  Structured { image_id: Option<String>, logs: Vec<String> },

  /// Undecoded response lines, in arrival order.
  Streamed(Vec<String>),
}

/// How a streamed response is laid out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamShape {
  /// Every line decoded as a record; holds each record's `stream` text.
  Records(Vec<String>),

  /// Lines did not decode independently; holds the fragments salvaged from
  /// the first line.
  Coalesced(Vec<String>),
}

impl StreamShape {
  /// Classify streamed lines, decoding them on the way.
  pub fn detect(lines: &[String]) -> Self {
    match decode_records(lines) {
      Some(fragments) => StreamShape::Records(fragments),
      None => {
        let first = lines.first().map(String::as_str).unwrap_or_default();
        StreamShape::Coalesced(salvage_records(first))
      }
    }
  }

  pub fn fragments(&self) -> &[String] {
    match self {
      StreamShape::Records(fragments) | StreamShape::Coalesced(fragments) => fragments,
    }
  }

  pub fn into_fragments(self) -> Vec<String> {
    match self {
      StreamShape::Records(fragments) | StreamShape::Coalesced(fragments) => fragments,
    }
  }
}

/// The normalized result of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBuild {
  /// Id of the built image, `None` when the build did not succeed.
  pub image_id: Option<String>,
  /// Log fragments, for diagnostics.
  pub logs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
  #[serde(default)]
  stream: Option<String>,
}

/// Normalize a daemon response into an image id and log fragments.
pub fn parse_build_response(response: BuildResponse) -> ParsedBuild {
  match response {
    BuildResponse::Structured { image_id, logs } => ParsedBuild { image_id, logs },
    BuildResponse::Streamed(lines) => {
      let shape = StreamShape::detect(&lines);
      if let StreamShape::Coalesced(ref fragments) = shape {
        debug!(lines = lines.len(), salvaged = fragments.len(), "response was coalesced, salvaged records");
      }

      let logs = shape.into_fragments();
      let image_id = find_image_id(&logs);
      ParsedBuild { image_id, logs }
    }
  }
}

/// Decode each line as a record, or `None` if any line fails.
fn decode_records(lines: &[String]) -> Option<Vec<String>> {
  lines
    .iter()
    .map(|line| decode_record(line))
    .collect()
}

fn decode_record(text: &str) -> Option<String> {
  serde_json::from_str::<StreamRecord>(text)
    .ok()
    .map(|record| record.stream.unwrap_or_default())
}

/// Pull every `{"stream": "..."}` object out of a coalesced payload.
fn salvage_records(payload: &str) -> Vec<String> {
  STREAM_RECORD_RE
    .find_iter(payload)
    .filter_map(|m| decode_record(m.as_str()))
    .collect()
}

/// The id from the first fragment announcing a successful build.
pub fn find_image_id(fragments: &[String]) -> Option<String> {
  fragments
    .iter()
    .find_map(|fragment| SUCCESS_RE.captures(fragment).map(|c| c[1].to_string()))
}
