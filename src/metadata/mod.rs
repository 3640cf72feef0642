// Metadata extraction module

pub mod nfo;

use serde::{Deserialize, Serialize};
use crate::constants::{LEGACY_SEPARATOR, MULTI_VALUE_SEPARATOR};

pub use nfo::{parse_nfo, NfoOutcome};

/// Metadata read from a sidecar descriptor.
/// Multi-valued fields are already encoded with `encode_multi`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfoMetadata {
    pub genres: String,
    pub year: String,
    pub directors: String,
    pub plot: String,
    pub actors: String,
    pub duration: String,
    pub rating: String,
    pub poster: String,
}

impl NfoMetadata {
    pub fn is_empty(&self) -> bool {
        *self == NfoMetadata::default()
    }
}

/// Join a list of values into the stored multi-value form.
pub fn encode_multi<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(MULTI_VALUE_SEPARATOR);
        }
        out.push_str(v.as_ref());
    }
    out
}

/// Split a stored multi-value string.
///
/// Older catalogs joined values with `,`. A string containing `|` is split on `|`
/// only; anything else is split on `,`. Tokens are trimmed and empties dropped.
pub fn decode_multi(raw: &str) -> Vec<String> {
    let separator = if raw.contains(MULTI_VALUE_SEPARATOR) {
        MULTI_VALUE_SEPARATOR
    } else {
        LEGACY_SEPARATOR
    };

    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pipe_separated() {
        assert_eq!(decode_multi("Action|Comedy|Drama"), vec!["Action", "Comedy", "Drama"]);
    }

    #[test]
    fn test_decode_legacy_comma_separated() {
        assert_eq!(decode_multi("Action, Comedy ,Drama"), vec!["Action", "Comedy", "Drama"]);
    }

    #[test]
    fn test_decode_pipe_wins_over_comma() {
        // Commas inside a pipe-encoded value belong to the token
        assert_eq!(
            decode_multi("Coen, Joel|Coen, Ethan"),
            vec!["Coen, Joel", "Coen, Ethan"]
        );
    }

    #[test]
    fn test_decode_single_value() {
        assert_eq!(decode_multi("  Western "), vec!["Western"]);
    }

    #[test]
    fn test_decode_drops_empty_tokens() {
        assert_eq!(decode_multi("|Action||  |Comedy|"), vec!["Action", "Comedy"]);
        assert!(decode_multi("").is_empty());
        assert!(decode_multi(" , ,").is_empty());
    }

    #[test]
    fn test_round_trip_three_genres() {
        let genres = vec!["Horror".to_string(), "Sci-Fi".to_string(), "Thriller".to_string()];
        assert_eq!(decode_multi(&encode_multi(&genres)), genres);

        // Same list written by an older version
        assert_eq!(decode_multi(&genres.join(",")), genres);
    }

    #[test]
    fn test_encode_empty() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(encode_multi(&empty), "");
        assert_eq!(encode_multi(&["Solo"]), "Solo");
    }
}
