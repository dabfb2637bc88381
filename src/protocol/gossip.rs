//! Candidate gossip wire format
//!
//! One UTF-8 datagram per tick: `;`-separated entries, each `ip,score`.
//! The list is ordered by descending score and regenerated fresh from the
//! membership table every tick; nothing about it is persistent.

use std::fmt::Write as _;

/// Encode an ordered candidate list, e.g. `"10.0.0.2,91;10.0.0.3,77;"`.
pub fn encode_candidates(candidates: &[(String, i32)]) -> String {
    let mut out = String::new();
    for (address, score) in candidates {
        // Writing to a String cannot fail
        let _ = write!(out, "{},{};", address, score);
    }
    out
}

/// Parse a candidate datagram, preserving order.
///
/// Malformed entries are logged and skipped; the rest of the datagram is
/// still used. An empty or fully malformed datagram parses to an empty list.
pub fn parse_candidates(message: &str) -> Vec<(String, i32)> {
    let mut candidates = Vec::new();
    for entry in message.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let mut fields = entry.splitn(2, ',');
        let address = fields.next().unwrap_or_default().trim();
        let score = fields.next().and_then(|s| s.trim().parse::<i32>().ok());
        match score {
            Some(score) if !address.is_empty() => candidates.push((address.to_string(), score)),
            _ => tracing::debug!(entry, "skipping malformed gossip entry"),
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let candidates = vec![
            ("10.0.0.2".to_string(), 91),
            ("10.0.0.3".to_string(), 77),
            ("10.0.0.4".to_string(), 12),
        ];
        assert_eq!(
            encode_candidates(&candidates),
            "10.0.0.2,91;10.0.0.3,77;10.0.0.4,12;"
        );
    }

    #[test]
    fn test_parse_preserves_order() {
        let parsed = parse_candidates("10.0.0.2,91;10.0.0.3,77;10.0.0.4,12;");
        assert_eq!(
            parsed,
            vec![
                ("10.0.0.2".to_string(), 91),
                ("10.0.0.3".to_string(), 77),
                ("10.0.0.4".to_string(), 12),
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let parsed = parse_candidates("10.0.0.2,91;garbage;10.0.0.3,notanumber;,55;10.0.0.4,12");
        assert_eq!(
            parsed,
            vec![("10.0.0.2".to_string(), 91), ("10.0.0.4".to_string(), 12)]
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_candidates("").is_empty());
        assert!(parse_candidates(";;;").is_empty());
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_candidates(&[]), "");
    }
}
