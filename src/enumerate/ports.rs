use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ports probed when the caller gives no port spec.
pub const DEFAULT_PORTS: &[u16] = &[22, 80, 443, 3306, 3389, 8080];

/// Parse a port spec into an ordered list of TCP ports.
///
/// Supported tokens, separated by commas or newlines:
/// - single port number: `80`
/// - inclusive range: `8000-8010`
/// - comments: everything after `#` on a line is ignored
///
/// Tokens that do not parse, zero, values above 65535 and inverted ranges are
/// skipped without error. Duplicates are kept.
pub fn parse_port_spec(s: &str) -> Vec<u16> {
    let mut out: Vec<u16> = Vec::new();

    for raw_line in s.lines() {
        let line = raw_line.split('#').next().unwrap_or("");
        for token in line.split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }

            // Range `start-end`
            if let Some((a, b)) = token.split_once('-') {
                let (Some(start), Some(end)) = (parse_port(a.trim()), parse_port(b.trim())) else {
                    continue;
                };
                out.extend(start..=end);
                continue;
            }

            if let Some(p) = parse_port(token) {
                out.push(p);
            }
        }
    }

    out
}

/// Load a port spec from a file path. Errors only if the file cannot be read.
pub fn load_port_spec(path: impl AsRef<Path>) -> Result<Vec<u16>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read ports file: {}", path.as_ref().display()))?;
    Ok(parse_port_spec(&content))
}

pub fn default_ports() -> Vec<u16> {
    DEFAULT_PORTS.to_vec()
}

fn parse_port(s: &str) -> Option<u16> {
    match s.parse::<u32>() {
        Ok(val) if (1..=65535).contains(&val) => Some(val as u16),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_singles_and_ranges_in_order() {
        assert_eq!(
            parse_port_spec("22,80,8000-8002"),
            vec![22, 80, 8000, 8001, 8002]
        );
    }

    #[test]
    fn duplicates_are_kept() {
        assert_eq!(parse_port_spec("80,80,79-80"), vec![80, 80, 79, 80]);
    }

    #[test]
    fn bad_tokens_are_skipped() {
        let ports = parse_port_spec("abc, 0, -5, 70000, 443, 10-5, 1-x, 21 ");
        assert_eq!(ports, vec![443, 21]);
    }

    #[test]
    fn parse_with_comments_and_newlines() {
        let input = r#"
            # common web ports
            80  # http
            443,8443 # https
            8000-8002   # dev servers

        "#;
        assert_eq!(parse_port_spec(input), vec![80, 443, 8443, 8000, 8001, 8002]);
    }

    #[test]
    fn range_ending_at_top_port_terminates() {
        let ports = parse_port_spec("65534-65535");
        assert_eq!(ports, vec![65534, 65535]);
    }

    #[test]
    fn empty_spec_is_empty() {
        assert!(parse_port_spec("").is_empty());
        assert!(parse_port_spec(" , ,").is_empty());
    }

    #[test]
    fn default_has_common_ports() {
        let d = default_ports();
        assert!(d.contains(&22) && d.contains(&443));
    }
}
