use std::fs;
use std::path::Path;

use tracing::{debug, warn};

/// Paths tried against a web server when no wordlist file is given.
pub const DEFAULT_PATHS: &[&str] = &[
    "admin", "api", "backup", "config", "dashboard", "login", "phpmyadmin", "wp-admin",
    "wp-content", "wp-includes", ".env", ".git", ".htaccess", "robots.txt", "sitemap.xml",
    "api/v1", "api/v2", "swagger", "docs", "test", "dev",
];

/// Subdomain labels tried when no wordlist file is given.
pub const DEFAULT_SUBDOMAINS: &[&str] = &[
    "www", "mail", "ftp", "admin", "blog", "shop", "api", "dev", "test", "staging", "demo",
    "portal", "remote", "vpn", "dns", "mx", "smtp", "pop", "imap", "ns1", "ns2", "git", "svn",
    "cvs", "webmail", "secure", "support", "docs", "wiki", "forum", "news", "mail2", "mx1", "mx2",
    "ldap", "db", "mysql", "postgres", "redis", "mongo", "jenkins", "gitlab", "github", "docker",
    "kubernetes", "grafana", "prometheus", "elastic", "kibana", "logstash", "nagios", "zabbix",
    "cacti", "backup", "archive",
];

/// One word per trimmed, non-empty line; lines starting with `#` are comments.
pub fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty() && !w.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Read a wordlist file, or fall back to `default` when no path is given or the
/// file cannot be read. Never fails.
pub fn load_wordlist(path: Option<&Path>, default: &[&str]) -> Vec<String> {
    let Some(path) = path else {
        return owned_words(default);
    };
    match fs::read_to_string(path) {
        Ok(content) => {
            let words = parse_wordlist(&content);
            debug!(path = %path.display(), count = words.len(), "loaded wordlist");
            words
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "wordlist unreadable, using built-in list");
            owned_words(default)
        }
    }
}

fn owned_words(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}
