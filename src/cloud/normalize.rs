//! cloud::normalize
//!
//! Canonical repository identity used to match cloud records.
//!
//! Every remote URL form of the same repository normalizes to the same
//! `host/owner/repo` string:
//!
//! ```
//! use stackpick::cloud::{normalize_git_uri, NormalizedRepo};
//!
//! let want = NormalizedRepo::Remote("github.com/acme/infra".to_string());
//! assert_eq!(normalize_git_uri("git@github.com:acme/infra.git"), want);
//! assert_eq!(normalize_git_uri("https://github.com/acme/infra"), want);
//! assert_eq!(normalize_git_uri("/srv/git/infra.git"), NormalizedRepo::Local);
//! ```

/// Normalized repository of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedRepo {
    /// A hosted repository, as `host/owner/repo`.
    Remote(String),
    /// A filesystem remote, or no remote at all.
    Local,
}

impl NormalizedRepo {
    /// The `host/owner/repo` string of a hosted repository.
    pub fn as_remote(&self) -> Option<&str> {
        match self {
            NormalizedRepo::Remote(repo) => Some(repo),
            NormalizedRepo::Local => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, NormalizedRepo::Local)
    }
}

impl std::fmt::Display for NormalizedRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizedRepo::Remote(repo) => f.write_str(repo),
            NormalizedRepo::Local => f.write_str("local"),
        }
    }
}

/// Normalize a git remote URL.
///
/// Scheme, user info, port and the `.git` suffix are dropped and the host is
/// lowercased. Filesystem paths (absolute, relative, `file://`) are
/// [`NormalizedRepo::Local`].
pub fn normalize_git_uri(raw: &str) -> NormalizedRepo {
    let url = raw.trim();
    if url.is_empty() || url.starts_with("file://") || is_filesystem_path(url) {
        return NormalizedRepo::Local;
    }

    // scheme://[user@]host[:port]/path
    if let Some((_, rest)) = url.split_once("://") {
        return match rest.split_once('/') {
            Some((authority, path)) => hosted(authority, path),
            None => NormalizedRepo::Local,
        };
    }

    // [user@]host:path
    if let Some((authority, path)) = url.split_once(':') {
        if !authority.contains('/') {
            return hosted(authority, path);
        }
    }

    // host/path without a scheme
    match url.split_once('/') {
        Some((host, path)) if host.contains('.') && !host.starts_with('.') => hosted(host, path),
        _ => NormalizedRepo::Local,
    }
}

fn is_filesystem_path(url: &str) -> bool {
    if url.starts_with('/') || url.starts_with('.') || url.starts_with('~') {
        return true;
    }
    // Windows drive letters: C:\repo, C:/repo
    let bytes = url.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'\\' || bytes[2] == b'/')
}

fn hosted(authority: &str, path: &str) -> NormalizedRepo {
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    let host = match host.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => host,
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path).trim_end_matches('/');

    if host.is_empty() || path.is_empty() {
        return NormalizedRepo::Local;
    }
    NormalizedRepo::Remote(format!("{}/{}", host.to_ascii_lowercase(), path))
}
