//! Watch-list resolution.
//!
//! The configured `paths` list mixes three kinds of entry: literal
//! notification paths, remote URLs expected to return a JSON array of
//! paths, and `restart:` directives. Resolution flattens the list into
//! a deduplicated watch set plus the separate set of restart paths.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, trace};

/// Prefix marking an entry as a restart directive rather than a path.
pub const RESTART_PREFIX: &str = "restart:";

/// Fetches a remote watch-list URL and returns the paths it lists.
///
/// Implemented by the host client; resolution only cares about the
/// three-way outcome below.
#[async_trait]
pub trait PathExpander: Send + Sync {
    async fn expand(&self, url: &str) -> Result<Vec<String>, ExpandError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// The bearer token was missing or rejected. This aborts the whole
    /// resolution rather than degrading it.
    #[error("authorization rejected")]
    Unauthorized,

    #[error("fetch failed: {0}")]
    Http(String),

    #[error("malformed watch list: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("remote watch-list fetch refused authorization: {url}")]
    Unauthorized { url: String },
}

/// The outcome of resolving a mixed watch list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Deduplicated notification paths to watch. Restart directives never
    /// appear here.
    pub watch: BTreeSet<String>,
    /// Paths whose events trigger a restart instead of dispatch.
    pub restart: BTreeSet<String>,
    /// One entry per remote URL that failed softly.
    pub warnings: Vec<String>,
}

fn is_remote(entry: &str) -> bool {
    entry.starts_with("http://") || entry.starts_with("https://")
}

/// Resolve the configured entries into watch and restart sets.
///
/// A single bad entry never fails the whole resolution: remote fetch
/// failures (other than an authorization rejection) shrink the watch set
/// and surface as warnings, and unrecognized colon-qualified entries are
/// dropped silently.
pub async fn resolve(
    entries: &[String],
    expander: &dyn PathExpander,
) -> Result<ResolvedPaths, ResolveError> {
    let mut resolved = ResolvedPaths::default();

    for entry in entries {
        if let Some(path) = entry.strip_prefix(RESTART_PREFIX) {
            resolved.restart.insert(path.to_string());
        } else if is_remote(entry) {
            match expander.expand(entry).await {
                Ok(paths) => {
                    for path in paths {
                        resolved.watch.insert(path);
                    }
                }
                Err(ExpandError::Unauthorized) => {
                    return Err(ResolveError::Unauthorized { url: entry.clone() });
                }
                Err(e) => {
                    debug!(url = %entry, error = %e, "remote watch-list entry skipped");
                    resolved.warnings.push(format!("{entry}: {e}"));
                }
            }
        } else if entry.contains(':') {
            // Not a restart directive and not a URL: not a valid path.
            trace!(entry = %entry, "dropping colon-qualified entry");
        } else {
            resolved.watch.insert(entry.clone());
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Expander over a fixed url -> result table.
    struct TableExpander(HashMap<String, Result<Vec<String>, ExpandError>>);

    #[async_trait]
    impl PathExpander for TableExpander {
        async fn expand(&self, url: &str) -> Result<Vec<String>, ExpandError> {
            self.0
                .get(url)
                .cloned()
                .unwrap_or(Err(ExpandError::Http("no route".into())))
        }
    }

    fn no_remote() -> TableExpander {
        TableExpander(HashMap::new())
    }

    fn entries(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_mixed_list_partitions_into_watch_and_restart() {
        let resolved = resolve(
            &entries(&["restart:notifications.x", "a.b.c", "bogus:value"]),
            &no_remote(),
        )
        .await
        .unwrap();

        assert_eq!(resolved.watch, BTreeSet::from(["a.b.c".to_string()]));
        assert_eq!(
            resolved.restart,
            BTreeSet::from(["notifications.x".to_string()])
        );
        assert!(resolved.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_remote_entries_expand_and_dedup() {
        let expander = TableExpander(HashMap::from([(
            "https://example.com/paths".to_string(),
            Ok(vec!["a.b.c".to_string(), "d.e.f".to_string()]),
        )]));

        let resolved = resolve(
            &entries(&["a.b.c", "https://example.com/paths"]),
            &expander,
        )
        .await
        .unwrap();

        assert_eq!(
            resolved.watch,
            BTreeSet::from(["a.b.c".to_string(), "d.e.f".to_string()])
        );
    }

    #[tokio::test]
    async fn test_remote_failure_degrades_with_warning() {
        let expander = TableExpander(HashMap::from([(
            "https://example.com/paths".to_string(),
            Err(ExpandError::Http("503".into())),
        )]));

        let resolved = resolve(
            &entries(&["https://example.com/paths", "a.b.c"]),
            &expander,
        )
        .await
        .unwrap();

        assert_eq!(resolved.watch, BTreeSet::from(["a.b.c".to_string()]));
        assert_eq!(resolved.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_fails_hard() {
        let expander = TableExpander(HashMap::from([(
            "https://example.com/paths".to_string(),
            Err(ExpandError::Unauthorized),
        )]));

        let err = resolve(
            &entries(&["a.b.c", "https://example.com/paths"]),
            &expander,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            ResolveError::Unauthorized {
                url: "https://example.com/paths".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_watch_set_has_no_duplicates() {
        let resolved = resolve(&entries(&["a.b.c", "a.b.c", "a.b.c"]), &no_remote())
            .await
            .unwrap();
        assert_eq!(resolved.watch.len(), 1);
    }
}
