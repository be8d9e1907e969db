//! Static file resolution.
//!
//! # Responsibilities
//! - Map a request path to a resource key under the static root
//! - Search the configured directories in order
//! - Read the whole file and pick its content type
//!
//! # Design Decisions
//! - `/` aliases the default document
//! - First readable regular file wins; directories are skipped
//! - Keys that would leave a search directory resolve to not-found
//! - Content type comes from the resource key, not the request path

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::StaticFilesConfig;
use crate::http::mime::mime_type;

/// Document served for `/`.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// A resolved file, fully read into memory.
#[derive(Debug, Clone)]
pub struct StaticFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub source: PathBuf,
}

/// Read-only view of the static resource root, shared by every connection.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: Option<String>,
    search_path: Vec<PathBuf>,
}

impl StaticFiles {
    /// `root` is the folder prefix ("static"); a leading slash is dropped and
    /// a blank root serves bare request paths.
    pub fn new<I, P>(root: &str, search_path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let trimmed = root.trim().trim_start_matches('/').trim_end_matches('/');
        Self {
            root: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            search_path: search_path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &StaticFilesConfig) -> Self {
        Self::new(&config.root, &config.search_path)
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Lookup key for a request path: root joined with the path, minus the
    /// leading slash.
    pub fn resource_key(&self, request_path: &str) -> String {
        let name = if request_path == "/" {
            DEFAULT_DOCUMENT
        } else {
            request_path.strip_prefix('/').unwrap_or(request_path)
        };
        match &self.root {
            Some(root) => format!("{}/{}", root, name),
            None => name.to_string(),
        }
    }

    /// Resolve a request path, or `None` when no source has the file.
    pub async fn resolve(&self, request_path: &str) -> Option<StaticFile> {
        let key = self.resource_key(request_path);
        let relative = match confine(&key) {
            Some(relative) => relative,
            None => {
                tracing::debug!(key = %key, "Rejected resource key outside the static root");
                return None;
            }
        };

        for base in &self.search_path {
            let candidate = base.join(&relative);
            match read_regular_file(&candidate).await {
                Ok(Some(bytes)) => {
                    tracing::trace!(path = %candidate.display(), bytes = bytes.len(), "Static file resolved");
                    return Some(StaticFile {
                        bytes,
                        content_type: mime_type(&key),
                        source: candidate,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(path = %candidate.display(), error = %e, "Static file unreadable");
                }
            }
        }
        None
    }
}

/// Turn a key into a relative path made only of normal components.
fn confine(key: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(key).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(relative)
}

async fn read_regular_file(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if !metadata.is_file() {
        return Ok(None);
    }
    tokio::fs::read(path).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FIXTURE_SEQ: AtomicUsize = AtomicUsize::new(0);

    /// Fresh directory under the system temp dir.
    fn fixture_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "appserve-static-{}-{}",
            std::process::id(),
            FIXTURE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(dir.join("static/nested")).unwrap();
        dir
    }

    #[test]
    fn keys_follow_root_and_default_document() {
        let files = StaticFiles::new("/static", ["resources"]);
        assert_eq!(files.root(), Some("static"));
        assert_eq!(files.resource_key("/"), "static/index.html");
        assert_eq!(files.resource_key("/css/site.css"), "static/css/site.css");

        let bare = StaticFiles::new("  ", ["resources"]);
        assert_eq!(bare.root(), None);
        assert_eq!(bare.resource_key("/"), "index.html");
        assert_eq!(bare.resource_key("/code.js"), "code.js");
    }

    #[tokio::test]
    async fn resolves_index_for_root_path() {
        let dir = fixture_dir();
        std::fs::write(dir.join("static/index.html"), "<h1>hi</h1>").unwrap();
        let files = StaticFiles::new("static", [&dir]);

        let index = files.resolve("/").await.unwrap();
        assert_eq!(index.bytes, b"<h1>hi</h1>");
        assert_eq!(index.content_type, "text/html");
        assert_eq!(files.resolve("/index.html").await.unwrap().bytes, index.bytes);
    }

    #[tokio::test]
    async fn first_source_wins_and_later_sources_are_fallbacks() {
        let first = fixture_dir();
        let second = fixture_dir();
        std::fs::write(first.join("static/code.js"), "first").unwrap();
        std::fs::write(second.join("static/code.js"), "second").unwrap();
        std::fs::write(second.join("static/nested/styles.css"), "body{}").unwrap();
        let files = StaticFiles::new("static", [&first, &second]);

        let js = files.resolve("/code.js").await.unwrap();
        assert_eq!(js.bytes, b"first");
        assert_eq!(js.content_type, "application/javascript");

        let css = files.resolve("/nested/styles.css").await.unwrap();
        assert_eq!(css.bytes, b"body{}");
        assert_eq!(css.content_type, "text/css");
        assert!(css.source.starts_with(&second));
    }

    #[tokio::test]
    async fn directories_and_missing_files_are_not_found() {
        let dir = fixture_dir();
        let files = StaticFiles::new("static", [&dir]);
        assert!(files.resolve("/nested").await.is_none());
        assert!(files.resolve("/eci.com").await.is_none());
    }

    #[tokio::test]
    async fn traversal_is_not_found() {
        let dir = fixture_dir();
        std::fs::write(dir.join("secret.txt"), "nope").unwrap();
        let files = StaticFiles::new("static", [&dir]);
        assert!(files.resolve("/../secret.txt").await.is_none());
    }

    #[tokio::test]
    async fn unknown_extension_is_octet_stream() {
        let dir = fixture_dir();
        std::fs::write(dir.join("static/data.bin"), [0u8, 1, 2]).unwrap();
        let files = StaticFiles::new("static", [&dir]);
        let file = files.resolve("/data.bin").await.unwrap();
        assert_eq!(file.content_type, "application/octet-stream");
        assert_eq!(file.bytes, vec![0, 1, 2]);
    }
}
