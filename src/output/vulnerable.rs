use ahash::AHashSet;
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::errors::HunterError;

struct Inner {
    urls: Vec<String>,
    seen: AHashSet<String>,
    sink: Option<Box<dyn Write + Send>>,
}

/// Deduplicated, discovery-ordered set of confirmed URLs shared by all workers.
///
/// The first insertion of a URL is appended to the sink and flushed while the
/// lock is still held, so the file always matches the in-memory list.
pub struct VulnerableSet {
    inner: Mutex<Inner>,
}

impl VulnerableSet {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_sink<W: Write + Send + 'static>(sink: W) -> Self {
        Self::build(Some(Box::new(sink)))
    }

    /// Create (or truncate) the per-domain output file and stream hits into it.
    pub fn create_file(path: &Path) -> Result<Self, HunterError> {
        let file = File::create(path).map_err(|source| HunterError::OutputFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::with_sink(file))
    }

    fn build(sink: Option<Box<dyn Write + Send>>) -> Self {
        Self {
            inner: Mutex::new(Inner { urls: Vec::new(), seen: AHashSet::new(), sink }),
        }
    }

    /// Returns true if `url` was not present before.
    pub fn insert(&self, url: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.seen.insert(url.to_string()) {
            return false;
        }
        inner.urls.push(url.to_string());
        if let Some(sink) = inner.sink.as_mut() {
            if let Err(e) = write_line(sink.as_mut(), url) {
                tracing::error!(error=%e, url, "failed to persist vulnerable url");
            }
        }
        true
    }

    /// URLs in the order they were first discovered.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().urls.clone()
    }
}

fn write_line(sink: &mut dyn Write, url: &str) -> std::io::Result<()> {
    sink.write_all(url.as_bytes())?;
    sink.write_all(b"\n")?;
    sink.flush()
}

impl Default for VulnerableSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn keeps_discovery_order_and_dedups() {
        let set = VulnerableSet::new();
        assert!(set.insert("http://b/?x=1"));
        assert!(set.insert("http://a/?x=1"));
        assert!(!set.insert("http://b/?x=1"));
        assert_eq!(set.snapshot(), vec!["http://b/?x=1", "http://a/?x=1"]);
    }

    #[test]
    fn file_gets_each_url_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.com.txt");
        let set = VulnerableSet::create_file(&path).unwrap();
        set.insert("http://example.com/a?x=1");
        set.insert("http://example.com/a?x=1");
        set.insert("http://example.com/b?y=1");
        // flushed on every insert, readable before the set is dropped
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "http://example.com/a?x=1\nhttp://example.com/b?y=1\n");
    }

    #[test]
    fn concurrent_inserts_never_duplicate() {
        let set = Arc::new(VulnerableSet::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = set.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        set.insert(&format!("http://h/?p={}", i % 25));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let urls = set.snapshot();
        assert_eq!(urls.len(), 25);
        let unique: AHashSet<_> = urls.iter().collect();
        assert_eq!(unique.len(), 25);
    }
}
