//! Canonicalization of archived URLs into probe candidates.

use ahash::AHashSet;
use std::collections::BTreeSet;
use std::fmt;
use url::{form_urlencoded, Url};

/// A normalized URL ready for probing.
///
/// Only [`Normalizer`] builds these, so every value has at least one query
/// parameter, no static-asset extension and the placeholder as every value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateUrl(String);

impl CandidateUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CandidateUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub struct Normalizer {
    extensions: AHashSet<String>,
    placeholder: String,
}

impl Normalizer {
    /// `extensions` may be given with or without the leading dot, in any case.
    pub fn new<I, S>(extensions: I, placeholder: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| {
                let e = e.as_ref().trim().to_lowercase();
                if e.starts_with('.') { e } else { format!(".{}", e) }
            })
            .collect();
        Self { extensions, placeholder: placeholder.into() }
    }

    pub fn is_static_asset(&self, url: &Url) -> bool {
        path_extension(url.path())
            .map(|ext| self.extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Normalize a single raw URL. Returns `None` for anything that is not a probe candidate.
    pub fn normalize(&self, raw: &str) -> Option<CandidateUrl> {
        let mut url = Url::parse(raw.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return None;
        }
        if self.is_static_asset(&url) {
            return None;
        }
        strip_default_port(&mut url);

        let mut seen = AHashSet::new();
        let mut keys: Vec<String> = Vec::new();
        for (k, v) in url.query_pairs() {
            // blank values and bare keys are not parameters
            if k.is_empty() || v.is_empty() {
                continue;
            }
            if seen.insert(k.to_string()) {
                keys.push(k.into_owned());
            }
        }
        if keys.is_empty() {
            return None;
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(keys.iter().map(|k| (k.as_str(), self.placeholder.as_str())))
            .finish();
        url.set_query(Some(query.as_str()));
        url.set_fragment(None);
        Some(CandidateUrl(url.into()))
    }

    /// Normalize a batch, dropping rejects and duplicates. Output is sorted.
    pub fn normalize_all<I, S>(&self, raws: I) -> Vec<CandidateUrl>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raws.into_iter()
            .filter_map(|raw| self.normalize(raw.as_ref()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Lowercased extension of the last path segment, including the dot.
fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    match segment.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(segment[idx..].to_lowercase()),
    }
}

fn strip_default_port(url: &mut Url) {
    let default = match url.scheme() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    if url.port().is_some() && url.port() == default {
        let _ = url.set_port(None);
    }
}
