//! Advisory on-disk copy of the link list, plus list-view filtering.
//!
//! The cache only makes the list show up before the backend answers. It is
//! never authoritative: every successful fetch overwrites it wholesale and
//! there is no merge with concurrent server-side changes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::types::ShortLink;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct LinkCache {
    path: PathBuf,
    links: Vec<ShortLink>,
}

impl LinkCache {
    /// Read the cache at `path`. A missing or unreadable file yields an
    /// empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let links = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "discarding corrupt link cache");
                Vec::new()
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(error) => {
                warn!(path = %path.display(), %error, "could not read link cache");
                Vec::new()
            }
        };
        Self { path, links }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn links(&self) -> &[ShortLink] {
        &self.links
    }

    /// Cached links with the expiry flag recomputed as of `now`; the stored
    /// flag reflects when the cache was written.
    pub fn links_at(&self, now: DateTime<Utc>) -> Vec<ShortLink> {
        let mut links = self.links.clone();
        for link in &mut links {
            link.mark_expired(now);
        }
        links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Overwrite with a fresh fetch, overlaying the expiry flag as of `now`.
    pub fn replace(&mut self, mut links: Vec<ShortLink>, now: DateTime<Utc>) {
        for link in &mut links {
            link.mark_expired(now);
        }
        self.links = links;
    }

    /// Drop a record after the backend confirmed its deletion. Returns
    /// whether anything was removed.
    pub fn remove(&mut self, short_code: &str) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.short_code != short_code);
        self.links.len() != before
    }

    /// Persist via a temporary sibling file and a rename.
    pub fn save(&self) -> Result<(), CacheError> {
        let raw = serde_json::to_string(&self.links)?;
        let tmp = self.path.with_extension("tmp");
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| CacheError::Io { path, source }
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::write(&tmp, raw).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(io_err(&self.path))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Expired,
}

/// Narrowing applied by the list view. `category: None` means all.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub category: Option<String>,
    pub status: StatusFilter,
}

impl LinkFilter {
    pub fn matches(&self, link: &ShortLink) -> bool {
        let category_ok = match &self.category {
            None => true,
            Some(c) => link.category.as_deref() == Some(c.as_str()),
        };
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !link.expired(),
            StatusFilter::Expired => link.expired(),
        };
        category_ok && status_ok
    }

    pub fn apply<'a>(&self, links: &'a [ShortLink]) -> Vec<&'a ShortLink> {
        links.iter().filter(|l| self.matches(l)).collect()
    }
}

/// Unique non-empty categories in first-seen order.
pub fn distinct_categories(links: &[ShortLink]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in links.iter().filter_map(|l| l.category.as_deref()) {
        if !category.is_empty() && !seen.iter().any(|s| s == category) {
            seen.push(category.to_string());
        }
    }
    seen
}
