//! In-memory link store with the example backend's rules.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CODE_LEN: usize = 7;
const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const RECENT_CLICKS: usize = 10;
const MAX_URL_LEN: usize = 2048;

pub const INVALID_URL: &str = "Invalid URL";
pub const INVALID_EXPIRATION: &str = "Invalid expiration date";
pub const NOT_FOUND: &str = "URL not found";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub clicks: u64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    pub timestamp: String,
    pub ip_address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub total_clicks: u64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub recent_clicks: Vec<Click>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLink {
    pub original_url: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Redirect {
    To(String),
    Expired,
    Missing,
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

fn valid_url(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("https://").or_else(|| s.strip_prefix("http://")) else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    s.len() <= MAX_URL_LEN && !host.is_empty() && !s.chars().any(char::is_whitespace)
}

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Validate an expiration; it may not fall on a day before today.
pub fn check_expiration(expires_at: Option<String>) -> Result<Option<String>, &'static str> {
    let Some(raw) = blank_to_none(expires_at) else {
        return Ok(None);
    };
    match parse_timestamp(&raw) {
        Some(ts) if ts.date_naive() >= Utc::now().date_naive() => Ok(Some(raw)),
        _ => Err(INVALID_EXPIRATION),
    }
}

fn is_expired(link: &Link) -> bool {
    link.expires_at
        .as_deref()
        .and_then(parse_timestamp)
        .is_some_and(|ts| ts < Utc::now())
}

#[derive(Debug)]
struct Entry {
    link: Link,
    clicks: Vec<Click>,
}

/// Links keyed by short code; `order` keeps insertion order for listings.
#[derive(Debug)]
pub struct Store {
    public_base_url: String,
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl Store {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn fresh_code(&self) -> String {
        loop {
            let mut n = Uuid::new_v4().as_u128();
            let code: String = (0..CODE_LEN)
                .map(|_| {
                    let c = BASE62[(n % 62) as usize] as char;
                    n /= 62;
                    c
                })
                .collect();
            if !self.entries.contains_key(&code) {
                return code;
            }
        }
    }

    pub fn create(&mut self, input: NewLink) -> Result<Link, &'static str> {
        let original_url = input.original_url.trim().to_string();
        if !valid_url(&original_url) {
            return Err(INVALID_URL);
        }
        let expires_at = check_expiration(input.expires_at)?;
        let short_code = self.fresh_code();
        let link = Link {
            id: Uuid::new_v4(),
            short_url: format!("{}/{short_code}", self.public_base_url),
            original_url,
            short_code: short_code.clone(),
            clicks: 0,
            created_at: now_rfc3339(),
            expires_at,
            category: blank_to_none(input.category),
        };
        self.order.push(short_code.clone());
        self.entries.insert(
            short_code,
            Entry {
                link: link.clone(),
                clicks: Vec::new(),
            },
        );
        Ok(link)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Link> {
        self.order
            .iter()
            .rev()
            .filter_map(|code| self.entries.get(code))
            .map(|e| e.link.clone())
            .collect()
    }

    pub fn list_by_category(&self, category: &str) -> Vec<Link> {
        self.list()
            .into_iter()
            .filter(|l| l.category.as_deref() == Some(category))
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .entries
            .values()
            .filter_map(|e| e.link.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn get(&self, short_code: &str) -> Option<&Link> {
        self.entries.get(short_code).map(|e| &e.link)
    }

    pub fn delete(&mut self, short_code: &str) -> bool {
        if self.entries.remove(short_code).is_none() {
            return false;
        }
        self.order.retain(|c| c != short_code);
        true
    }

    pub fn set_expiration(
        &mut self,
        short_code: &str,
        expires_at: Option<String>,
    ) -> Result<(), &'static str> {
        let entry = self.entries.get_mut(short_code).ok_or(NOT_FOUND)?;
        entry.link.expires_at = check_expiration(expires_at)?;
        Ok(())
    }

    pub fn analytics(&self, short_code: &str) -> Option<Analytics> {
        let entry = self.entries.get(short_code)?;
        let link = &entry.link;
        Some(Analytics {
            original_url: link.original_url.clone(),
            short_code: link.short_code.clone(),
            short_url: link.short_url.clone(),
            total_clicks: link.clicks,
            created_at: link.created_at.clone(),
            expires_at: link.expires_at.clone(),
            recent_clicks: entry.clicks.iter().rev().take(RECENT_CLICKS).cloned().collect(),
        })
    }

    /// Resolve a visit, counting the click when the link is live.
    pub fn visit(&mut self, short_code: &str, ip_address: &str) -> Redirect {
        let Some(entry) = self.entries.get_mut(short_code) else {
            return Redirect::Missing;
        };
        if is_expired(&entry.link) {
            return Redirect::Expired;
        }
        entry.link.clicks += 1;
        entry.clicks.push(Click {
            timestamp: now_rfc3339(),
            ip_address: ip_address.to_string(),
        });
        Redirect::To(entry.link.original_url.clone())
    }
}
