//! Delimited-text (CSV-like) export and import of link lists.
//!
//! Export quotes every cell and doubles embedded quotes. Import is a
//! line-and-comma splitter: it does not understand commas or newlines inside
//! quoted fields, and it does not undo quote doubling. Only the
//! `original_url`, `expires_at` and `category` columns survive a re-import;
//! without a header they are read from the first three fields.

use chrono::NaiveDate;

use crate::types::{LinkEntry, ShortLink};

pub const EXPORT_HEADER: [&str; 7] = [
    "Original URL",
    "Short Code",
    "Short URL",
    "Clicks",
    "Created At",
    "Expires At",
    "Category",
];

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn row<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Serialize links with a header row. Rows are `\n`-separated, without a
/// trailing newline.
pub fn export_to_delimited_text(urls: &[ShortLink]) -> String {
    let mut lines = Vec::with_capacity(urls.len() + 1);
    lines.push(row(&EXPORT_HEADER));
    for url in urls {
        lines.push(row(&[
            url.original_url.as_str(),
            url.short_code.as_str(),
            url.short_url.as_str(),
            &url.clicks.to_string(),
            url.created_at.as_str(),
            url.expires_at.as_deref().unwrap_or(""),
            url.category.as_deref().unwrap_or(""),
        ]));
    }
    lines.join("\n")
}

/// Starter file for bulk import: the header plus two sample rows.
pub const IMPORT_TEMPLATE: &str = "URL,Expires At (YYYY-MM-DD),Category\n\
https://example.com/page1,,marketing\n\
https://example.com/page2,2024-12-31,campaign";

pub const IMPORT_TEMPLATE_FILE_NAME: &str = "bulk-url-template.csv";

/// File name used when saving an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("urls-export-{}.csv", date.format("%Y-%m-%d"))
}

/// File name used when saving the links created by a bulk submission.
pub fn bulk_results_file_name(date: NaiveDate) -> String {
    format!("shortened-urls-{}.csv", date.format("%Y-%m-%d"))
}

fn unquote(field: &str) -> &str {
    let field = field.trim();
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field)
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.filter(|f| !f.is_empty()).map(str::to_string)
}

/// Column positions of the importable fields.
struct Columns {
    url: usize,
    expires_at: Option<usize>,
    category: Option<usize>,
}

impl Columns {
    const POSITIONAL: Columns = Columns {
        url: 0,
        expires_at: Some(1),
        category: Some(2),
    };

    /// Locate columns by header name. A column the header does not name keeps
    /// its positional slot unless another column already claimed it. This is
    /// what lets an export be re-imported.
    fn from_header(header: &str) -> Self {
        let names: Vec<String> = header.split(',').map(|f| unquote(f).to_lowercase()).collect();
        let find = |needle: &str| names.iter().position(|n| n.contains(needle));

        let url = find("url").unwrap_or(0);
        let expires_at = find("expir").or(Some(1).filter(|&i| i != url));
        let category = find("categor").or(Some(2).filter(|&i| i != url && Some(i) != expires_at));
        Columns {
            url,
            expires_at,
            category,
        }
    }
}

/// Best-effort import. The first non-blank line is a header when it contains
/// "url" in any case. Lines whose URL field is empty are skipped.
pub fn parse_delimited_import(text: &str) -> Vec<LinkEntry> {
    let mut lines = text.split('\n').filter(|l| !l.trim().is_empty()).peekable();
    let columns = match lines.peek() {
        Some(first) if first.to_lowercase().contains("url") => {
            let header = Columns::from_header(first);
            lines.next();
            header
        }
        _ => Columns::POSITIONAL,
    };

    lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(unquote).collect();
            let field = |i: usize| fields.get(i).copied();
            let original_url = field(columns.url).filter(|u| !u.is_empty())?;
            Some(LinkEntry {
                original_url: original_url.to_string(),
                expires_at: non_empty(columns.expires_at.and_then(field)),
                category: non_empty(columns.category.and_then(field)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str, expires_at: Option<&str>, category: Option<&str>) -> ShortLink {
        ShortLink {
            id: None,
            original_url: url.to_string(),
            short_code: "c0de".to_string(),
            short_url: "http://s/c0de".to_string(),
            clicks: 7,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            expires_at: expires_at.map(str::to_string),
            category: category.map(str::to_string),
            is_expired: None,
        }
    }

    #[test]
    fn export_header_and_row() {
        let text = export_to_delimited_text(&[link("https://a.com", None, Some("mktg"))]);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            r#""Original URL","Short Code","Short URL","Clicks","Created At","Expires At","Category""#
        );
        assert_eq!(
            lines.next().unwrap(),
            r#""https://a.com","c0de","http://s/c0de","7","2024-01-01T00:00:00Z","","mktg""#
        );
        assert!(lines.next().is_none());
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn export_doubles_quotes() {
        let text = export_to_delimited_text(&[link("https://a.com", None, Some(r#"say "hi""#))]);
        assert!(text.ends_with(r#","say ""hi""""#));
    }

    #[test]
    fn export_empty_list_is_header_only() {
        assert_eq!(export_to_delimited_text(&[]).lines().count(), 1);
    }

    #[test]
    fn import_with_header() {
        let entries = parse_delimited_import("URL,Expires At,Category\nhttps://a.com,,mktg\n");
        assert_eq!(
            entries,
            vec![LinkEntry {
                original_url: "https://a.com".to_string(),
                expires_at: None,
                category: Some("mktg".to_string()),
            }]
        );
    }

    #[test]
    fn import_without_header() {
        let entries = parse_delimited_import("https://a.com,2024-12-31,\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].expires_at.as_deref(), Some("2024-12-31"));
        assert!(entries[0].category.is_none());
    }

    #[test]
    fn import_skips_blank_lines_and_empty_urls() {
        let entries = parse_delimited_import("\n  \n,2024-01-01,x\nhttps://b.com\r\n\n");
        assert_eq!(entries, vec![LinkEntry::new("https://b.com")]);
    }

    #[test]
    fn import_header_only_or_empty() {
        assert!(parse_delimited_import("Original URL\n").is_empty());
        assert!(parse_delimited_import("").is_empty());
    }

    #[test]
    fn import_does_not_split_quoted_commas_correctly() {
        let entries = parse_delimited_import("\"https://a.com\",\"2030-01-01\",\"a,b\"\n");
        assert_eq!(entries[0].category.as_deref(), Some("a"));
    }

    #[test]
    fn export_then_import_keeps_entry_fields() {
        let links = vec![
            link("https://a.com/x?y=1", Some("2030-05-01"), Some("mktg")),
            link("https://b.com", None, None),
            link("https://c.com", None, Some("ops")),
        ];
        let entries = parse_delimited_import(&export_to_delimited_text(&links));
        assert_eq!(entries.len(), links.len());
        for (entry, link) in entries.iter().zip(&links) {
            assert_eq!(entry.original_url, link.original_url);
            assert_eq!(entry.expires_at, link.expires_at);
            assert_eq!(entry.category, link.category);
        }
    }

    #[test]
    fn import_header_columns_in_any_order() {
        let entries = parse_delimited_import("category,link url\nops,https://a.com\n");
        assert_eq!(entries[0].original_url, "https://a.com");
        assert_eq!(entries[0].category.as_deref(), Some("ops"));
        assert!(entries[0].expires_at.is_none());
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "urls-export-2024-03-09.csv");
        assert_eq!(bulk_results_file_name(date), "shortened-urls-2024-03-09.csv");
    }

    #[test]
    fn import_template_parses_to_its_sample_rows() {
        let entries = parse_delimited_import(IMPORT_TEMPLATE);
        assert_eq!(
            entries,
            vec![
                LinkEntry {
                    original_url: "https://example.com/page1".to_string(),
                    expires_at: None,
                    category: Some("marketing".to_string()),
                },
                LinkEntry {
                    original_url: "https://example.com/page2".to_string(),
                    expires_at: Some("2024-12-31".to_string()),
                    category: Some("campaign".to_string()),
                },
            ]
        );
    }
}
