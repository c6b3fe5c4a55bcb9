/// Table formatting for links and analytics using comfy-table

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use shortlink_core::{AnalyticsSummary, ShortLink};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Format links in the order given, one row each.
pub fn format_links_table(links: &[&ShortLink]) -> String {
    if links.is_empty() {
        return "No links found".to_string();
    }

    let mut table = new_table();
    table.set_header(vec![
        "Short URL",
        "Original URL",
        "Clicks",
        "Created",
        "Expires",
        "Category",
        "Status",
    ]);

    for link in links {
        let status = if link.expired() { "expired" } else { "active" };
        table.add_row(vec![
            Cell::new(&link.short_url),
            Cell::new(&link.original_url),
            Cell::new(link.clicks),
            Cell::new(&link.created_at),
            Cell::new(or_dash(link.expires_at.as_deref())),
            Cell::new(or_dash(link.category.as_deref())),
            Cell::new(status),
        ]);
    }

    table.to_string()
}

/// Summary block followed by the recent clicks, newest first.
pub fn format_analytics(summary: &AnalyticsSummary) -> String {
    let mut out = format!(
        "{}\n  original: {}\n  clicks:   {}\n  created:  {}\n  expires:  {}\n",
        summary.short_url,
        summary.original_url,
        summary.total_clicks,
        summary.created_at,
        or_dash(summary.expires_at.as_deref()),
    );

    if summary.recent_clicks.is_empty() {
        out.push_str("\nNo clicks recorded");
        return out;
    }

    let mut table = new_table();
    table.set_header(vec!["Time", "Address"]);
    for click in &summary.recent_clicks {
        table.add_row(vec![Cell::new(&click.timestamp), Cell::new(&click.ip_address)]);
    }
    out.push('\n');
    out.push_str(&table.to_string());
    out
}
