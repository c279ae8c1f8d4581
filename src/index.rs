//! Static HTML index of mirrored feeds.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::util::escape_markup;

pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// A feed listed on the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRow {
    pub name: String,
    pub file: String,
}

/// Render the index page. `link_prefix` is the output directory relative to
/// the page, joined to each row's `file` with `/`.
pub fn build_index(
    rows: &[IndexRow],
    title: &str,
    link_prefix: &str,
    generated_at: DateTime<Utc>,
) -> Vec<u8> {
    let title = escape_markup(title);
    let items = rows
        .iter()
        .map(|row| {
            let href = escape_markup(&join_link(link_prefix, &row.file));
            format!(
                r#"<li><a href="{href}" target="_blank" rel="noopener">{name}</a> &nbsp;<code>{href}</code></li>"#,
                href = href,
                name = escape_markup(&row.name),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!doctype html>
<html lang="en"><meta charset="utf-8">
<title>{title}</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<h1>{title}</h1>
<ol>
{items}
</ol>
<p>Generated at {generated}</p>
</html>"#,
        generated = generated_at.format(GENERATED_AT_FORMAT),
    )
    .into_bytes()
}

fn join_link(prefix: &str, file: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let file = file.replace('\\', "/");
    if prefix.is_empty() {
        file
    } else {
        format!("{}/{}", prefix, file)
    }
}
