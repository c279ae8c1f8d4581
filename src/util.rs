//! Text helpers for the generated XML and HTML documents and log lines.

/// Drop characters that XML 1.0 does not allow anywhere in a document.
pub fn strip_invalid_xml_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c,
                '\u{0009}' | // tab
                '\u{000A}' | // newline
                '\u{000D}' | // carriage return
                '\u{0020}'..='\u{D7FF}' |
                '\u{E000}'..='\u{FFFD}' |
                '\u{10000}'..='\u{10FFFF}'
            )
        })
        .collect()
}

/// Escape text for use in element content or a quoted attribute.
/// Valid for both XML and HTML.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in strip_invalid_xml_chars(text).chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Wrap text in a CDATA section, splitting any `]]>` it contains.
pub fn cdata(text: &str) -> String {
    let body = strip_invalid_xml_chars(text).replace("]]>", "]]]]><![CDATA[>");
    format!("<![CDATA[{}]]>", body)
}

/// Render an error and all of its sources as `outer: inner: ...`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
