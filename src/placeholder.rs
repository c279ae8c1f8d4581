//! Stand-in feed written when a source cannot be fetched.

use chrono::{DateTime, Utc};

use crate::util::{cdata, escape_markup};

/// RFC-822 style timestamp used for `pubDate`.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Build a one-item RSS 2.0 document announcing that `name` could not be
/// mirrored from `source`. The error text lands verbatim in the item's
/// CDATA description.
pub fn placeholder(name: &str, source: &str, error: &str, now: DateTime<Utc>) -> Vec<u8> {
    let name = escape_markup(name);
    let link = escape_markup(source);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>{name} (mirror error)</title>
    <link>{link}</link>
    <description>Failed to fetch source: {escaped_error}</description>
    <item>
      <title>Mirror unavailable</title>
      <link>{link}</link>
      <description>{error_cdata}</description>
      <pubDate>{pub_date}</pubDate>
    </item>
  </channel>
</rss>
"#,
        escaped_error = escape_markup(error),
        error_cdata = cdata(error),
        pub_date = now.format(PUB_DATE_FORMAT),
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::strip_invalid_xml_chars;
    use chrono::TimeZone;
    use rss::Channel;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap()
    }

    fn render(error: &str) -> Vec<u8> {
        placeholder("A", "http://x/a.xml", error, fixed_now())
    }

    fn parse(doc: &[u8]) -> Channel {
        Channel::read_from(doc).expect("placeholder is not a readable RSS document")
    }

    #[test]
    fn test_placeholder_layout() {
        let doc = render("connection refused");
        let text = String::from_utf8(doc.clone()).unwrap();

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">"));
        assert!(text.contains("<description><![CDATA[connection refused]]></description>"));

        let channel = parse(&doc);
        assert_eq!(channel.title(), "A (mirror error)");
        assert_eq!(channel.link(), "http://x/a.xml");
        assert_eq!(channel.description(), "Failed to fetch source: connection refused");
        assert_eq!(channel.items().len(), 1);

        let item = &channel.items()[0];
        assert_eq!(item.title(), Some("Mirror unavailable"));
        assert_eq!(item.link(), Some("http://x/a.xml"));
        assert_eq!(item.description(), Some("connection refused"));
        assert_eq!(item.pub_date(), Some("Tue, 05 Mar 2024 07:08:09 +0000"));
    }

    #[test]
    fn test_placeholder_is_deterministic_for_fixed_time() {
        assert_eq!(render("boom"), render("boom"));
    }

    #[test]
    fn test_hostile_error_text_cannot_break_document() {
        let hostile = [
            "</description></item></channel></rss><rss>",
            "]]><script>alert(1)</script><![CDATA[",
            "nul\u{0} bell\u{7} esc\u{1b} vt\u{b}",
            "a & b < c > d \"quoted\" 'single'",
            "]]>]]>]]>",
        ];

        for error in hostile {
            let channel = parse(&render(error));
            let expected = strip_invalid_xml_chars(error);

            assert_eq!(channel.items().len(), 1, "for {:?}", error);
            assert_eq!(channel.title(), "A (mirror error)", "for {:?}", error);
            assert_eq!(
                channel.items()[0].description(),
                Some(expected.as_str()),
                "for {:?}",
                error
            );
            assert_eq!(
                channel.description(),
                format!("Failed to fetch source: {}", expected),
                "for {:?}",
                error
            );
        }
    }

    #[test]
    fn test_markup_in_name_and_source_is_escaped() {
        let doc = placeholder("Tom & <Jerry>", "http://x/a.xml?a=1&b=2", "err", fixed_now());
        let text = String::from_utf8(doc.clone()).unwrap();
        assert!(text.contains("<title>Tom &amp; &lt;Jerry&gt; (mirror error)</title>"));

        let channel = parse(&doc);
        assert_eq!(channel.title(), "Tom & <Jerry> (mirror error)");
        assert_eq!(channel.link(), "http://x/a.xml?a=1&b=2");
        assert_eq!(channel.items()[0].link(), Some("http://x/a.xml?a=1&b=2"));
    }
}
