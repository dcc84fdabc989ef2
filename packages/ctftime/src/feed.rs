use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::error::FeedError;

/// One entry of the CTFtime RSS feed, reduced to the fields the bot uses.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub ctftime_id: String,
    pub title: String,
    pub link: String,
    /// Raw text from the "Date:" description line, handed to the registry
    /// verbatim.
    pub start_text: String,
    pub end_text: String,
    pub weight: Option<String>,
    pub description: String,
}

/// Fetch the feed and return its newest entry, or `None` when the feed is
/// empty.
pub async fn fetch_latest(
    http: &reqwest::Client,
    url: &str,
) -> Result<Option<FeedEntry>, FeedError> {
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::Status(status.as_u16()));
    }
    let body = resp.text().await?;
    debug!(url, bytes = body.len(), "fetched feed");
    parse_latest(&body)
}

#[derive(Default)]
struct RawItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    description: Option<String>,
}

/// Parse the feed document and extract its first `<item>`.
pub fn parse_latest(xml: &str) -> Result<Option<FeedEntry>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_item = false;
    let mut item = RawItem::default();
    let mut field: Option<&'static str> = None;

    loop {
        let ev = reader
            .read_event()
            .map_err(|e| FeedError::Malformed(e.to_string()))?;
        match ev {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    item = RawItem::default();
                }
                b"title" if in_item => field = Some("title"),
                b"link" if in_item => field = Some("link"),
                b"guid" if in_item => field = Some("guid"),
                b"description" if in_item => field = Some("description"),
                _ => field = None,
            },
            Event::Text(t) if in_item => {
                if let Some(name) = field {
                    let text = t
                        .decode()
                        .map_err(|e| FeedError::Malformed(e.to_string()))?;
                    append(&mut item, name, &text);
                }
            }
            Event::GeneralRef(r) if in_item => {
                if let Some(name) = field {
                    let resolved = resolve_entity(&r)?;
                    append(&mut item, name, &resolved);
                }
            }
            Event::CData(t) if in_item => {
                if let Some(name) = field {
                    append(&mut item, name, &String::from_utf8_lossy(t.as_ref()));
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    return build_entry(item).map(Some);
                }
                field = None;
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn append(item: &mut RawItem, field: &str, text: &str) {
    let slot = match field {
        "title" => &mut item.title,
        "link" => &mut item.link,
        "guid" => &mut item.guid,
        _ => &mut item.description,
    };
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

fn build_entry(item: RawItem) -> Result<FeedEntry, FeedError> {
    let title = item
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or(FeedError::Incomplete("title"))?;
    let link = item
        .link
        .filter(|t| !t.trim().is_empty())
        .ok_or(FeedError::Incomplete("link"))?;
    let description = item.description.unwrap_or_default();

    // The guid carries the catalog id as its last path segment.
    let guid = item.guid.unwrap_or_else(|| link.clone());
    let ctftime_id = guid
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    if ctftime_id.is_empty() {
        return Err(FeedError::Incomplete("guid"));
    }

    let (start_text, end_text) = extract_dates(&description);
    let weight = extract_weight(&description);

    Ok(FeedEntry {
        ctftime_id,
        title: title.trim().to_string(),
        link: link.trim().to_string(),
        start_text,
        end_text,
        weight,
        description,
    })
}

/// The description's "Date:" line holds both instants separated by an
/// `&mdash;` left over from double-escaped markup.
fn extract_dates(description: &str) -> (String, String) {
    for line in description.lines() {
        let Some(rest) = line.trim().strip_prefix("Date:") else {
            continue;
        };
        let rest = rest.replace("&nbsp;", " ").replace("&nbsp", " ");
        let (start, end) = rest
            .split_once("&mdash;")
            .or_else(|| rest.split_once("&mdash"))
            .or_else(|| rest.split_once('—'))
            .unwrap_or((rest.as_str(), ""));
        return (clean_date(start), clean_date(end));
    }
    (String::new(), String::new())
}

fn clean_date(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

fn extract_weight(description: &str) -> Option<String> {
    for line in description.lines() {
        if !line.to_lowercase().contains("rating weight") {
            continue;
        }
        if let Some((_, value)) = line.split_once(':') {
            let value = value.replace("<br />", "").replace("&nbsp;", " ");
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0"><channel>
<title>CTFtime.org: upcoming events</title>
<link>https://ctftime.org/</link>
<item>
<title>Example CTF 2025</title>
<link>https://ctftime.org/event/2543/</link>
<description>Example CTF 2025 | ctftime.org
Date: Fri, 04 July 2025, 17:00 UTC &amp;mdash; Sun, 06 July 2025, 17:00 UTC&amp;nbsp;
Format: Jeopardy&amp;nbsp;&lt;br /&gt;
Location: On-line
Rating weight: 24.90&amp;nbsp;&lt;br /&gt;
</description>
<guid>https://ctftime.org/event/2543</guid>
</item>
<item>
<title>Older CTF</title>
<link>https://ctftime.org/event/2500/</link>
<guid>https://ctftime.org/event/2500</guid>
</item>
</channel></rss>"#;

    #[test]
    fn test_parses_the_newest_entry() {
        let entry = parse_latest(SAMPLE_FEED).expect("parse").expect("entry");
        assert_eq!(entry.ctftime_id, "2543");
        assert_eq!(entry.title, "Example CTF 2025");
        assert_eq!(entry.link, "https://ctftime.org/event/2543/");
        assert_eq!(entry.start_text, "Fri, 04 July 2025, 17:00 UTC");
        assert_eq!(entry.end_text, "Sun, 06 July 2025, 17:00 UTC");
        assert_eq!(entry.weight.as_deref(), Some("24.90"));
    }

    #[test]
    fn test_empty_feed_is_none() {
        let xml = r#"<rss version="2.0"><channel><title>empty</title></channel></rss>"#;
        assert_eq!(parse_latest(xml).expect("parse"), None);
    }

    #[test]
    fn test_malformed_feed_is_an_error() {
        let xml = "<rss><channel><item><title>broken</link></item></channel></rss>";
        let err = parse_latest(xml).expect_err("must fail");
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[test]
    fn test_entry_without_title_is_incomplete() {
        let xml = r#"<rss><channel><item>
<link>https://ctftime.org/event/1/</link>
<guid>https://ctftime.org/event/1</guid>
</item></channel></rss>"#;
        let err = parse_latest(xml).expect_err("must fail");
        assert!(matches!(err, FeedError::Incomplete("title")));
    }

    #[test]
    fn test_missing_date_line_yields_empty_text() {
        let xml = r#"<rss><channel><item>
<title>No dates</title>
<link>https://ctftime.org/event/7/</link>
<guid>https://ctftime.org/event/7</guid>
<description>Nothing useful here.</description>
</item></channel></rss>"#;
        let entry = parse_latest(xml).expect("parse").expect("entry");
        assert_eq!(entry.start_text, "");
        assert_eq!(entry.end_text, "");
        assert_eq!(entry.weight, None);
    }
}
