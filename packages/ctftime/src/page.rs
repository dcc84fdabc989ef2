use scraper::{Html, Selector};

const SOLO_NOTICE: &str =
    "This event is limited to individual participation! No global rating points.";
const ONLINE_MARKER: &str = "On-line";

/// Flags read from the public event page markup. Extracted eagerly so the
/// parsed DOM does not cross await points.
#[derive(Debug, Clone)]
pub struct EventPage {
    bold_notices: Vec<String>,
}

impl EventPage {
    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);
        let mut bold_notices = Vec::new();
        if let Ok(selector) = Selector::parse("p b") {
            for node in doc.select(&selector) {
                let text = node.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    bold_notices.push(text);
                }
            }
        }
        Self { bold_notices }
    }

    /// The event is limited to individual participation (no team rosters).
    pub fn is_individual_only(&self) -> bool {
        self.bold_notices.iter().any(|t| t.contains(SOLO_NOTICE))
    }

    pub fn is_online(&self) -> bool {
        self.bold_notices.iter().any(|t| t.contains(ONLINE_MARKER))
    }
}
