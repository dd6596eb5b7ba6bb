use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};
use serde::Serialize;

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static CAPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("caption").unwrap());

/// Where a table was found on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSource {
    Visible,
    Comment,
}

impl TableSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableSource::Visible => "visible",
            TableSource::Comment => "comment",
        }
    }
}

/// Outer HTML of a located `<table>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTable {
    pub id: Option<String>,
    pub html: String,
    pub source: TableSource,
}

impl LocatedTable {
    /// Caption text, else the id.
    pub fn display_name(&self) -> Option<String> {
        let fragment = Html::parse_fragment(&self.html);
        fragment
            .select(&CAPTION_SELECTOR)
            .next()
            .map(|c| c.text().collect::<String>().trim().to_string())
            .filter(|c| !c.is_empty())
            .or_else(|| self.id.clone())
    }
}

fn find_in(document: &Html, table_id: &str, source: TableSource) -> Option<LocatedTable> {
    document
        .select(&TABLE_SELECTOR)
        .find(|el| el.value().id() == Some(table_id))
        .map(|el| LocatedTable {
            id: Some(table_id.to_string()),
            html: el.html(),
            source,
        })
}

/// Text of every comment node in document order.
fn comments(document: &Html) -> Vec<String> {
    document
        .tree
        .nodes()
        .filter_map(|node| match node.value() {
            Node::Comment(c) => Some(c.comment.to_string()),
            _ => None,
        })
        .collect()
}

/// Find `<table id=table_id>`, visible DOM first, then inside HTML comments.
///
/// Only comments whose text contains `table_id` are re-parsed.
pub fn find_table(html: &str, table_id: &str) -> Option<LocatedTable> {
    let document = Html::parse_document(html);

    if let Some(table) = find_in(&document, table_id, TableSource::Visible) {
        return Some(table);
    }

    comments(&document)
        .iter()
        .filter(|text| text.contains(table_id))
        .find_map(|text| {
            let fragment = Html::parse_fragment(text);
            find_in(&fragment, table_id, TableSource::Comment)
        })
}

/// Every visible table carrying an id, then every table found inside comments.
pub fn find_all_tables(html: &str) -> Vec<LocatedTable> {
    let document = Html::parse_document(html);

    let mut tables: Vec<LocatedTable> = document
        .select(&TABLE_SELECTOR)
        .filter_map(|el| {
            el.value().id().map(|id| LocatedTable {
                id: Some(id.to_string()),
                html: el.html(),
                source: TableSource::Visible,
            })
        })
        .collect();

    for text in comments(&document).iter().filter(|t| t.contains("<table")) {
        let fragment = Html::parse_fragment(text);
        tables.extend(fragment.select(&TABLE_SELECTOR).map(|el| LocatedTable {
            id: el.value().id().map(str::to_string),
            html: el.html(),
            source: TableSource::Comment,
        }));
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div id="all_passing">
          <table id="passing"><tbody><tr><td data-stat="player">Visible Guy</td></tr></tbody></table>
        </div>
        <div id="all_kicking">
          <!--
          <table id="kicking"><tbody><tr><td data-stat="player">Hidden Kicker</td></tr></tbody></table>
          -->
        </div>
        <!-- <table id="passing"><tbody><tr><td data-stat="player">Commented Guy</td></tr></tbody></table> -->
        <!-- unrelated comment -->
        <table><tr><td>no id</td></tr></table>
    </body></html>"#;

    #[test]
    fn test_visible_table_found() {
        let table = find_table(PAGE, "passing").unwrap();
        assert_eq!(table.source, TableSource::Visible);
        assert!(table.html.contains("Visible Guy"));
        assert!(!table.html.contains("Commented Guy"));
    }

    #[test]
    fn test_commented_table_found() {
        let table = find_table(PAGE, "kicking").unwrap();
        assert_eq!(table.source, TableSource::Comment);
        assert_eq!(table.id.as_deref(), Some("kicking"));
        assert!(table.html.contains("Hidden Kicker"));
    }

    #[test]
    fn test_missing_table_is_none() {
        assert!(find_table(PAGE, "rushing").is_none());
        // Substring in a comment without a matching table id.
        assert!(find_table(PAGE, "unrelated").is_none());
    }

    #[test]
    fn test_display_name_prefers_caption() {
        let captioned = LocatedTable {
            id: Some("returns".into()),
            html: "<table id=\"returns\"><caption> Kick &amp; Punt Returns </caption></table>".into(),
            source: TableSource::Comment,
        };
        assert_eq!(captioned.display_name().as_deref(), Some("Kick & Punt Returns"));
        let plain = find_table(PAGE, "kicking").unwrap();
        assert_eq!(plain.display_name().as_deref(), Some("kicking"));
    }

    #[test]
    fn test_find_all_tables_lists_visible_then_comment() {
        let tables = find_all_tables(PAGE);
        let summary: Vec<(Option<&str>, TableSource)> = tables
            .iter()
            .map(|t| (t.id.as_deref(), t.source))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some("passing"), TableSource::Visible),
                (Some("kicking"), TableSource::Comment),
                (Some("passing"), TableSource::Comment),
            ]
        );
    }
}
