use super::locator::LocatedTable;
use crate::constants::{AWARD_MARKERS, HEADER_ROW_CLASS, RANK_FIELD, RANK_STAT};
use crate::schema::sanitize_identifier;
use crate::types::{ExtractContext, ExtractedRow};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());
static HEADER_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead tr th, thead tr td").unwrap());

/// Static translation from site `data-stat` tokens to normalized field names.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub entries: &'static [(&'static str, &'static str)],
    /// `data-stat` of the cell that identifies a row (player, team, week).
    pub identity_stat: &'static str,
    /// Identity text must parse as an integer (week numbers).
    pub identity_numeric: bool,
    /// Normalized fields that carry award decorations to strip.
    pub strip_markers: &'static [&'static str],
}

impl ColumnMap {
    pub fn get(&self, stat: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(source, _)| *source == stat)
            .map(|(_, field)| *field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(_, field)| *field)
    }
}

/// Blank text becomes null; anything else is kept trimmed, unparsed.
pub fn clean_value(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

pub fn strip_award_markers(name: &str) -> String {
    name.trim().trim_end_matches(AWARD_MARKERS).trim_end().to_string()
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>()
}

fn is_header_row(row: &ElementRef) -> bool {
    row.value().classes().any(|c| c == HEADER_ROW_CLASS)
}

fn has_data_cells(row: &ElementRef) -> bool {
    row.children()
        .filter_map(ElementRef::wrap)
        .any(|c| c.value().name() == "td")
}

fn colspan(cell: &ElementRef) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

fn cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.select(&CELL_SELECTOR).collect()
}

fn has_identity(cells: &[ElementRef], map: &ColumnMap) -> bool {
    cells
        .iter()
        .find(|c| c.value().attr("data-stat") == Some(map.identity_stat))
        .map(|c| {
            let text = cell_text(c);
            let text = text.trim();
            if map.identity_numeric {
                text.parse::<i64>().is_ok()
            } else {
                !text.is_empty()
            }
        })
        .unwrap_or(false)
}

fn inject_context(row: &mut ExtractedRow, context: &ExtractContext) {
    row.set("season", context.season);
    if let Some(week) = context.week {
        row.set("week", week);
    }
    if let Some(team) = &context.team {
        row.set("team", team.as_str());
    }
}

/// Turn a located stat table into normalized rows.
///
/// Header repeats, separator rows and rows without an identity cell are
/// skipped. Cells whose `data-stat` is not in `map` are dropped. Context
/// values are injected last and override anything read from the page.
pub fn extract_rows(
    table: &LocatedTable,
    map: &ColumnMap,
    context: &ExtractContext,
) -> Vec<ExtractedRow> {
    let fragment = Html::parse_fragment(&table.html);
    let mut rows = Vec::new();

    for tr in fragment.select(&ROW_SELECTOR) {
        if is_header_row(&tr) || !has_data_cells(&tr) {
            continue;
        }

        let cells = cells(&tr);
        if !has_identity(&cells, map) {
            continue;
        }

        let mut row = ExtractedRow::new();
        for cell in &cells {
            let Some(stat) = cell.value().attr("data-stat") else {
                continue;
            };
            if cell.value().name() == "th" && stat == RANK_STAT {
                row.set(RANK_FIELD, clean_value(&cell_text(cell)));
            } else if let Some(field) = map.get(stat) {
                row.set(field, clean_value(&cell_text(cell)));
            }
        }

        for field in map.strip_markers {
            if let Some(name) = row.get_str(field) {
                let stripped = strip_award_markers(name);
                row.set(*field, stripped);
            }
        }

        inject_context(&mut row, context);
        rows.push(row);
    }

    rows
}

/// Column names for an ad-hoc table, from the last header row, one per
/// column position. A cell spanning n columns yields `name`, `name_2`, ..
/// `name_n`.
fn header_names(fragment: &Html) -> Vec<String> {
    let header_cells: Vec<ElementRef> = fragment.select(&HEADER_CELL_SELECTOR).collect();
    let Some(last_row) = header_cells.last().and_then(|c| c.parent()) else {
        return Vec::new();
    };
    header_cells
        .iter()
        .filter(|c| c.parent().map(|p| p.id()) == Some(last_row.id()))
        .flat_map(|c| {
            let name = c
                .value()
                .attr("data-stat")
                .map(str::to_string)
                .unwrap_or_else(|| cell_text(c));
            let name = sanitize_identifier(&name);
            (1..=colspan(c)).map(move |n| if n == 1 { name.clone() } else { format!("{name}_{n}") })
        })
        .collect()
}

/// Rows of a table with no known column map. Column names come from each
/// cell's `data-stat`, else the header text at the same position.
pub fn extract_generic_rows(table: &LocatedTable) -> Vec<ExtractedRow> {
    let fragment = Html::parse_fragment(&table.html);
    let headers = header_names(&fragment);
    let mut rows = Vec::new();

    for tr in fragment.select(&ROW_SELECTOR) {
        if is_header_row(&tr) || !has_data_cells(&tr) {
            continue;
        }
        if tr.ancestors().filter_map(ElementRef::wrap).any(|a| a.value().name() == "thead") {
            continue;
        }

        let mut row = ExtractedRow::new();
        let mut idx = 0;
        for cell in cells(&tr).iter() {
            let position = idx;
            idx += colspan(cell);
            let name = match cell.value().attr("data-stat") {
                Some(stat) => sanitize_identifier(stat),
                None => headers
                    .get(position)
                    .cloned()
                    .unwrap_or_else(|| format!("col_{position}")),
            };
            if !row.contains_key(&name) {
                row.set(name, clean_value(&cell_text(cell)));
            }
        }

        if row.iter().any(|(_, v)| !v.is_null()) {
            rows.push(row);
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::locator::TableSource;

    const PASSING_MAP: ColumnMap = ColumnMap {
        entries: &[
            ("player", "player_name"),
            ("team", "tm"),
            ("pass_att", "att"),
        ],
        identity_stat: "player",
        identity_numeric: false,
        strip_markers: &["player_name"],
    };

    fn table(html: &str) -> LocatedTable {
        LocatedTable {
            id: Some("passing".into()),
            html: html.to_string(),
            source: TableSource::Visible,
        }
    }

    const PASSING_TABLE: &str = r#"<table id="passing">
      <thead><tr><th data-stat="ranker">Rk</th><th data-stat="player">Player</th><th data-stat="team">Tm</th><th data-stat="pass_att">Att</th></tr></thead>
      <tbody>
        <tr><th data-stat="ranker">1</th><td data-stat="player"><a href="/p">Jane Doe*+</a></td><td data-stat="team">KAN</td><td data-stat="pass_att">597</td><td data-stat="pass_cmp_perc">67.2</td></tr>
        <tr class="thead"><th data-stat="ranker">Rk</th><td data-stat="player">Player</td><td data-stat="team">Tm</td></tr>
        <tr><th data-stat="ranker">2</th><td data-stat="player">John Roe</td><td data-stat="team">BUF</td><td data-stat="pass_att"></td></tr>
        <tr><th data-stat="ranker">3</th><td data-stat="player"> </td><td data-stat="team">NYJ</td></tr>
        <tr></tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_extracts_qualifying_rows_with_season() {
        let rows = extract_rows(
            &table(PASSING_TABLE),
            &PASSING_MAP,
            &ExtractContext::season(2023),
        );
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.get("season") == Some(&Value::from(2023))));

        let first = &rows[0];
        assert_eq!(first.get_str("player_name"), Some("Jane Doe"));
        assert_eq!(first.get_str("tm"), Some("KAN"));
        assert_eq!(first.get_str("att"), Some("597"));
        assert_eq!(first.get_str("rk"), Some("1"));
        assert!(!first.contains_key("pass_cmp_perc"));
        assert!(!first.contains_key("cmp_pct"));

        assert_eq!(rows[1].get("att"), Some(&Value::Null));
    }

    #[test]
    fn test_unmapped_stat_dropped() {
        const MAP: ColumnMap = ColumnMap {
            entries: &[("a", "x")],
            identity_stat: "a",
            identity_numeric: false,
            strip_markers: &[],
        };
        let html = r#"<table><tr><td data-stat="a">1</td><td data-stat="b">2</td></tr></table>"#;
        let rows = extract_rows(&table(html), &MAP, &ExtractContext::season(2023));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("x"), Some("1"));
        assert!(!rows[0].contains_key("b"));
    }

    #[test]
    fn test_numeric_identity_and_context_injection() {
        const GAMES: ColumnMap = ColumnMap {
            entries: &[("week_num", "week"), ("winner", "winner")],
            identity_stat: "week_num",
            identity_numeric: true,
            strip_markers: &[],
        };
        let html = r#"<table id="games"><tbody>
            <tr><th data-stat="week_num">1</th><td data-stat="winner">Kansas City Chiefs</td></tr>
            <tr><th data-stat="week_num">WildCard</th><td data-stat="winner">Buffalo Bills</td></tr>
        </tbody></table>"#;
        let ctx = ExtractContext::season(2023).with_team("kan");
        let rows = extract_rows(&table(html), &GAMES, &ctx);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("week"), Some("1"));
        assert_eq!(rows[0].get_str("team"), Some("kan"));
    }

    #[test]
    fn test_clean_value_and_marker_stripping() {
        assert_eq!(clean_value("   "), Value::Null);
        assert_eq!(clean_value(" 42 "), Value::String("42".into()));
        assert_eq!(strip_award_markers("Jane Doe*+"), "Jane Doe");
        assert_eq!(strip_award_markers("Kansas City Chiefs*"), "Kansas City Chiefs");
        assert_eq!(strip_award_markers("Plain"), "Plain");
    }

    #[test]
    fn test_generic_rows_use_data_stat_or_header() {
        let html = r#"<table id="misc">
          <thead><tr><th colspan="2">Group</th></tr><tr><th>Player Name</th><th>Yds</th></tr></thead>
          <tbody>
            <tr><td>Jane Doe</td><td data-stat="rush_yds">1,204</td></tr>
            <tr><td></td><td></td></tr>
          </tbody>
        </table>"#;
        let rows = extract_generic_rows(&table(html));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("player_name"), Some("Jane Doe"));
        assert_eq!(rows[0].get_str("rush_yds"), Some("1,204"));
    }

    #[test]
    fn test_generic_rows_expand_header_colspan() {
        let html = r#"<table id="returns">
          <thead><tr><th>Player</th><th colspan="2">Punt Ret</th><th>TD</th></tr></thead>
          <tbody>
            <tr><td>Jane Doe</td><td>31</td><td>402</td><td>2</td></tr>
            <tr><td colspan="3">League Total</td><td>40</td></tr>
          </tbody>
        </table>"#;
        let rows = extract_generic_rows(&table(html));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_str("punt_ret"), Some("31"));
        assert_eq!(rows[0].get_str("punt_ret_2"), Some("402"));
        assert_eq!(rows[0].get_str("td"), Some("2"));
        assert_eq!(rows[1].get_str("player"), Some("League Total"));
        assert_eq!(rows[1].get_str("td"), Some("40"));
        assert!(!rows[1].contains_key("punt_ret"));
    }
}
