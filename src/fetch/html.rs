use anyhow::{anyhow, Context, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::model::RawTable;
use crate::process::utils::collapse_ws;

pub const DEFAULT_TABLE_SELECTOR: &str = "table";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {:?}: {:?}", css, e))
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// The table's own rows, directly or through `thead`/`tbody`/`tfoot`.
/// Rows of tables nested inside cells are not included.
fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child_elements(child).filter(|r| r.value().name() == "tr"))
            }
            _ => {}
        }
    }
    rows
}

/// (cell texts, whether any cell is a `td`) for one row.
fn row_cells(tr: ElementRef<'_>) -> (Vec<String>, bool) {
    let mut has_td = false;
    let cells = child_elements(tr)
        .filter(|c| match c.value().name() {
            "td" => {
                has_td = true;
                true
            }
            "th" => true,
            _ => false,
        })
        .map(|c| collapse_ws(&c.text().collect::<String>()))
        .collect();
    (cells, has_td)
}

/// Scrape the first element matching `table_css` into a `RawTable`.
///
/// The first row with any cells supplies the headers (usually the `th` row);
/// later rows count only when they hold at least one `td`.
pub fn scrape_table(body: &str, table_css: &str) -> Result<RawTable> {
    let doc = Html::parse_document(body);
    let table_sel = selector(table_css)?;

    let table = doc
        .select(&table_sel)
        .next()
        .with_context(|| format!("no element matches {:?}", table_css))?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for tr in own_rows(table) {
        let (cells, has_td) = row_cells(tr);
        if cells.is_empty() {
            continue;
        }
        if headers.is_none() {
            headers = Some(cells);
        } else if has_td {
            rows.push(cells);
        }
    }

    let headers = headers.with_context(|| format!("{:?} has no rows", table_css))?;
    debug!(columns = headers.len(), rows = rows.len(), "scraped table");
    Ok(RawTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <table class="nav"><tr><td>menu</td></tr></table>
          <table class="board">
            <thead><tr><th>Rank</th><th>Player</th><th>Pos</th><th>School</th></tr></thead>
            <tbody>
              <tr><td>1</td><td><a href="/p/1">Travis
                   Hunter</a></td><td>WR</td><td>Colorado</td></tr>
              <tr><th>Rank</th><th>Player</th><th>Pos</th><th>School</th></tr>
              <tr><td>2</td><td>Will Campbell</td><td>OT</td><td>LSU</td></tr>
            </tbody>
          </table>
        </body></html>"#;

    #[test]
    fn scrapes_selected_table() -> Result<()> {
        let t = scrape_table(PAGE, "table.board")?;
        assert_eq!(t.headers, vec!["Rank", "Player", "Pos", "School"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0], vec!["1", "Travis Hunter", "WR", "Colorado"]);
        Ok(())
    }

    #[test]
    fn default_selector_takes_first_table() -> Result<()> {
        let t = scrape_table(PAGE, DEFAULT_TABLE_SELECTOR)?;
        assert_eq!(t.headers, vec!["menu"]);
        assert!(t.is_empty());
        Ok(())
    }

    #[test]
    fn nested_tables_stay_inside_their_cell() -> Result<()> {
        let page = r#"
            <table id="board">
              <tr><th>Rank</th><th>Player</th><th>Notes</th></tr>
              <tr><td>1</td><td>Cam Ward</td>
                  <td><table><tr><td>Yds</td><td>4313</td></tr></table></td></tr>
              <tr><td>2</td><td>Ashton Jeanty</td><td>-</td></tr>
            </table>"#;
        let t = scrape_table(page, "#board")?;
        assert_eq!(t.headers, vec!["Rank", "Player", "Notes"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].len(), 3);
        assert_eq!(t.rows[0][2], "Yds4313");
        assert_eq!(t.rows[1][1], "Ashton Jeanty");
        Ok(())
    }

    #[test]
    fn missing_table_is_an_error() {
        assert!(scrape_table("<p>moved</p>", "table.board").is_err());
        assert!(scrape_table(PAGE, "table[").is_err());
    }
}
