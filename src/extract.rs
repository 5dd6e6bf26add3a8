//! # Forecast Table Extraction
//!
//! Turns a location's forecast table into ordered [`RawEventRecord`]s.
//!
//! Forecast pages only print the date on the first row of each day, so every
//! following row inherits the most recent non-empty date above it
//! ([`carry_forward_dates`]). The HTML side ([`parse_forecast_table`]) targets the
//! table layout of the forecast site:
//!
//! ```html
//! <table>
//!   <tr><td class="date">Saturday 1 June 2024</td><td class="time ">6:02 AM</td>
//!       <td></td><td>Sunrise</td></tr>
//!   <tr><td class="time tide">9:15 AM</td><td class="level metric">0.42 m</td>
//!       <td>Low Tide</td></tr>
//!   <tr><td class="time-zone">PDT</td></tr>
//! </table>
//! ```

use crate::RawEventRecord;
use scraper::{ElementRef, Html, Selector};

/// Rows extracted from one forecast table, plus the table's timezone label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastTable {
    /// Timezone label printed in the table; display-only
    pub timezone: Option<String>,
    /// Rows in page order with dates carried forward
    pub records: Vec<RawEventRecord>,
}

/// Fill empty dates from the nearest preceding row that had one.
///
/// A blank or whitespace-only date counts as empty. Rows before the first dated
/// row keep an empty date; the normalizer drops them later.
pub fn carry_forward_dates(rows: &[RawEventRecord]) -> Vec<RawEventRecord> {
    let mut last_date: Option<String> = None;

    rows.iter()
        .map(|row| {
            let mut record = row.clone();
            match row.date.as_deref().filter(|d| !d.trim().is_empty()) {
                Some(date) => last_date = Some(date.to_string()),
                None => record.date = last_date.clone(),
            }
            record
        })
        .collect()
}

/// Extract the forecast rows and timezone label from a location page.
///
/// Rows without any `td` cell (header rows) are skipped. The label is the text
/// of the row's last cell.
pub fn parse_forecast_table(html: &str) -> ForecastTable {
    let doc = Html::parse_document(html);

    let rows = selector("table tr");
    let cells = selector("td");
    let date = selector("td.date");
    let time = selector("td.time");
    let meters = selector("td.level.metric");
    let timezone = selector("td.time-zone");

    let mut extracted = Vec::new();
    for row in doc.select(&rows) {
        let row_cells: Vec<ElementRef> = row.select(&cells).collect();
        let Some(last) = row_cells.last() else {
            continue;
        };

        extracted.push(RawEventRecord {
            date: first_text(row, &date),
            time: first_text(row, &time),
            magnitude_text: first_text(row, &meters),
            label: cell_text(*last).unwrap_or_default(),
        });
    }

    let timezone = doc.select(&timezone).find_map(cell_text);

    ForecastTable {
        timezone,
        records: carry_forward_dates(&extracted),
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("CSS selector should be valid")
}

fn first_text(row: ElementRef, sel: &Selector) -> Option<String> {
    row.select(sel).next().and_then(cell_text)
}

/// Whitespace-collapsed text of an element, `None` when blank.
pub(crate) fn cell_text(el: ElementRef) -> Option<String> {
    let text = el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: Option<&str>, time: &str, label: &str) -> RawEventRecord {
        RawEventRecord {
            date: date.map(str::to_string),
            time: Some(time.to_string()),
            magnitude_text: None,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_carry_forward_fills_until_next_date() {
        let rows = vec![
            row(Some("2024-06-01"), "06:02", "Sunrise"),
            row(None, "09:15", "Low Tide"),
            row(Some(""), "20:31", "Sunset"),
            row(Some("2024-06-02"), "06:03", "Sunrise"),
            row(None, "10:01", "Low Tide"),
        ];

        let dates: Vec<_> = carry_forward_dates(&rows)
            .into_iter()
            .map(|r| r.date.unwrap())
            .collect();

        assert_eq!(
            dates,
            vec!["2024-06-01", "2024-06-01", "2024-06-01", "2024-06-02", "2024-06-02"]
        );
    }

    #[test]
    fn test_carry_forward_without_leading_date_stays_empty() {
        let rows = vec![
            row(None, "05:00", "Low Tide"),
            row(Some("  "), "06:00", "Sunrise"),
            row(Some("2024-06-01"), "07:00", "High Tide"),
        ];

        let resolved = carry_forward_dates(&rows);
        assert_eq!(resolved[0].date, None);
        assert_eq!(resolved[1].date, None);
        assert_eq!(resolved[2].date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_carry_forward_leaves_input_untouched() {
        let rows = vec![row(Some("2024-06-01"), "06:02", "Sunrise"), row(None, "09:15", "Low Tide")];
        let _ = carry_forward_dates(&rows);
        assert_eq!(rows[1].date, None);
    }

    #[test]
    fn test_parse_forecast_table() {
        let html = r#"
            <html><body><table>
              <tr><th>Day</th><th>Time</th><th>Height</th><th>Event</th></tr>
              <tr><td class="date">Saturday 1 June 2024</td><td class="time ">6:02 AM</td>
                  <td></td><td>Sunrise</td></tr>
              <tr><td class="time tide">9:15 AM</td><td class="level metric">0.42 m</td>
                  <td>Low Tide</td></tr>
              <tr><td class="time tide">3:40 PM</td><td class="level metric">1.98 m</td>
                  <td>High
                      Tide</td></tr>
              <tr><td class="time-zone">PDT</td></tr>
            </table></body></html>
        "#;

        let table = parse_forecast_table(html);
        assert_eq!(table.timezone.as_deref(), Some("PDT"));
        assert_eq!(table.records.len(), 4);

        let low = &table.records[1];
        assert_eq!(low.date.as_deref(), Some("Saturday 1 June 2024"));
        assert_eq!(low.time.as_deref(), Some("9:15 AM"));
        assert_eq!(low.magnitude_text.as_deref(), Some("0.42 m"));
        assert_eq!(low.label, "Low Tide");

        assert_eq!(table.records[0].magnitude_text, None);
        assert_eq!(table.records[2].label, "High Tide");
    }

    #[test]
    fn test_parse_page_without_table() {
        let table = parse_forecast_table("<html><body><p>No forecast</p></body></html>");
        assert!(table.records.is_empty());
        assert_eq!(table.timezone, None);
    }
}
