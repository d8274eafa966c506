//! Services table reader.
//!
//! The request-detail page lists attached services in a table headed by
//! "Продукт" and "Тариф" columns. Columns are resolved by header name, so
//! their order on the page does not matter.

use portal_scrape_extract_models::{FieldValue, ServiceRow};
use scraper::ElementRef;

use crate::dom::{child_elements, descendant_elements, spaced_text_of, tag_name, text_of};
use crate::normalize::collapse_ws;
use crate::session::Page;

/// Header text identifying the product column.
pub const PRODUCT_COLUMN: &str = "Продукт";

/// Header text identifying the tariff column.
pub const TARIFF_COLUMN: &str = "Тариф";

/// Tariff-cell text marking a summary row (compared case-insensitively).
pub const TOTAL_MARKER: &str = "итого";

/// Reads every service row from the page, in table order.
///
/// Returns an empty list (and logs a warning) if the table is missing.
#[must_use]
pub fn read_services(page: &Page) -> Vec<ServiceRow> {
    let Some(table) = find_services_table(page.whole()) else {
        log::warn!(
            "Services table not found (no table with '{PRODUCT_COLUMN}' and '{TARIFF_COLUMN}' headers)"
        );
        return Vec::new();
    };

    let headers: Vec<String> = descendant_elements(table)
        .filter(|e| tag_name(*e) == "th")
        .map(|th| collapse_ws(&text_of(th)))
        .collect();
    let product_idx = column_index(&headers, PRODUCT_COLUMN);
    let tariff_idx = column_index(&headers, TARIFF_COLUMN);

    let rows: Vec<ServiceRow> = data_rows(table)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = child_elements(row)
                .filter(|c| tag_name(*c) == "td")
                .collect();
            let cell = |idx: Option<usize>| {
                idx.and_then(|i| cells.get(i))
                    .map(|c| collapse_ws(&spaced_text_of(*c)))
                    .unwrap_or_default()
            };

            let product = cell(product_idx);
            let tariff = cell(tariff_idx);
            if product.is_empty() || tariff.to_lowercase().contains(TOTAL_MARKER) {
                return None;
            }

            Some(ServiceRow {
                product: FieldValue::new(product),
                tariff: FieldValue::new(tariff),
            })
        })
        .collect();

    log::debug!("Read {} service rows", rows.len());
    rows
}

/// First table with a header cell containing each column name.
fn find_services_table(scope: ElementRef<'_>) -> Option<ElementRef<'_>> {
    descendant_elements(scope)
        .filter(|e| tag_name(*e) == "table")
        .find(|table| {
            let headers: Vec<String> = descendant_elements(*table)
                .filter(|e| tag_name(*e) == "th")
                .map(text_of)
                .collect();
            headers.iter().any(|h| h.contains(PRODUCT_COLUMN))
                && headers.iter().any(|h| h.contains(TARIFF_COLUMN))
        })
}

/// Index of the first header containing `name`, ignoring case.
///
/// Ambiguous names resolve to the first match in header order.
fn column_index(headers: &[String], name: &str) -> Option<usize> {
    let name = name.to_lowercase();
    headers.iter().position(|h| h.to_lowercase().contains(&name))
}

/// Body rows that carry at least one data cell.
fn data_rows<'a>(table: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    descendant_elements(table)
        .filter(|e| tag_name(*e) == "tbody")
        .flat_map(child_elements)
        .filter(|row| {
            tag_name(*row) == "tr" && child_elements(*row).any(|c| tag_name(c) == "td")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services(html: &str) -> Vec<(String, String)> {
        read_services(&Page::parse(html))
            .into_iter()
            .map(|r| (r.product.to_string(), r.tariff.to_string()))
            .collect()
    }

    #[test]
    fn reads_rows_in_order() {
        let rows = services(
            r"<table>
                <thead><tr><th>№</th><th>Продукт</th><th>Тарифный план</th></tr></thead>
                <tbody>
                  <tr><td>1</td><td>Домашний интернет</td><td>Турбо 500</td></tr>
                  <tr><td>2</td><td>ТВ</td><td>Базовый</td></tr>
                </tbody>
              </table>",
        );
        assert_eq!(
            rows,
            vec![
                ("Домашний интернет".to_owned(), "Турбо 500".to_owned()),
                ("ТВ".to_owned(), "Базовый".to_owned()),
            ]
        );
    }

    #[test]
    fn resolves_swapped_columns_by_name() {
        let rows = services(
            r"<table>
                <thead><tr><th>Тариф</th><th>Продукт</th></tr></thead>
                <tbody><tr><td>Турбо 500</td><td>Домашний интернет</td></tr></tbody>
              </table>",
        );
        assert_eq!(
            rows,
            vec![("Домашний интернет".to_owned(), "Турбо 500".to_owned())]
        );
    }

    #[test]
    fn skips_total_and_empty_rows() {
        let rows = services(
            r"<table>
                <tr><th>Продукт</th><th>Тариф</th></tr>
                <tr><td>Интернет</td><td>Турбо</td></tr>
                <tr><td>Всего</td><td>Итого: 500</td></tr>
                <tr><td> </td><td>Пустой</td></tr>
              </table>",
        );
        assert_eq!(rows, vec![("Интернет".to_owned(), "Турбо".to_owned())]);
    }

    #[test]
    fn short_row_yields_unknown_tariff() {
        let rows = read_services(&Page::parse(
            r"<table><tr><th>Продукт</th><th>Тариф</th></tr><tr><td>Интернет</td></tr></table>",
        ));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].tariff.is_unknown());
    }

    #[test]
    fn ignores_unrelated_tables() {
        let rows = services(
            r"<table><tr><th>Продукт</th></tr><tr><td>не то</td></tr></table>
              <table><tr><th>Продукт</th><th>Тариф</th></tr><tr><td>Интернет</td><td>Турбо</td></tr></table>",
        );
        assert_eq!(rows, vec![("Интернет".to_owned(), "Турбо".to_owned())]);
    }

    #[test]
    fn missing_table_is_empty() {
        assert!(services("<p>нет таблицы</p>").is_empty());
    }

    #[test]
    fn ambiguous_header_takes_first_column() {
        assert_eq!(
            column_index(
                &["Тарифная зона".to_owned(), "Тариф".to_owned()],
                TARIFF_COLUMN
            ),
            Some(0)
        );
    }
}
