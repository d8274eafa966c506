#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fixed-layout report for a [`CollectedRecord`].
//!
//! Sections always appear in the same order (request details, client,
//! PPPoE) with one line per field. Every value is inserted as-is,
//! including the sentinel, so a partially scraped record still renders a
//! complete report.

use std::borrow::Cow;

use portal_scrape_extract_models::{CollectedRecord, FieldValue, SENTINEL, ServiceRow};

/// Output flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// Plain text.
    Plain,
    /// Chat HTML: bold headers and values, values escaped.
    Html,
}

impl Markup {
    fn text(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::Plain => Cow::Borrowed(text),
            Self::Html => html_escape::encode_text(text),
        }
    }

    fn strong(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::Plain => Cow::Borrowed(text),
            Self::Html => Cow::Owned(format!("<b>{}</b>", html_escape::encode_text(text))),
        }
    }
}

/// Renders `record` as plain text.
#[must_use]
pub fn render(record: &CollectedRecord) -> String {
    render_as(record, Markup::Plain)
}

/// Renders `record` as chat HTML.
#[must_use]
pub fn render_html(record: &CollectedRecord) -> String {
    render_as(record, Markup::Html)
}

/// Renders `record` in the given markup flavour.
#[must_use]
pub fn render_as(record: &CollectedRecord, markup: Markup) -> String {
    let main = &record.main;
    let client = &record.client;
    let pppoe = &record.pppoe;

    let mut lines = vec![
        header(markup, "📌", "Детализация заявки"),
        field(markup, "Номер заявки", &main.request_number),
        field(markup, "Лицевой счёт", &main.account_number),
        field(markup, "Адрес подключения", &main.address),
        field(markup, "Временный пароль", &main.temp_password),
        "• Услуги:".to_owned(),
    ];
    lines.extend(services(markup, &main.services));
    lines.extend([
        String::new(),
        header(markup, "👤", "Данные клиента"),
        field(markup, "Абонентский номер", &client.abonent_number),
        field(
            markup,
            "Контактный мобильный телефон",
            &client.contact_mobile,
        ),
        field(markup, "Мобильный телефон клиента", &client.client_mobile),
        field(markup, "Фамилия", &client.lastname),
        field(markup, "Имя", &client.firstname),
        field(markup, "Отчество", &client.middlename),
        String::new(),
        header(markup, "🌐", "PPPoE"),
        field(markup, "Логин PPPoE", &pppoe.login),
        field(markup, "Пароль PPPoE", &pppoe.password),
    ]);

    lines.join("\n")
}

fn header(markup: Markup, icon: &str, title: &str) -> String {
    format!("{icon} {}", markup.strong(title))
}

fn field(markup: Markup, label: &str, value: &FieldValue) -> String {
    format!("• {label}: {}", markup.strong(value.as_str()))
}

fn services(markup: Markup, rows: &[ServiceRow]) -> Vec<String> {
    if rows.is_empty() {
        return vec![SENTINEL.to_owned()];
    }
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                "{}) Продукт — {}; Тарифный план — {}",
                i + 1,
                markup.text(row.product.as_str()),
                markup.text(row.tariff.as_str()),
            )
        })
        .collect()
}
