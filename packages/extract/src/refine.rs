//! Post-extraction narrowing of main-page fields.
//!
//! Some values arrive with trailing text from the surrounding markup
//! ("Req123456 от 01.02.2024"). These helpers keep only the token that
//! matters. A value the pattern does not match is kept as is, and an
//! unknown value stays unknown.

use std::sync::LazyLock;

use portal_scrape_extract_models::{FieldValue, MainPageData};
use regex::Regex;

/// Request number: `Req` followed by 6+ digits, or a bare run of 6+ digits.
static REQUEST_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:Req[0-9]{6,}|[0-9]{6,})\b").expect("valid regex"));

/// Account number: a run of 4+ digits.
static ACCOUNT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{4,}\b").expect("valid regex"));

/// Temporary password: 4 to 64 ASCII letters and digits.
static TEMP_PASSWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]{4,64}").expect("valid regex"));

fn narrow(value: &FieldValue, pattern: &Regex) -> FieldValue {
    value
        .value()
        .and_then(|v| pattern.find(v))
        .map_or_else(|| value.clone(), |m| FieldValue::new(m.as_str()))
}

/// Keeps the first `Req`-prefixed or bare run of 6+ digits, else the value as is.
#[must_use]
pub fn narrow_request_number(value: &FieldValue) -> FieldValue {
    narrow(value, &REQUEST_NUMBER_RE)
}

/// Keeps the first run of 4+ digits, else the value as is.
#[must_use]
pub fn narrow_account_number(value: &FieldValue) -> FieldValue {
    narrow(value, &ACCOUNT_NUMBER_RE)
}

/// Keeps the first ASCII alphanumeric run of 4 or more, else the value as is.
#[must_use]
pub fn narrow_temp_password(value: &FieldValue) -> FieldValue {
    narrow(value, &TEMP_PASSWORD_RE)
}

/// Narrows the request number, account number and temporary password.
#[must_use]
pub fn refine(main: MainPageData) -> MainPageData {
    MainPageData {
        request_number: narrow_request_number(&main.request_number),
        account_number: narrow_account_number(&main.account_number),
        temp_password: narrow_temp_password(&main.temp_password),
        ..main
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> FieldValue {
        FieldValue::new(s)
    }

    #[test]
    fn request_number_keeps_token() {
        assert_eq!(narrow_request_number(&v("Req123456")), "Req123456");
        assert_eq!(
            narrow_request_number(&v("№Req1234567 от 01.02.2024")),
            "Req1234567"
        );
        assert_eq!(narrow_request_number(&v("Заявка 9876543")), "9876543");
    }

    #[test]
    fn request_number_is_idempotent() {
        for raw in ["Req123456 Обновить", "заявка 1234567", "без номера", "Req12"] {
            let once = narrow_request_number(&v(raw));
            assert_eq!(narrow_request_number(&once), once, "{raw}");
        }
    }

    #[test]
    fn account_number_keeps_digits() {
        assert_eq!(narrow_account_number(&v("ЛС 50012345 (осн.)")), "50012345");
        assert_eq!(narrow_account_number(&v("12")), "12");
    }

    #[test]
    fn temp_password_keeps_alphanumerics() {
        assert_eq!(narrow_temp_password(&v("Xy12ab (действует 24 ч)")), "Xy12ab");
        assert_eq!(narrow_temp_password(&v("пароль")), "пароль");
    }

    #[test]
    fn unknown_stays_unknown() {
        assert!(narrow_request_number(&FieldValue::unknown()).is_unknown());
        assert!(narrow_temp_password(&FieldValue::unknown()).is_unknown());
    }

    #[test]
    fn refine_leaves_other_fields() {
        let main = MainPageData {
            request_number: v("Req123456 Печать"),
            address: v("ул. Мира, 1"),
            ..MainPageData::default()
        };
        let refined = refine(main);
        assert_eq!(refined.request_number, "Req123456");
        assert_eq!(refined.address, "ул. Мира, 1");
        assert!(refined.account_number.is_unknown());
    }
}
