// Cell parsing for sales exports (dates, money) plus the formatting used by
// the console and PDF renderings: grouped EUR amounts, Latin-1 clean-up and
// the text bars of the console charts.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

// Slash and dot forms are month-first, like the pandas reading of these files.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m.%d.%Y"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// Currency suffix used in every rendered amount.
pub const CURRENCY: &str = "EUR";

// Longest first so `US$` is not read as `US` + `$`.
const CURRENCY_MARKS: [&str; 7] = ["US$", "EUR", "USD", "GBP", "€", "$", "£"];

/// Parse the date formats typically found in payment/e-commerce exports.
///
/// Timestamps keep their local calendar date; an offset never moves a sale
/// into another day.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in &DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in &DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // Shopify: `2024-03-01 10:15:00 +0100`, Stripe: RFC 3339.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.date_naive());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn strip_prefix_ci<'a>(s: &'a str, mark: &str) -> Option<&'a str> {
    s.get(..mark.len())
        .filter(|head| head.eq_ignore_ascii_case(mark))
        .map(|_| &s[mark.len()..])
}

fn strip_suffix_ci<'a>(s: &'a str, mark: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(mark.len())?;
    s.get(cut..)
        .filter(|tail| tail.eq_ignore_ascii_case(mark))
        .map(|_| &s[..cut])
}

/// Remove currency symbols/codes sitting at either end of the cell.
fn strip_currency(s: &str) -> &str {
    let mut s = s.trim();
    loop {
        let before = s.len();
        for mark in CURRENCY_MARKS {
            if let Some(rest) = strip_prefix_ci(s, mark) {
                s = rest.trim_start();
            }
            if let Some(rest) = strip_suffix_ci(s, mark) {
                s = rest.trim_end();
            }
        }
        if s.len() == before {
            return s;
        }
    }
}

/// `1,234,567` style grouping: a 1-3 digit head, then groups of exactly three.
fn valid_grouping(int_part: &str) -> bool {
    let mut groups = int_part.split(',');
    let head_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    head_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a money cell into an exact decimal.
///
/// - Currency symbols/codes (`€`, `$`, `£`, `EUR`, `USD`, `GBP`) at either end are ignored.
/// - `,` is only accepted as a thousands separator (`1,234.50`); `12,50` is rejected.
/// - Scientific notation (`1e3`, `1.5E+03`) is accepted.
/// - `(12.50)` and a leading `-` are read as negatives.
/// - Any other letter, inner whitespace or misplaced sign makes the cell invalid.
pub fn parse_amount(s: Option<&str>) -> Option<Decimal> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let (parenthesised, s) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let mut body = strip_currency(s);
    let mut negative = false;
    if let Some(rest) = body.strip_prefix('-') {
        negative = true;
        body = strip_currency(rest);
    } else if let Some(rest) = body.strip_prefix('+') {
        body = strip_currency(rest);
    }
    if body.is_empty() || !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    if !mantissa.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b',') {
        return None;
    }
    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    let int_part = mantissa.split('.').next().unwrap_or("");
    if mantissa.contains(',') && !valid_grouping(int_part) {
        return None;
    }
    let mantissa = mantissa.replace(',', "");

    let amount = match exponent {
        Some(exp) => Decimal::from_scientific(&format!("{}e{}", mantissa, exp)).ok()?,
        None => mantissa.parse::<Decimal>().ok()?,
    };
    if (negative || parenthesised) && amount > Decimal::ZERO {
        Some(-amount)
    } else {
        Some(amount)
    }
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Round to `decimals` places and group the integer digits with commas.
pub fn format_number(n: Decimal, decimals: u32) -> String {
    let rounded = n.round_dp(decimals);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let fixed = format!("{:.*}", decimals as usize, rounded.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = whole
        .parse::<i128>()
        .map_or_else(|_| whole.to_string(), |w| w.to_formatted_string(&Locale::en));
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

/// `1234.5` -> `1,234.50 EUR`
pub fn format_eur(n: Decimal) -> String {
    format!("{} {}", format_number(n, 2), CURRENCY)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Map text onto what a Latin-1 (WinAnsi) PDF font can draw.
///
/// Returns the cleaned text and how many characters had to be replaced.
pub fn sanitize_latin1(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut replaced = 0usize;
    for c in text.chars() {
        if (c as u32) <= 0xFF {
            out.push(c);
            continue;
        }
        replaced += 1;
        match c {
            '€' => out.push_str(CURRENCY),
            '‘' | '’' | '‚' | '′' => out.push('\''),
            '“' | '”' | '„' | '″' => out.push('"'),
            '–' | '—' | '‐' | '−' => out.push('-'),
            '…' => out.push_str("..."),
            '•' => out.push('-'),
            '\u{2009}' | '\u{202F}' | '\u{2007}' => out.push(' '),
            _ => out.push('?'),
        }
    }
    (out, replaced)
}

/// Horizontal bar scaled against `max`, used for the console charts.
pub fn text_bar(value: Decimal, max: Decimal, width: usize) -> String {
    if max <= Decimal::ZERO || value <= Decimal::ZERO {
        return String::new();
    }
    // value <= max, so the ratio stays in 0..=1 and the product cannot overflow.
    let cells = (value / max * Decimal::from(width as u64))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(width);
    "█".repeat(cells.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_export_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        for raw in [
            "2024-01-05",
            "2024/01/05",
            "01/05/2024",
            "01.05.2024",
            "2024-01-05 10:30:00",
            "2024-01-05T10:30:00",
            "2024-01-05 10:30:00 +0100",
            "2024-01-05T10:30:00Z",
            " 2024-01-05 ",
        ] {
            assert_eq!(parse_date_safe(Some(raw)), Some(expected), "{raw}");
        }
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(parse_date_safe(Some("N/A")), None);
        assert_eq!(parse_date_safe(Some("")), None);
        assert_eq!(parse_date_safe(Some("2024-13-01")), None);
        assert_eq!(parse_date_safe(None), None);
    }

    #[test]
    fn dotted_dates_are_month_first() {
        assert_eq!(
            parse_date_safe(Some("05.01.2024")),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(parse_date_safe(Some("25.01.2024")), None);
    }

    #[test]
    fn parses_amounts_leniently() {
        assert_eq!(parse_amount(Some("100")), Some(d("100")));
        assert_eq!(parse_amount(Some(" 1,234.50 ")), Some(d("1234.50")));
        assert_eq!(parse_amount(Some("€19.99")), Some(d("19.99")));
        assert_eq!(parse_amount(Some("$ 5.00")), Some(d("5.00")));
        assert_eq!(parse_amount(Some("(12.50)")), Some(d("-12.50")));
        assert_eq!(parse_amount(Some("-3")), Some(d("-3")));
        assert_eq!(parse_amount(Some("")), None);
        assert_eq!(parse_amount(Some("n/a")), None);
        assert_eq!(parse_amount(None), None);
    }

    #[test]
    fn strips_only_currency_marks() {
        assert_eq!(parse_amount(Some("19.99 EUR")), Some(d("19.99")));
        assert_eq!(parse_amount(Some("usd 7")), Some(d("7")));
        assert_eq!(parse_amount(Some("£1,000")), Some(d("1000")));
        assert_eq!(parse_amount(Some("-€5.50")), Some(d("-5.50")));
        assert_eq!(parse_amount(Some("€-5.50")), Some(d("-5.50")));
        assert_eq!(parse_amount(Some("+4")), Some(d("4")));
    }

    #[test]
    fn reads_scientific_notation() {
        assert_eq!(parse_amount(Some("1e3")), Some(d("1000")));
        assert_eq!(parse_amount(Some("1.5E+03")), Some(d("1500")));
        assert_eq!(parse_amount(Some("2.5e-1")), Some(d("0.25")));
        assert_eq!(parse_amount(Some("1e")), None);
        assert_eq!(parse_amount(Some("1e99")), None);
    }

    #[test]
    fn rejects_cells_that_are_not_plain_amounts() {
        assert_eq!(parse_amount(Some("12,50")), None);
        assert_eq!(parse_amount(Some("1,23,456")), None);
        assert_eq!(parse_amount(Some("SKU-7: 20")), None);
        assert_eq!(parse_amount(Some("12 abc 3")), None);
        assert_eq!(parse_amount(Some("12 3")), None);
        assert_eq!(parse_amount(Some("5-3")), None);
        assert_eq!(parse_amount(Some("--5")), None);
        assert_eq!(parse_amount(Some("1.2.3")), None);
    }

    #[test]
    fn month_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(month_key(date), "2024-03");
    }

    #[test]
    fn formats_with_grouping_and_two_decimals() {
        assert_eq!(format_number(d("1234567.891"), 2), "1,234,567.89");
        assert_eq!(format_number(d("350"), 2), "350.00");
        assert_eq!(format_number(d("-1500.5"), 2), "-1,500.50");
        assert_eq!(format_number(d("-0.001"), 2), "0.00");
        assert_eq!(format_eur(d("1234.5")), "1,234.50 EUR");
    }

    #[test]
    fn sanitizes_non_latin1_text() {
        let (clean, replaced) = sanitize_latin1("Résumé général : 12 € – “top” …");
        assert_eq!(clean, "Résumé général : 12 EUR - \"top\" ...");
        assert_eq!(replaced, 5);

        let (clean, replaced) = sanitize_latin1("Café 📈");
        assert_eq!(clean, "Café ?");
        assert_eq!(replaced, 1);
    }

    #[test]
    fn bars_scale_to_width() {
        assert_eq!(text_bar(d("50"), d("100"), 10).chars().count(), 5);
        assert_eq!(text_bar(d("100"), d("100"), 10).chars().count(), 10);
        assert_eq!(text_bar(d("0.01"), d("100"), 10).chars().count(), 1);
        assert_eq!(text_bar(d("0"), d("100"), 10), "");
        let huge = Decimal::MAX;
        assert_eq!(text_bar(huge, huge, 10).chars().count(), 10);
    }
}
