//! Amount parsing and locale-aware currency formatting.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String")]
pub struct CurrencyCode(pub String);

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("EUR")
    }
}

/// Where the currency symbol is rendered relative to the number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

/// Locale-aware formatting preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub symbol_position: SymbolPosition,
}

impl LocaleConfig {
    /// Returns formatting presets for a BCP 47 language tag.
    pub fn for_tag(tag: &str) -> Self {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let (decimal_separator, grouping_separator, symbol_position) = match language.as_str() {
            "fr" | "es" | "it" | "pt" => (',', ' ', SymbolPosition::Suffix),
            "de" | "nl" => (',', '.', SymbolPosition::Suffix),
            _ => ('.', ',', SymbolPosition::Prefix),
        };
        Self {
            language_tag: tag.to_string(),
            decimal_separator,
            grouping_separator,
            symbol_position,
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::for_tag("fr-FR")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NegativeStyle {
    Sign,
    Parentheses,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CurrencyDisplay {
    Symbol,
    Code,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatOptions {
    pub currency_display: CurrencyDisplay,
    pub negative_style: NegativeStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            currency_display: CurrencyDisplay::Symbol,
            negative_style: NegativeStyle::Sign,
        }
    }
}

/// Rounds a value to the nearest cent.
pub fn round_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Parses a user- or storage-provided amount such as `"1 234,56 €"`,
/// `"$1,234.50"` or `"(12.00)"`.
///
/// When both `,` and `.` appear, the right-most one is the decimal separator.
/// A single `,` is treated as a decimal separator; repeated separators are
/// treated as digit grouping. Returns `None` when the text holds no digits.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let first_digit = trimmed.find(|c: char| c.is_ascii_digit())?;
    let negative = (trimmed.starts_with('(') && trimmed.ends_with(')'))
        || trimmed[..first_digit].contains('-');

    let body: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.'))
        .collect();

    let commas = body.matches(',').count();
    let dots = body.matches('.').count();
    let normalized = match (body.rfind(','), body.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => body.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => body.replace(',', ""),
        (Some(_), None) if commas == 1 => body.replace(',', "."),
        (Some(_), None) => body.replace(',', ""),
        (None, Some(_)) if dots > 1 => body.replace('.', ""),
        _ => body,
    };

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Mirrors the lenient `parse || 0` rule used for stored amounts.
pub fn amount_or_zero(text: &str) -> f64 {
    parse_amount(text).unwrap_or(0.0)
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "JPY" => "¥".into(),
        "CHF" => "CHF".into(),
        "CAD" => "CA$".into(),
        "MAD" => "DH".into(),
        "XOF" => "FCFA".into(),
        _ => code.into(),
    }
}

pub fn minor_units_for(code: &str) -> u8 {
    match code {
        "JPY" | "XOF" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

pub fn format_number(locale: &LocaleConfig, value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value);
    let (int_part, fraction) = match body.split_once('.') {
        Some((int_part, fraction)) => (int_part.to_string(), Some(fraction.to_string())),
        None => (body, None),
    };
    let grouped = group_digits(&int_part, locale.grouping_separator);
    match fraction {
        Some(fraction) => format!("{}{}{}", grouped, locale.decimal_separator, fraction),
        None => grouped,
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    format!("{}{}", sign, grouped)
}

pub fn format_currency_value(
    amount: f64,
    code: &CurrencyCode,
    locale: &LocaleConfig,
    options: &FormatOptions,
) -> String {
    let precision = minor_units_for(code.as_str());
    let body = format_number(locale, amount.abs(), precision);
    let label = match options.currency_display {
        CurrencyDisplay::Symbol => symbol_for(code.as_str()),
        CurrencyDisplay::Code => code.as_str().to_string(),
    };
    let unsigned = match (locale.symbol_position, options.currency_display) {
        (SymbolPosition::Prefix, CurrencyDisplay::Symbol) => format!("{}{}", label, body),
        (SymbolPosition::Prefix, CurrencyDisplay::Code) => format!("{} {}", label, body),
        (SymbolPosition::Suffix, _) => format!("{} {}", body, label),
    };
    if amount < 0.0 && round_cents(amount) != 0.0 {
        match options.negative_style {
            NegativeStyle::Sign => format!("-{}", unsigned),
            NegativeStyle::Parentheses => format!("({})", unsigned),
        }
    } else {
        unsigned
    }
}

/// Formats a share or progress ratio (`0.0..=1.0`) as a percentage label.
pub fn format_percent(ratio: f64) -> String {
    if !ratio.is_finite() {
        return "-".into();
    }
    format!("{:.0}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_french_formatted_amounts() {
        assert_eq!(parse_amount("1 234,56 €"), Some(1234.56));
        assert_eq!(parse_amount("1\u{a0}500,00\u{a0}€"), Some(1500.0));
        assert_eq!(parse_amount("12,5"), Some(12.5));
    }

    #[test]
    fn parses_english_formatted_amounts() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("1,234,567"), Some(1234567.0));
        assert_eq!(parse_amount("1.234.567,89"), Some(1234567.89));
    }

    #[test]
    fn parses_negative_forms() {
        assert_eq!(parse_amount("-45"), Some(-45.0));
        assert_eq!(parse_amount("(12.00)"), Some(-12.0));
        assert_eq!(parse_amount("€ -3,10"), Some(-3.1));
    }

    #[test]
    fn rejects_text_without_digits() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc €"), None);
        assert_eq!(amount_or_zero("NaN"), 0.0);
    }

    #[test]
    fn formats_with_locale_presets() {
        let fr = LocaleConfig::for_tag("fr-FR");
        let en = LocaleConfig::for_tag("en-US");
        let options = FormatOptions::default();
        let eur = CurrencyCode::new("eur");
        let usd = CurrencyCode::new("USD");
        assert_eq!(
            format_currency_value(1234.5, &eur, &fr, &options),
            "1 234,50 €"
        );
        assert_eq!(
            format_currency_value(-1234.5, &usd, &en, &options),
            "-$1,234.50"
        );
        let parens = FormatOptions {
            negative_style: NegativeStyle::Parentheses,
            ..options
        };
        assert_eq!(format_currency_value(-5.0, &usd, &en, &parens), "($5.00)");
    }

    #[test]
    fn stored_codes_are_normalised() {
        let code: CurrencyCode = serde_json::from_str(r#"" eur""#).unwrap();
        assert_eq!(code, CurrencyCode::new("EUR"));
        let fr = LocaleConfig::for_tag("fr-FR");
        assert_eq!(
            format_currency_value(2.0, &code, &fr, &FormatOptions::default()),
            "2,00 €"
        );
    }

    #[test]
    fn round_cents_discards_float_noise() {
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(f64::NAN), 0.0);
    }
}
