//! pt-BR number and currency formatting, plus HTML escaping.

use pricing_map_models::Criterion;

/// Text shown where a statistic has no rows to summarize.
pub const NOT_AVAILABLE: &str = "N/A";

/// Formats `value` with `decimals` places, `.` as the thousands separator
/// and `,` as the decimal separator: `1234.5` → `1.234,50` (for 2 places).
#[must_use]
pub fn decimal(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    if !fraction.is_empty() {
        grouped.push(',');
        grouped.push_str(fraction);
    }
    grouped
}

/// Brazilian real amount: `1234.5` → `R$ 1.234,50`.
#[must_use]
pub fn reais(value: f64) -> String {
    if value.is_finite() {
        format!("R$ {}", decimal(value, 2))
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Rounds to at most three decimals, always keeping one: `5.0` → `5.0`,
/// `2.12345` → `2.123`.
#[must_use]
pub fn rounded(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let fixed = format!("{value:.3}");
    let trimmed = fixed.trim_end_matches('0');
    let mut out = trimmed.to_string();
    if out.ends_with('.') {
        out.push('0');
    }
    if out == "-0.0" {
        out.remove(0);
    }
    out
}

/// A criterion value as shown in metrics and legend labels: currency for
/// `valor` columns, three-decimal rounding otherwise.
#[must_use]
pub fn criterion_value(criterion: Criterion, value: f64) -> String {
    if criterion.is_currency() {
        reais(value)
    } else {
        rounded(value)
    }
}

/// Like [`criterion_value`], with [`NOT_AVAILABLE`] for missing values.
#[must_use]
pub fn optional_criterion_value(criterion: Criterion, value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| criterion_value(criterion, v))
}

/// Escapes text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_examples() {
        assert_eq!(reais(1234.5), "R$ 1.234,50");
        assert_eq!(reais(0.0), "R$ 0,00");
        assert_eq!(reais(1_000_000.1), "R$ 1.000.000,10");
    }

    #[test]
    fn currency_edge_cases() {
        assert_eq!(reais(999.999), "R$ 1.000,00");
        assert_eq!(reais(100.0), "R$ 100,00");
        assert_eq!(reais(-1234.5), "R$ -1.234,50");
        assert_eq!(reais(12_345_678.9), "R$ 12.345.678,90");
        assert_eq!(reais(f64::NAN), NOT_AVAILABLE);
    }

    #[test]
    fn decimal_without_fraction() {
        assert_eq!(decimal(1_234_567.0, 0), "1.234.567");
        assert_eq!(decimal(12.345, 1), "12,3");
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        assert_eq!(rounded(5.0), "5.0");
        assert_eq!(rounded(8.0), "8.0");
        assert_eq!(rounded(2.123_45), "2.123");
        assert_eq!(rounded(2.1), "2.1");
        assert_eq!(rounded(-0.0001), "0.0");
        assert_eq!(rounded(-1.5), "-1.5");
    }

    #[test]
    fn criterion_values_follow_column_type() {
        assert_eq!(criterion_value(Criterion::ValorMedio, 1234.5), "R$ 1.234,50");
        assert_eq!(criterion_value(Criterion::NotaMedia, 6.5), "6.5");
        assert_eq!(
            optional_criterion_value(Criterion::NotaMedia, None),
            NOT_AVAILABLE
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Olho d'Água" & cia</b>"#),
            "&lt;b&gt;&quot;Olho d&#39;Água&quot; &amp; cia&lt;/b&gt;"
        );
    }
}
