//! Display formatting shared by pages, charts and the console summary.

pub const MISSING: &str = "—";

fn group_thousands(int_part: &str) -> String {
    let bytes = int_part.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}

/// Fixed-point number with thousands separators.
pub fn number(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value.abs());
    let (int_part, frac) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    let mut out = String::new();
    if value < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(f) = frac {
        out.push('.');
        out.push_str(f);
    }
    out
}

pub fn currency(value: f64) -> String {
    let n = number(value, 2);
    match n.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", n),
    }
}

pub fn currency_opt(value: Option<f64>) -> String {
    value.map(currency).unwrap_or_else(|| MISSING.to_string())
}

/// A value already expressed in percent.
pub fn pct(value: f64) -> String {
    format!("{}%", number(value, 1))
}

pub fn pct_opt(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| MISSING.to_string())
}

pub fn pct2_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{}%", number(v, 2)))
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn ratio_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_infinite() => "∞".to_string(),
        Some(v) => format!("{:.3}", v),
        None => MISSING.to_string(),
    }
}

pub fn count(n: usize) -> String {
    group_thousands(&n.to_string())
}

pub fn p_value(p: f64) -> String {
    if p < 0.0001 {
        "<0.0001".to_string()
    } else {
        format!("{:.4}", p)
    }
}

/// Short axis label: 1234 -> 1.2k, 2500000 -> 2.5M.
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        format!("{}{:.1}M", sign, abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{}{:.1}k", sign, abs / 1_000.0)
    } else if abs >= 10.0 || abs == 0.0 {
        format!("{}{:.0}", sign, abs)
    } else {
        format!("{}{:.2}", sign, abs)
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_and_signs() {
        assert_eq!(currency(1234567.891), "$1,234,567.89");
        assert_eq!(currency(-42.5), "-$42.50");
        assert_eq!(currency(0.0), "$0.00");
        assert_eq!(currency(-0.001), "$0.00");
        assert_eq!(currency(999.999), "$1,000.00");
        assert_eq!(currency_opt(None), MISSING);
    }

    #[test]
    fn percentages_and_ratios() {
        assert_eq!(pct(45.678), "45.7%");
        assert_eq!(pct2_opt(Some(1.234)), "1.23%");
        assert_eq!(ratio_opt(Some(0.12345)), "0.123");
        assert_eq!(ratio_opt(Some(f64::INFINITY)), "∞");
        assert_eq!(ratio_opt(None), MISSING);
    }

    #[test]
    fn counts_and_compact() {
        assert_eq!(count(1234567), "1,234,567");
        assert_eq!(count(12), "12");
        assert_eq!(compact(1234.0), "1.2k");
        assert_eq!(compact(-2_500_000.0), "-2.5M");
        assert_eq!(compact(42.0), "42");
        assert_eq!(compact(0.5), "0.50");
    }

    #[test]
    fn p_values() {
        assert_eq!(p_value(0.00001), "<0.0001");
        assert_eq!(p_value(0.04321), "0.0432");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
