//! Number formatting for table cells and chart summaries.
//!
//! All measure values shown to the user go through this module so tables and
//! trend summaries agree, and so European-style output (swapping `.` and `,`)
//! can be switched on in one place.

/// Swap `.` and `,` in an already formatted number.
fn europeanize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '.' => ',',
            ',' => '.',
            other => other,
        })
        .collect()
}

#[inline]
fn maybe_eu(s: String, european: bool) -> String {
    if european { europeanize(&s) } else { s }
}

/// Insert `,` every three digits of an unsigned integer string.
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format with thousands separators and a fixed number of decimals.
fn grouped(n: f64, decimals: usize) -> String {
    let s = format!("{:.prec$}", n.abs(), prec = decimals);
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s.as_str(), None),
    };
    let sign = if n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac {
        Some(frac) => format!("{sign}{}.{frac}", group_digits(int)),
        None => format!("{sign}{}", group_digits(int)),
    }
}

/// Prefix `+` unless the formatted value already carries a `-`.
fn signed(s: String) -> String {
    if s.starts_with('-') { s } else { format!("+{s}") }
}

/// Currency amount, whole units with thousands separators.
///
/// # Examples
/// ```
/// use dashboard_types::formatting::format_currency;
/// assert_eq!(format_currency(1_234_567.4, false), "$1,234,567");
/// assert_eq!(format_currency(-950.0, false), "-$950");
/// assert_eq!(format_currency(1_234_567.0, true), "$1.234.567");
/// ```
pub fn format_currency(n: f64, european: bool) -> String {
    let s = grouped(n, 0);
    let s = match s.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${s}"),
    };
    maybe_eu(s, european)
}

/// Currency difference, always signed.
///
/// # Examples
/// ```
/// use dashboard_types::formatting::format_signed_currency;
/// assert_eq!(format_signed_currency(200.0, false), "+$200");
/// assert_eq!(format_signed_currency(-1_200.0, false), "-$1,200");
/// ```
pub fn format_signed_currency(n: f64, european: bool) -> String {
    signed(format_currency(n, european))
}

/// Plain number: whole values without decimals, fractional values with two.
///
/// # Examples
/// ```
/// use dashboard_types::formatting::format_number;
/// assert_eq!(format_number(12_500.0, false), "12,500");
/// assert_eq!(format_number(3.14159, false), "3.14");
/// assert_eq!(format_number(3.14159, true), "3,14");
/// ```
pub fn format_number(n: f64, european: bool) -> String {
    let decimals = if n.fract() == 0.0 { 0 } else { 2 };
    maybe_eu(grouped(n, decimals), european)
}

/// Number difference, always signed.
pub fn format_signed_number(n: f64, european: bool) -> String {
    signed(format_number(n, european))
}

/// Percentage change with one decimal place and an explicit sign. The input
/// is already in percent units.
///
/// # Examples
/// ```
/// use dashboard_types::formatting::format_percent;
/// assert_eq!(format_percent(12.345, false), "+12.3%");
/// assert_eq!(format_percent(-4.0, true), "-4,0%");
/// ```
pub fn format_percent(n: f64, european: bool) -> String {
    maybe_eu(signed(format!("{:.1}%", n)), european)
}

/// Compact K/M form used in chart summaries.
///
/// # Examples
/// ```
/// use dashboard_types::formatting::format_compact;
/// assert_eq!(format_compact(950.0, false), "950");
/// assert_eq!(format_compact(1_500.0, false), "1.50K");
/// assert_eq!(format_compact(-2_500_000.0, false), "-2.50M");
/// ```
pub fn format_compact(n: f64, european: bool) -> String {
    let abs = n.abs();
    let s = if abs >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.0}", n)
    };
    maybe_eu(s, european)
}
