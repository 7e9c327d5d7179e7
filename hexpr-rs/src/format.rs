//! Rendering values as text.
//!
//! [`Value::render`] accepts a C `printf` format, one of the named formats
//! `hex`, `bin` and `oct` for integers, a `strftime` format for dates, or
//! nothing at all, in which case the per-type default from
//! [`FormatConfig`] applies.

use chrono::format::{Item, StrftimeItems};

use crate::config::FormatConfig;
use crate::datetime::{self, INVALID_DATE_TEXT};
use crate::expr::Value;

/// Rendered when a date format string can't be parsed.
pub const INVALID_FORMAT_TEXT: &str = "##Invalid format##";

/// Word pairs recognised as boolean formats, as (false, true).
const BOOL_WORDS: &[(&str, &str)] = &[
    ("f", "t"),
    ("F", "T"),
    ("false", "true"),
    ("n", "y"),
    ("N", "Y"),
    ("no", "yes"),
    ("NO", "YES"),
    ("off", "on"),
    ("OFF", "ON"),
    ("0", "1"),
];

impl Value {
    /// Render for display.
    ///
    /// `size` is the width in bytes of the field the value came from (or
    /// `-1` when unknown); it picks the precision of unformatted reals and
    /// the minimum width of `hex`/`bin`/`oct`.  `unsigned` makes plain
    /// integer output treat the bits as unsigned.
    pub fn render(&self, format: &str, size: i32, unsigned: bool, cfg: &FormatConfig) -> String {
        match self {
            Value::None | Value::Blob | Value::Struct | Value::Array => String::new(),
            Value::Bool(b) => render_bool(*b, format),
            Value::Int(n) => render_int(*n, format, size, unsigned, cfg),
            Value::Real(x) => render_real(*x, format, size, cfg),
            Value::Date(d) => render_date(*d, format, cfg),
            Value::Str(s) => render_str(s, format, cfg),
        }
    }
}

fn render_bool(b: bool, format: &str) -> String {
    let (f, t) = BOOL_WORDS
        .iter()
        .find(|(f, _)| *f == format)
        .copied()
        .unwrap_or(("FALSE", "TRUE"));
    if b { t } else { f }.to_owned()
}

fn render_int(n: i64, format: &str, size: i32, unsigned: bool, cfg: &FormatConfig) -> String {
    let bytes = usize::try_from(size).unwrap_or(0);
    match format {
        "" => {
            let default = if unsigned && !cfg.unsigned_format.is_empty() {
                &cfg.unsigned_format
            } else {
                &cfg.int_format
            };
            if default.is_empty() {
                grouped_decimal(n, unsigned, cfg)
            } else {
                render_int(n, default, size, unsigned, cfg)
            }
        }
        "hex" => {
            let digits = format!("{:0width$x}", n as u64, width = bytes * 2);
            group_right(&digits, ' ', 2)
        }
        "bin" => {
            let significant = 64 - (n as u64).leading_zeros() as usize;
            bin_str(n, (bytes * 8).max(significant).max(1) as u32)
        }
        "oct" => {
            let digits = format!("{:0width$o}", n as u64, width = (bytes * 8).div_ceil(3));
            add_spaces(&digits)
        }
        f if f.contains('%') => sprintf(f, &Arg::Int(n)),
        _ => grouped_decimal(n, unsigned, cfg),
    }
}

fn grouped_decimal(n: i64, unsigned: bool, cfg: &FormatConfig) -> String {
    let digits = if unsigned {
        (n as u64).to_string()
    } else {
        n.to_string()
    };
    add_commas(&digits, cfg.group_char, cfg.group_size)
}

fn render_real(x: f64, format: &str, size: i32, cfg: &FormatConfig) -> String {
    if format.is_empty() && !cfg.real_format.is_empty() {
        return render_real(x, &cfg.real_format, size, cfg);
    }
    let text = if format.contains('%') {
        sprintf(format, &Arg::Real(x))
    } else if x.is_nan() {
        return "NaN".to_owned();
    } else if x.is_infinite() {
        return if x > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    } else {
        let digits = if size == 4 { "%.7g" } else { "%.15g" };
        sprintf(digits, &Arg::Real(x))
    };
    if cfg.decimal_point == '.' {
        text
    } else {
        text.replace('.', &cfg.decimal_point.to_string())
    }
}

fn render_date(d: f64, format: &str, cfg: &FormatConfig) -> String {
    let Some(when) = datetime::ole_to_naive(d) else {
        return INVALID_DATE_TEXT.to_owned();
    };
    let format = if format.is_empty() {
        cfg.date_format.as_str()
    } else {
        format
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return INVALID_FORMAT_TEXT.to_owned();
    }
    when.format_with_items(items.iter()).to_string()
}

fn render_str(s: &str, format: &str, cfg: &FormatConfig) -> String {
    let format = if format.is_empty() {
        cfg.string_format.as_str()
    } else {
        format
    };
    if format.contains('%') {
        sprintf(format, &Arg::Str(s))
    } else {
        s.to_owned()
    }
}

// ── Digit grouping ────────────────────────────────────────────────────────────

/// Insert `sep` every `group` digits of the leading number in `s`.
///
/// Leading blanks are dropped; a leading sign and anything after the digits
/// (a fraction, trailing blanks) are kept as they are.
pub fn add_commas(s: &str, sep: char, group: usize) -> String {
    group_leading(s, sep, group, |c| c.is_ascii_digit())
}

/// Insert a space every four digits of the leading hex or octal number in
/// `s`.
pub fn add_spaces(s: &str) -> String {
    group_leading(s, ' ', 4, |c| c.is_ascii_hexdigit())
}

fn group_leading(s: &str, sep: char, group: usize, is_digit: fn(char) -> bool) -> String {
    let s = s.trim_start();
    let (sign, rest) = match s.strip_prefix(['+', '-']) {
        Some(rest) => (&s[..1], rest),
        None => ("", s),
    };
    let end = rest.find(|c: char| !is_digit(c)).unwrap_or(rest.len());
    let (digits, tail) = rest.split_at(end);
    format!("{sign}{}{tail}", group_right(digits, sep, group))
}

/// Insert `sep` every `group` characters counting from the right.
fn group_right(digits: &str, sep: char, group: usize) -> String {
    if group == 0 {
        return digits.to_owned();
    }
    let n = digits.chars().count();
    let mut out = String::with_capacity(n + n / group);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (n - i) % group == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// The low `bits` bits of `value` in binary, in groups of eight.
pub fn bin_str(value: i64, bits: u32) -> String {
    let bits = bits.clamp(1, 64);
    let masked = if bits == 64 {
        value as u64
    } else {
        value as u64 & ((1u64 << bits) - 1)
    };
    let digits = format!("{masked:0width$b}", width = bits as usize);
    group_right(&digits, ' ', 8)
}

/// Parse the leading integer of `s` in `radix` (0 means 10).
///
/// Leading blanks and one sign are accepted.  Punctuation between digits is
/// skipped; parsing stops at the first letter or digit that isn't valid in
/// the radix.  The result saturates at the `i64` range.
pub fn parse_int_prefix(s: &str, radix: u32) -> i64 {
    let radix = if radix == 0 { 10 } else { radix.clamp(2, 36) };
    let s = s.trim_start();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let mut acc: i128 = 0;
    for c in rest.chars() {
        match c.to_digit(radix) {
            Some(d) => {
                acc = (acc * i128::from(radix) + i128::from(d)).min(i128::from(u64::MAX));
            }
            None if c.is_alphanumeric() => break,
            None => {}
        }
    }
    let signed = if negative { -acc } else { acc };
    signed.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

// ── printf ────────────────────────────────────────────────────────────────────

/// The single argument a format string is applied to.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Int(i64),
    Real(f64),
    Str(&'a str),
}

#[derive(Debug, Default)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
    width: usize,
    prec: Option<usize>,
    conv: char,
}

/// Apply a C `printf` format to one argument.  Every conversion in the
/// format receives the same argument; unknown conversions are copied
/// through.
pub fn sprintf(format: &str, arg: &Arg<'_>) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        let mut spec = Spec::default();
        while let Some(&c) = chars.get(i) {
            match c {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '#' => spec.alt = true,
                '0' => spec.zero = true,
                _ => break,
            }
            i += 1;
        }
        while let Some(d) = chars.get(i).and_then(|c| c.to_digit(10)) {
            spec.width = spec.width * 10 + d as usize;
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let mut p = 0;
            while let Some(d) = chars.get(i).and_then(|c| c.to_digit(10)) {
                p = p * 10 + d as usize;
                i += 1;
            }
            spec.prec = Some(p);
        }
        // Length modifiers don't matter: every integer is 64 bits.
        while let Some(&c) = chars.get(i) {
            match c {
                'h' | 'l' | 'L' | 'q' | 'j' | 'z' | 't' | 'w' => i += 1,
                'I' => {
                    i += 1;
                    while chars.get(i).is_some_and(char::is_ascii_digit) {
                        i += 1;
                    }
                }
                _ => break,
            }
        }
        let Some(&conv) = chars.get(i) else {
            out.extend(&chars[start..]);
            break;
        };
        i += 1;
        spec.conv = conv;
        match conv {
            '%' => out.push('%'),
            'd' | 'i' | 'u' | 'x' | 'X' | 'o' | 'c' => out.push_str(&spec.int(arg_int(arg))),
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'a' | 'A' => out.push_str(&spec.real(arg_real(arg))),
            's' => out.push_str(&spec.string(arg)),
            _ => out.extend(&chars[start..i]),
        }
    }
    out
}

fn arg_int(arg: &Arg<'_>) -> i64 {
    match arg {
        Arg::Int(n) => *n,
        Arg::Real(x) => *x as i64,
        Arg::Str(_) => 0,
    }
}

fn arg_real(arg: &Arg<'_>) -> f64 {
    match arg {
        Arg::Int(n) => *n as f64,
        Arg::Real(x) => *x,
        Arg::Str(_) => 0.0,
    }
}

impl Spec {
    fn int(&self, n: i64) -> String {
        if self.conv == 'c' {
            let c = u32::try_from(n).ok().and_then(char::from_u32).unwrap_or('?');
            return self.pad("", c.to_string(), false);
        }
        let (mut sign, mut digits) = match self.conv {
            'd' | 'i' => {
                let sign = if n < 0 {
                    "-"
                } else if self.plus {
                    "+"
                } else if self.space {
                    " "
                } else {
                    ""
                };
                (sign, n.unsigned_abs().to_string())
            }
            'u' => ("", (n as u64).to_string()),
            'x' => ("", format!("{:x}", n as u64)),
            'X' => ("", format!("{:X}", n as u64)),
            _ => ("", format!("{:o}", n as u64)),
        };
        if let Some(p) = self.prec {
            if p == 0 && n == 0 {
                digits.clear();
            } else if digits.len() < p {
                digits = format!("{}{digits}", "0".repeat(p - digits.len()));
            }
        }
        if self.alt && n != 0 {
            match self.conv {
                'x' => sign = "0x",
                'X' => sign = "0X",
                'o' if !digits.starts_with('0') => digits.insert(0, '0'),
                _ => {}
            }
        }
        self.pad(sign, digits, self.prec.is_none())
    }

    fn real(&self, x: f64) -> String {
        let upper = self.conv.is_ascii_uppercase();
        let sign = if x.is_sign_negative() && !x.is_nan() {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        };
        let a = x.abs();
        if !a.is_finite() {
            let word = if a.is_nan() { "nan" } else { "inf" };
            let word = if upper { word.to_uppercase() } else { word.to_owned() };
            return self.pad(sign, word, false);
        }
        let body = match self.conv.to_ascii_lowercase() {
            'f' => format!("{:.*}", self.prec.unwrap_or(6), a),
            'e' => fmt_exp(a, self.prec.unwrap_or(6)),
            'g' => fmt_general(a, self.prec.unwrap_or(6), self.alt),
            _ => fmt_hex_float(a, self.prec),
        };
        let (sign, body) = if self.conv.to_ascii_lowercase() == 'a' {
            // The zero padding goes after the `0x`.
            (format!("{sign}{}", &body[..2]), body[2..].to_owned())
        } else {
            (sign.to_owned(), body)
        };
        let text = self.pad(&sign, body, true);
        if upper {
            text.to_uppercase()
        } else {
            text
        }
    }

    fn string(&self, arg: &Arg<'_>) -> String {
        let s = match arg {
            Arg::Str(s) => (*s).to_owned(),
            Arg::Int(n) => n.to_string(),
            Arg::Real(x) => x.to_string(),
        };
        let s = match self.prec {
            Some(p) => s.chars().take(p).collect(),
            None => s,
        };
        self.pad("", s, false)
    }

    /// Justify `prefix` + `body` within the field width.
    fn pad(&self, prefix: &str, body: String, zero_ok: bool) -> String {
        let len = prefix.chars().count() + body.chars().count();
        if len >= self.width {
            return format!("{prefix}{body}");
        }
        let fill = self.width - len;
        if self.left {
            format!("{prefix}{body}{}", " ".repeat(fill))
        } else if self.zero && zero_ok {
            format!("{prefix}{}{body}", "0".repeat(fill))
        } else {
            format!("{}{prefix}{body}", " ".repeat(fill))
        }
    }
}

/// `%e` body for a non-negative finite value: at least two exponent digits.
fn fmt_exp(a: f64, prec: usize) -> String {
    let s = format!("{a:.prec$e}");
    let (mantissa, exp) = s.split_once('e').unwrap_or((&s, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

/// `%g`: `%e` or `%f` by exponent, trailing zeros removed unless `alt`.
fn fmt_general(a: f64, prec: usize, alt: bool) -> String {
    let p = prec.max(1);
    let exp = if a == 0.0 {
        0
    } else {
        let s = format!("{a:.*e}", p - 1);
        s.split_once('e').and_then(|(_, e)| e.parse::<i32>().ok()).unwrap_or(0)
    };
    let mut s = if exp < -4 || exp >= p as i32 {
        fmt_exp(a, p - 1)
    } else {
        format!("{a:.*}", (p as i32 - 1 - exp).max(0) as usize)
    };
    if !alt {
        let (mantissa, exp_part) = match s.find('e') {
            Some(at) => s.split_at(at),
            None => (s.as_str(), ""),
        };
        if mantissa.contains('.') {
            let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
            s = format!("{trimmed}{exp_part}");
        }
    }
    s
}

/// `%a` body for a non-negative finite value.  Without a precision all
/// thirteen fraction digits are shown.
fn fmt_hex_float(a: f64, prec: Option<usize>) -> String {
    const FRACTION_DIGITS: usize = 13;
    let bits = a.to_bits();
    let biased = ((bits >> 52) & 0x7FF) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mut lead, exp) = match (biased, fraction) {
        (0, 0) => (0u64, 0i64),
        (0, _) => (0, -1022),
        (b, _) => (1, b - 1023),
    };
    let digits = prec.unwrap_or(FRACTION_DIGITS);
    let frac_text = if digits >= FRACTION_DIGITS {
        format!("{fraction:013x}{}", "0".repeat(digits - FRACTION_DIGITS))
    } else {
        let shift = (FRACTION_DIGITS - digits) * 4;
        let mut kept = fraction >> shift;
        let rest = fraction & ((1u64 << shift) - 1);
        let half = 1u64 << (shift - 1);
        if rest > half || (rest == half && kept & 1 == 1) {
            kept += 1;
            if kept >> (digits * 4) != 0 {
                kept = 0;
                lead += 1;
            }
        }
        if digits == 0 {
            String::new()
        } else {
            format!("{kept:0digits$x}")
        }
    };
    let point = if frac_text.is_empty() { "" } else { "." };
    format!("0x{lead}{point}{frac_text}p{exp:+}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printf_integers() {
        assert_eq!(sprintf("%d", &Arg::Int(-1)), "-1");
        assert_eq!(sprintf("%u", &Arg::Int(-1)), "18446744073709551615");
        assert_eq!(sprintf("%X", &Arg::Int(95)), "5F");
        assert_eq!(sprintf("%#06x", &Arg::Int(255)), "0x00ff");
        assert_eq!(sprintf("[%-5d]", &Arg::Int(42)), "[42   ]");
        assert_eq!(sprintf("%+.3d", &Arg::Int(7)), "+007");
        assert_eq!(sprintf("%c%c", &Arg::Int(65)), "AA");
        assert_eq!(sprintf("100%%", &Arg::Int(0)), "100%");
        assert_eq!(sprintf("%I64d", &Arg::Int(5)), "5");
    }

    #[test]
    fn printf_reals() {
        assert_eq!(sprintf("%f", &Arg::Real(123.456)), "123.456000");
        assert_eq!(sprintf("%e", &Arg::Real(123.456)), "1.234560e+02");
        assert_eq!(sprintf("%E", &Arg::Real(0.000123)), "1.230000E-04");
        assert_eq!(sprintf("%g", &Arg::Real(1.234567)), "1.23457");
        assert_eq!(sprintf("%g", &Arg::Real(100000.0)), "100000");
        assert_eq!(sprintf("%g", &Arg::Real(1e-5)), "1e-05");
        assert_eq!(sprintf("%.15g", &Arg::Real(0.1)), "0.1");
        assert_eq!(sprintf("%08.2f", &Arg::Real(-3.14159)), "-0003.14");
        assert_eq!(sprintf("%a", &Arg::Real(15.625)), "0x1.f400000000000p+3");
        assert_eq!(sprintf("%A", &Arg::Real(15.625)), "0X1.F400000000000P+3");
        assert_eq!(sprintf("%.1a", &Arg::Real(1.0)), "0x1.0p+0");
        assert_eq!(sprintf("%f", &Arg::Real(f64::NAN)), "nan");
    }

    #[test]
    fn printf_strings() {
        assert_eq!(sprintf("\"%s\"", &Arg::Str("abc")), "\"abc\"");
        assert_eq!(sprintf("%5.2s|", &Arg::Str("abc")), "   ab|");
        assert_eq!(sprintf("%q", &Arg::Str("abc")), "%q");
    }

    #[test]
    fn grouping_helpers() {
        assert_eq!(add_commas("-123456", '_', 3), "-123_456");
        assert_eq!(add_commas("1234.5678", ',', 3), "1,234.5678");
        assert_eq!(add_spaces("ffffffff"), "ffff ffff");
        assert_eq!(bin_str(0xAA55, 16), "10101010 01010101");
        assert_eq!(bin_str(5, 12), "0000 00000101");
    }

    #[test]
    fn int_prefix() {
        assert_eq!(parse_int_prefix("  -42abc", 10), -42);
        assert_eq!(parse_int_prefix("ff", 16), 255);
        assert_eq!(parse_int_prefix("1,000", 0), 1000);
        assert_eq!(parse_int_prefix("99999999999999999999", 10), i64::MAX);
        assert_eq!(parse_int_prefix("-99999999999999999999", 10), i64::MIN);
    }

    #[test]
    fn bool_words() {
        let cfg = FormatConfig::default();
        assert_eq!(Value::Bool(true).render("yes", -1, false, &cfg), "TRUE");
        assert_eq!(Value::Bool(true).render("no", -1, false, &cfg), "yes");
        assert_eq!(Value::Bool(false).render("OFF", -1, false, &cfg), "OFF");
    }

    #[test]
    fn decimal_point_follows_config() {
        let cfg = FormatConfig {
            decimal_point: ',',
            ..FormatConfig::default()
        };
        assert_eq!(Value::Real(1.5).render("", 8, false, &cfg), "1,5");
    }
}
