/// Rendering evaluated values for display.
use hexpr::config::FormatConfig;
use hexpr::expr::{Evaluator, Value};
use hexpr::format::{INVALID_FORMAT_TEXT, sprintf, Arg};

fn render(v: Value, format: &str, size: i32) -> String {
    v.render(format, size, false, &FormatConfig::default())
}

// ── Integers ──────────────────────────────────────────────────────────────────

#[test]
fn integer_defaults_are_grouped() {
    let rows = [
        (0, "0"),
        (255, "255"),
        (1234, "1,234"),
        (1234567, "1,234,567"),
        (-1234, "-1,234"),
        (i64::MIN, "-9,223,372,036,854,775,808"),
    ];
    for (n, want) in rows {
        assert_eq!(render(Value::Int(n), "", 4), want, "{n}");
    }
    let cfg = FormatConfig::default();
    assert_eq!(Value::Int(-1).render("", 8, true, &cfg), "18,446,744,073,709,551,615");
}

#[test]
fn named_integer_formats() {
    let rows = [
        (255, "hex", 4, "00 00 00 ff"),
        (255, "hex", 1, "ff"),
        (0x1234, "hex", 1, "12 34"),
        (5, "bin", 1, "00000101"),
        (0x1FF, "bin", 1, "1 11111111"),
        (8, "oct", 1, "010"),
        (8, "oct", 4, "000 0000 0010"),
        (42, "%08X", 4, "0000002A"),
        (42, "%d items", 4, "42 items"),
        (42, "anything else", 4, "42"),
    ];
    for (n, format, size, want) in rows {
        assert_eq!(render(Value::Int(n), format, size), want, "{n} {format:?}");
    }
}

#[test]
fn configured_integer_formats() {
    let cfg = FormatConfig {
        int_format: "hex".into(),
        unsigned_format: "%u".into(),
        group_char: '.',
        ..FormatConfig::default()
    };
    assert_eq!(Value::Int(171).render("", 2, false, &cfg), "00 ab");
    assert_eq!(Value::Int(-2).render("", 8, true, &cfg), "18446744073709551614");
    assert_eq!(Value::Int(1234).render("dec", 2, false, &cfg), "1.234");
}

// ── Reals ─────────────────────────────────────────────────────────────────────

#[test]
fn reals() {
    let rows = [
        (1.5, "", 8, "1.5"),
        (0.1, "", 8, "0.1"),
        (1.0 / 3.0, "", 4, "0.3333333"),
        (1.0 / 3.0, "", 8, "0.333333333333333"),
        (1e20, "", 8, "1e+20"),
        (-2.0, "", 8, "-2"),
        (3.14159, "%.2f", 8, "3.14"),
        (f64::NAN, "", 8, "NaN"),
        (f64::INFINITY, "", 8, "+Inf"),
        (f64::NEG_INFINITY, "", 8, "-Inf"),
    ];
    for (x, format, size, want) in rows {
        assert_eq!(render(Value::Real(x), format, size), want, "{x} {format:?}");
    }
}

#[test]
fn real_uses_locale_decimal_point() {
    let cfg = FormatConfig {
        decimal_point: ',',
        real_format: "%.3f".into(),
        ..FormatConfig::default()
    };
    assert_eq!(Value::Real(2.5).render("", 8, false, &cfg), "2,500");
}

// ── Dates ─────────────────────────────────────────────────────────────────────

#[test]
fn dates() {
    // 2000-01-01 is day 36526.
    assert_eq!(render(Value::Date(36526.0), "", 8), "2000-01-01 00:00:00");
    assert_eq!(render(Value::Date(36526.5), "", 8), "2000-01-01 12:00:00");
    assert_eq!(render(Value::Date(36526.0), "%d/%m/%Y", 8), "01/01/2000");
    assert_eq!(render(Value::invalid_date(), "", 8), "##Invalid date##");
    assert_eq!(render(Value::Date(36526.0), "%Y-%", 8), INVALID_FORMAT_TEXT);
}

#[test]
fn date_functions_render() {
    let mut ev = Evaluator::default();
    let d = ev.evaluate("date(\"12/25/2023\") + 0.25").unwrap();
    assert_eq!(render(d, "%Y-%m-%d %H:%M", 8), "2023-12-25 06:00");
    let bad = ev.evaluate("date(\"13/45/2023\")").unwrap();
    assert_eq!(render(bad, "", 8), "##Invalid date##");
}

// ── Strings and the rest ──────────────────────────────────────────────────────

#[test]
fn strings() {
    let abc = || Value::Str("abc".into());
    assert_eq!(render(abc(), "", -1), "abc");
    assert_eq!(render(abc(), "[%5s]", -1), "[  abc]");
    assert_eq!(render(abc(), "[%-5s]", -1), "[abc  ]");
    assert_eq!(render(abc(), "plain", -1), "abc");
}

#[test]
fn booleans_and_containers() {
    assert_eq!(render(Value::Bool(true), "", 1), "TRUE");
    assert_eq!(render(Value::Bool(false), "false", 1), "false");
    assert_eq!(render(Value::Bool(true), "N", 1), "Y");
    // Formats are keyed by the false word, so "Y" falls back to the default.
    assert_eq!(render(Value::Bool(true), "Y", 1), "TRUE");
    assert_eq!(render(Value::Struct, "", 8), "");
    assert_eq!(render(Value::None, "hex", 8), "");
}

#[test]
fn printf_applies_one_argument() {
    assert_eq!(sprintf("%d=%x", &Arg::Int(26)), "26=1a");
    assert_eq!(sprintf("%5.1f%%", &Arg::Real(99.44)), " 99.4%");
    assert_eq!(sprintf("%d", &Arg::Real(7.9)), "7");
}
