use crate::ast::{self, Node};
use crate::{Error, ErrorCategory, ErrorKind, Table, TimeOffset, Value};

fn parse_ok(input: &str) -> Table {
    crate::decode(input).unwrap_or_else(|e| panic!("parse failed for {input:?}: {e:#}"))
}

fn parse_err(input: &str) -> Error {
    match crate::decode(input) {
        Ok(table) => panic!("expected an error for {input:?}, got {table:?}"),
        Err(e) => e,
    }
}

/// The single value assigned to `a`.
fn value_of(input: &str) -> Value {
    let mut table = parse_ok(input);
    table
        .remove("a")
        .unwrap_or_else(|| panic!("no `a` in {input:?}"))
}

fn code(input: &str) -> String {
    parse_err(input).kind.to_string()
}

#[test]
fn basic_scalar_values() {
    let v = parse_ok("");
    assert!(v.is_empty());

    assert_eq!(value_of("a = \"hello\""), Value::from("hello"));
    assert_eq!(value_of("a = 42"), Value::Integer(42));
    assert_eq!(value_of("a = -100"), Value::Integer(-100));
    assert_eq!(value_of("a = +7"), Value::Integer(7));
    assert_eq!(value_of("a = 3.25"), Value::Float(3.25));
    assert_eq!(value_of("a = true"), Value::Boolean(true));
    assert_eq!(value_of("a = false"), Value::Boolean(false));

    let v = parse_ok("a = 1\nb = 2\nc = 3");
    assert_eq!(v.len(), 3);
    assert_eq!(v.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
}

#[test]
fn strings() {
    let cases = [
        (r#"a = "line1\nline2""#, "line1\nline2"),
        (r#"a = "say \"hi\"""#, "say \"hi\""),
        (r#"a = "\u0041\U00000042""#, "AB"),
        (r"a = 'C:\Users\nodejs'", r"C:\Users\nodejs"),
        ("a = \"\"\"\nRoses\nViolets\"\"\"", "Roses\nViolets"),
        ("a = '''\nraw \\n text'''", "raw \\n text"),
        ("a = \"\"", ""),
    ];
    for (input, expected) in cases {
        assert_eq!(value_of(input), Value::from(expected), "input: {input}");
    }
}

#[test]
fn integers() {
    let cases = [
        ("a = 0", 0),
        ("a = -0", 0),
        ("a = 1_000_000", 1_000_000),
        ("a = 0xDEAD_beef", 0xDEAD_BEEF),
        ("a = 0o755", 0o755),
        ("a = 0b1101", 0b1101),
        ("a = 9223372036854775807", i64::MAX),
        ("a = -9223372036854775808", i64::MIN),
    ];
    for (input, expected) in cases {
        assert_eq!(value_of(input), Value::Integer(expected), "input: {input}");
    }
}

#[test]
fn integer_errors() {
    let cases = [
        "a = 01",
        "a = 1__0",
        "a = 1_",
        "a = 0x",
        "a = 0x_1",
        "a = 0b102",
        "a = -0x1",
        "a = +0o7",
        "a = 12a",
    ];
    for input in cases {
        let err = parse_err(input);
        assert_eq!(err.kind.to_string(), "invalid-number", "input: {input}");
        assert_eq!(err.category(), ErrorCategory::Literal);
    }

    let err = parse_err("a = 9223372036854775808");
    assert_eq!(err.kind, ErrorKind::OutOfRange("i64"));
    assert_eq!(err.column(), Some(4));
    assert_eq!(code("a = 0xffffffffffffffffff"), "out-of-range");
}

#[test]
fn floats() {
    let cases = [
        ("a = 1.5", 1.5),
        ("a = -0.25", -0.25),
        ("a = +1.0", 1.0),
        ("a = 5e+22", 5e22),
        ("a = 1e06", 1e6),
        ("a = -2E-2", -2e-2),
        ("a = 6.626e-34", 6.626e-34),
        ("a = 224_617.445_991", 224_617.445_991),
        ("a = 0e0", 0.0),
        ("a = 1.5E+3", 1500.0),
    ];
    for (input, expected) in cases {
        assert_eq!(value_of(input), Value::Float(expected), "input: {input}");
    }

    assert_eq!(value_of("a = inf"), Value::Float(f64::INFINITY));
    assert_eq!(value_of("a = +inf"), Value::Float(f64::INFINITY));
    assert_eq!(value_of("a = -inf"), Value::Float(f64::NEG_INFINITY));
    assert!(value_of("a = nan").as_float().is_some_and(f64::is_nan));
    assert!(value_of("a = -nan").as_float().is_some_and(f64::is_nan));
}

#[test]
fn float_errors() {
    for input in [
        "a = 01.5",
        "a = 00e1",
        "a = 1.e5",
        "a = 1._5",
        "a = 1.5_",
        "a = 1e5x",
        "a = 1e+_5",
    ] {
        let err = parse_err(input);
        assert_eq!(err.category(), ErrorCategory::Literal, "input: {input}");
    }

    assert_eq!(parse_err("a = 1e400").kind, ErrorKind::OutOfRange("f64"));
    // A trailing point leaves nothing for the fraction.
    assert_eq!(code("a = 1."), "wanted");
    assert_eq!(code("a = .5"), "wanted");
    assert_eq!(code("a = 1e"), "wanted");
    assert_eq!(code("a = 1.5.5"), "wanted");
}

#[test]
fn dates_and_times() {
    let date = value_of("a = 1979-05-27");
    assert_eq!(date.as_local_date().map(ToString::to_string).as_deref(), Some("1979-05-27"));

    let time = value_of("a = 07:32:00.999");
    assert_eq!(time.as_local_time().map(|t| t.millisecond), Some(999));

    for input in [
        "a = 1979-05-27T07:32:00",
        "a = 1979-05-27t07:32:00",
        "a = 1979-05-27 07:32:00",
    ] {
        let v = value_of(input);
        let dt = v.as_local_date_time().unwrap_or_else(|| panic!("{input}"));
        assert_eq!(dt.to_string(), "1979-05-27T07:32:00");
    }

    let cases = [
        ("a = 1979-05-27T07:32:00Z", 0),
        ("a = 1979-05-27T07:32:00z", 0),
        ("a = 1979-05-27T07:32:00.5Z", 0),
        ("a = 1979-05-27T00:32:00-07:00", -420),
        ("a = 1979-05-27T00:32:00.999999-07:00", -420),
        ("a = 1979-05-27T00:32:00+05:30", 330),
        ("a = 1979-05-27T00:32:00.5+05:30", 330),
        ("a = 1979-05-27 00:32:00+01:00", 60),
    ];
    for (input, minutes) in cases {
        let v = value_of(input);
        let dt = v.as_offset_date_time().unwrap_or_else(|| panic!("{input}"));
        assert_eq!(dt.offset.minutes(), minutes, "input: {input}");
    }
    let utc = value_of("a = 1979-05-27T07:32:00Z");
    assert_eq!(utc.as_offset_date_time().map(|dt| dt.offset), Some(TimeOffset::Z));
}

#[test]
fn date_followed_by_something_else() {
    let v = parse_ok("a = [1979-05-27 , 1]\nb = 1979-05-27 # birthday\n");
    assert_eq!(
        v.get("a").and_then(Value::as_array).map(|a| a[0].type_str()),
        Some("local date")
    );
    assert!(v.get("b").and_then(Value::as_local_date).is_some());
}

#[test]
fn date_errors() {
    let err = parse_err("a = 2023-02-30");
    assert_eq!(
        err.kind,
        ErrorKind::InvalidDateTime("invalid local date: days of February".into())
    );
    assert_eq!(err.category(), ErrorCategory::Literal);
    assert_eq!((err.line(), err.column()), (Some(1), Some(4)));

    for input in [
        "a = 2023-13-01",
        "a = 2023-04-31",
        "a = 1979-5-27",
        "a = 24:00:00",
        "a = 07:60:00",
        "a = 1979-05-27T07:32:00+24:00",
        "a = 1979-05-27T07:32:00+05:60",
    ] {
        assert_eq!(code(input), "invalid-datetime", "input: {input}");
    }
    assert!(value_of("a = 2024-02-29").as_local_date().is_some());
}

#[test]
fn unquoted_strings() {
    for input in ["a = abc", "a = -abc", "a = True", "a = _1", "a = infinity"] {
        let err = parse_err(input);
        assert_eq!(err.kind, ErrorKind::UnquotedString, "input: {input}");
        assert_eq!(err.column(), Some(4));
    }
}

#[test]
fn arrays() {
    assert_eq!(value_of("a = []"), Value::Array(Vec::new()));
    assert_eq!(
        value_of("a = [1, 2, 3,]"),
        Value::Array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
    );
    assert_eq!(
        value_of("a = [\n  1, # one\n  # nothing here\n  \"two\",\n]"),
        Value::Array(vec![Value::Integer(1), Value::from("two")])
    );
    let nested = value_of("a = [[1, 2], [\"a\"], [{ x = 1 }]]");
    let outer = nested.as_array().unwrap();
    assert_eq!(outer.len(), 3);
    assert_eq!(outer[2].as_array().unwrap()[0].get("x"), Some(&Value::Integer(1)));

    assert_eq!(code("a = [1 2]"), "wanted");
    assert_eq!(code("a = [1,,2]"), "wanted");
    assert_eq!(code("a = [1"), "wanted");
}

#[test]
fn inline_tables() {
    assert_eq!(value_of("a = {}"), Value::Table(Table::new()));

    let v = value_of("a = { x = 1, y.z = \"deep\", y.w = true }");
    assert_eq!(v.get("x"), Some(&Value::Integer(1)));
    assert_eq!(v.get("y").and_then(|y| y.get("z")), Some(&Value::from("deep")));
    assert_eq!(v.get("y").and_then(|y| y.get("w")), Some(&Value::Boolean(true)));

    let err = parse_err("a = { x = 1, x = 2 }");
    assert_eq!(
        err.kind,
        ErrorKind::DuplicateKey { key: "x".into() }
    );
    assert_eq!(err.column(), Some(13));

    assert_eq!(code("a = { x = 1, }"), "wanted");
    assert_eq!(code("a = { x = 1\n}"), "wanted");
    assert_eq!(code("a = { x = 1 y = 2 }"), "wanted");
}

#[test]
fn inline_tables_have_their_own_scope() {
    // The same key inside and outside the braces is not a duplicate.
    let v = parse_ok("x = 1\na = { x = 2 }\nb = { a = 3 }\n");
    assert_eq!(v.get("x"), Some(&Value::Integer(1)));
    assert_eq!(v.get("a").and_then(|a| a.get("x")), Some(&Value::Integer(2)));
    assert_eq!(v.get("b").and_then(|b| b.get("a")), Some(&Value::Integer(3)));
}

#[test]
fn keys() {
    let v = parse_ok("\"quoted key\" = 1\n'lit.eral' = 2\n1234 = 3\nbare-key_2 = 4\n\"\" = 5");
    assert_eq!(v.get("quoted key"), Some(&Value::Integer(1)));
    assert_eq!(v.get("lit.eral"), Some(&Value::Integer(2)));
    assert_eq!(v.get("1234"), Some(&Value::Integer(3)));
    assert_eq!(v.get("bare-key_2"), Some(&Value::Integer(4)));
    assert_eq!(v.get(""), Some(&Value::Integer(5)));

    let v = parse_ok("site . \"google.com\" = true");
    let site = v.get("site").unwrap();
    assert_eq!(site.get("google.com"), Some(&Value::Boolean(true)));

    assert_eq!(parse_err("\"\"\"a\"\"\" = 1").kind, ErrorKind::MultilineStringKey);
    assert_eq!(code("= 1"), "wanted");
    assert_eq!(code("a. = 1"), "wanted");
    assert_eq!(code("a"), "wanted");
    assert_eq!(code("a = "), "wanted");
}

#[test]
fn table_headers() {
    let v = parse_ok(
        "top = 0\n\
         [server]\n\
         host = \"localhost\"\n\
         [ server . ports ]\n\
         http = 80\n\
         [a.b.c]\n\
         [a]\n\
         d = 1\n",
    );
    assert_eq!(v.get("top"), Some(&Value::Integer(0)));
    let server = v.get("server").unwrap();
    assert_eq!(server.get("host"), Some(&Value::from("localhost")));
    assert_eq!(server.get("ports").and_then(|p| p.get("http")), Some(&Value::Integer(80)));
    let a = v.get("a").unwrap();
    assert_eq!(a.get("d"), Some(&Value::Integer(1)));
    assert!(a.get("b").and_then(|b| b.get("c")).is_some());

    assert_eq!(code("[a"), "wanted");
    assert_eq!(code("[a] b = 1"), "wanted");
    assert_eq!(code("[[a]"), "wanted");
    assert_eq!(code("[]"), "wanted");
}

#[test]
fn arrays_of_tables() {
    let v = parse_ok(
        "[[fruit]]\n\
         name = \"apple\"\n\
         [fruit.physical]\n\
         color = \"red\"\n\
         [[fruit.variety]]\n\
         name = \"red delicious\"\n\
         [[fruit.variety]]\n\
         name = \"granny smith\"\n\
         [[fruit]]\n\
         name = \"banana\"\n\
         [[fruit.variety]]\n\
         name = \"plantain\"\n",
    );
    let fruit = v.get("fruit").and_then(Value::as_array).unwrap();
    assert_eq!(fruit.len(), 2);
    assert_eq!(fruit[0].get("name"), Some(&Value::from("apple")));
    assert_eq!(
        fruit[0].get("physical").and_then(|p| p.get("color")),
        Some(&Value::from("red"))
    );
    let variety = |i: usize| fruit[i].get("variety").and_then(Value::as_array).unwrap();
    assert_eq!(variety(0).len(), 2);
    assert_eq!(variety(1).len(), 1);
    assert_eq!(variety(1)[0].get("name"), Some(&Value::from("plantain")));
}

#[test]
fn duplicates_are_reported_where_they_happen() {
    let err = parse_err("a = 1\na = 2");
    assert_eq!(err.kind, ErrorKind::DuplicateKey { key: "a".into() });
    assert_eq!((err.line(), err.column()), (Some(2), Some(0)));

    let err = parse_err("[t]\nx = 1\n\n[t]\n");
    assert_eq!(err.kind, ErrorKind::DuplicateTable { name: "t".into() });
    assert_eq!((err.line(), err.column()), (Some(4), Some(0)));

    let err = parse_err("a.b = 1\n[a.b]");
    assert_eq!(err.kind, ErrorKind::DuplicateKey { key: "a.b".into() });

    let err = parse_err("[[fruit]]\n[fruit]");
    assert_eq!(err.kind, ErrorKind::BrokenKey { name: "fruit".into() });
    assert_eq!(err.category(), ErrorCategory::Structural);

    assert_eq!(code("a = 1\n[[a]]"), "duplicate-table");
    assert_eq!(code("[a]\n[[a]]"), "duplicate-table");
    assert_eq!(code("[a.b]\nc = 1\n[a]\nb = 2"), "duplicate-key");
    assert_eq!(code("a = {}\na.b = 1"), "duplicate-key");
}

#[test]
fn values_must_end_their_line() {
    let err = parse_err("a = 1 b = 2");
    assert_eq!(
        err.kind,
        ErrorKind::Wanted {
            expected: "a newline",
            found: "an identifier"
        }
    );
    assert_eq!(err.column(), Some(6));

    assert_eq!(code("a = \"x\" \"y\""), "wanted");
    assert!(crate::decode("a = 1 # trailing comment").is_ok());
    assert!(crate::decode("a = 1\t\n").is_ok());
}

#[test]
fn comments_and_blank_lines() {
    let v = parse_ok("# header\n\n  # indented\n\ta = 1 # one\n\n\n# footer");
    assert_eq!(v.get("a"), Some(&Value::Integer(1)));
    assert!(parse_ok("# only a comment").is_empty());

    let err = parse_err("# bad \u{7} comment");
    assert_eq!(err.kind, ErrorKind::Unexpected('\u{7}'));
}

#[test]
fn utf8_bom_is_skipped() {
    let v = parse_ok("\u{feff}a = 1\n");
    assert_eq!(v.get("a"), Some(&Value::Integer(1)));
    assert!(parse_ok("\u{feff}").is_empty());

    // Only a leading mark is skipped.
    assert_eq!(parse_err("a = 1\n\u{feff}b = 2").kind, ErrorKind::Unexpected('\u{feff}'));
}

#[test]
fn crlf_handling() {
    let v = parse_ok("a = 1\r\n[t]\r\nb = [\r\n  2,\r\n]\r\n");
    assert_eq!(v.get("a"), Some(&Value::Integer(1)));
    assert_eq!(
        v.get("t").and_then(|t| t.get("b")),
        Some(&Value::Array(vec![Value::Integer(2)]))
    );

    let err = parse_err("a = 1\rb = 2");
    assert_eq!(err.kind, ErrorKind::Unexpected('\r'));
}

#[test]
fn ast_keeps_source_order_and_spans() {
    let root = crate::parse("a = 1\n[t]\nb = 2\nc = 3\n[[arr]]\n").unwrap();
    assert_eq!(root.nodes.len(), 3);
    match &root.nodes[0] {
        Node::KeyValue(kv) => {
            assert_eq!(kv.key.to_string(), "a");
            assert_eq!(kv.value, ast::Value::Integer(1));
            assert_eq!((kv.span.start, kv.span.end), (0, 1));
        }
        other => panic!("unexpected node {other:?}"),
    }
    match &root.nodes[1] {
        Node::Table(table) => {
            assert_eq!(table.key.to_string(), "t");
            assert_eq!(table.elements.len(), 2);
            assert_eq!((table.span.start, table.span.end), (6, 9));
        }
        other => panic!("unexpected node {other:?}"),
    }
    assert!(matches!(&root.nodes[2], Node::ArrayTable(t) if t.elements.is_empty()));
}

#[test]
fn ast_floats_keep_normalized_text() {
    let root = crate::parse("a = +1_000.25\nb = -5e+3\nc = inf").unwrap();
    let texts: Vec<String> = root
        .nodes
        .iter()
        .filter_map(|node| match node {
            Node::KeyValue(kv) => match &kv.value {
                ast::Value::Float { text, .. } => Some(text.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(texts, ["1000.25", "-5e3", "inf"]);
}

#[test]
fn recursion_depth_at_limit() {
    let depth = super::MAX_RECURSION_DEPTH as usize;

    let input = format!("a = {}{}", "[".repeat(depth), "]".repeat(depth));
    let mut value = &value_of(&input);
    for _ in 1..depth {
        value = &value.as_array().unwrap()[0];
    }
    assert_eq!(value, &Value::Array(Vec::new()));

    let input = format!("a = {}1{}", "{ b = ".repeat(depth), " }".repeat(depth));
    assert!(crate::decode(&input).is_ok());
}

#[test]
fn recursion_depth_over_limit() {
    let depth = super::MAX_RECURSION_DEPTH as usize + 1;

    let input = format!("a = {}{}", "[".repeat(depth), "]".repeat(depth));
    let err = parse_err(&input);
    assert_eq!(err.kind, ErrorKind::RecursionLimitExceeded);
    assert_eq!(err.column(), Some(4 + depth - 1));

    let input = format!("a = {}1{}", "{ b = ".repeat(depth), " }".repeat(depth));
    assert_eq!(parse_err(&input).kind, ErrorKind::RecursionLimitExceeded);

    // Depth is per value, not per document.
    let shallow = format!("a = {0}{1}\nb = {0}{1}", "[".repeat(depth - 1), "]".repeat(depth - 1));
    assert!(crate::decode(&shallow).is_ok());
}

#[test]
fn lexer_errors_surface_with_positions() {
    let err = parse_err("a = 1\nb = \"open");
    assert_eq!(err.kind, ErrorKind::UnterminatedString);
    assert_eq!((err.line(), err.column()), (Some(2), Some(4)));

    assert_eq!(code("a = \"\\q\""), "invalid-escape");
    assert_eq!(code("a = \"tab\u{1}\""), "invalid-char-in-string");
    assert_eq!(code("a = @"), "unexpected");
}
