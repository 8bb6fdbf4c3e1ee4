use super::*;

fn table(entries: Vec<(&str, Value)>) -> Table {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

fn inline(value: Value) -> String {
    let mut out = String::new();
    encode_inline(&value, &mut out).unwrap();
    out
}

#[test]
fn sections_follow_plain_entries() {
    let doc = table(vec![
        ("title", Value::from("T")),
        ("owner", Value::Table(table(vec![("name", Value::from("Tom"))]))),
        (
            "items",
            Value::Array(vec![
                Value::Table(table(vec![("id", Value::Integer(1))])),
                Value::Table(table(vec![("id", Value::Integer(2))])),
            ]),
        ),
        ("arr", Value::Array(vec![Value::Integer(1), Value::Integer(2)])),
    ]);
    assert_eq!(
        encode(&doc).unwrap(),
        "title = \"T\"\n\
         arr = [1, 2]\n\
         \n\
         [owner]\n\
         name = \"Tom\"\n\
         \n\
         [[items]]\n\
         id = 1\n\
         \n\
         [[items]]\n\
         id = 2\n"
    );
}

#[test]
fn nested_headers_use_full_paths() {
    let c = table(vec![("c", Value::Integer(1))]);
    let doc = table(vec![(
        "a",
        Value::Table(table(vec![("b", Value::Table(c))])),
    )]);
    assert_eq!(encode(&doc).unwrap(), "[a]\n\n[a.b]\nc = 1\n");

    let doc = table(vec![(
        "site",
        Value::Table(table(vec![(
            "google.com",
            Value::Table(table(vec![("up", Value::Boolean(true))])),
        )])),
    )]);
    assert_eq!(
        encode(&doc).unwrap(),
        "[site]\n\n[site.\"google.com\"]\nup = true\n"
    );
}

#[test]
fn empty_document() {
    assert_eq!(encode(&Table::new()).unwrap(), "");
}

#[test]
fn keys_are_quoted_when_needed() {
    let mut out = String::new();
    for key in ["bare_key-1", "1234", "quoted key", "", "a.b", "ключ"] {
        encode_key(key, &mut out);
        out.push('|');
    }
    assert_eq!(out, "bare_key-1|1234|\"quoted key\"|\"\"|\"a.b\"|\"ключ\"|");
}

#[test]
fn strings_are_escaped() {
    assert_eq!(
        inline(Value::from("tab\tquote\"back\\slash")),
        r#""tab\tquote\"back\\slash""#
    );
    assert_eq!(
        inline(Value::from("a\nb\r\u{8}\u{c}\u{1}\u{7f}")),
        r#""a\nb\r\b\f\u0001\u007F""#
    );
    assert_eq!(inline(Value::from("héllo ✓")), "\"héllo ✓\"");
}

#[test]
fn floats() {
    assert_eq!(inline(Value::Float(1.5)), "1.5e0");
    assert_eq!(inline(Value::Float(-0.25)), "-0.25e0");
    for f in [2.0, 1e10, -0.0, 0.1] {
        let text = inline(Value::Float(f));
        assert!(text.contains(['e', 'E']), "{text}");
        assert_eq!(text.parse::<f64>().ok(), Some(f), "{text}");
    }
    assert_eq!(inline(Value::Float(f64::NAN)), "nan");
    assert_eq!(inline(Value::Float(f64::INFINITY)), "inf");
    assert_eq!(inline(Value::Float(f64::NEG_INFINITY)), "-inf");

    let big = inline(Value::Float(1e300));
    assert_eq!(big.parse::<f64>().ok(), Some(1e300));
}

#[test]
fn decimals_are_written_verbatim() {
    assert_eq!(inline(Value::Decimal("1000.50".into())), "1000.50");
    assert_eq!(inline(Value::Decimal("-0.0".into())), "-0.0");
    assert_eq!(inline(Value::Decimal("12".into())), "12.0");

    for bad in ["1e5", "01.5", "1.", ".5", "inf", "1_000.0", "+1.0", ""] {
        let mut out = String::new();
        let err = encode_inline(&Value::Decimal(bad.into()), &mut out).unwrap_err();
        assert_eq!(err.kind.to_string(), "invalid-number", "input: {bad:?}");
    }
}

#[test]
fn temporal_values() {
    let cases = [
        "1979-05-27T07:32:00Z",
        "1979-05-27T00:32:00.999-07:00",
        "1979-05-27T07:32:00",
        "1979-05-27",
        "07:32:00.5",
    ];
    for text in cases {
        let value = crate::decode(&format!("v = {text}"))
            .unwrap()
            .remove("v")
            .unwrap();
        let written = inline(value);
        let expected = if text == "07:32:00.5" { "07:32:00.500" } else { text };
        assert_eq!(written, expected);
    }
}

#[test]
fn inline_values() {
    assert_eq!(inline(Value::Array(Vec::new())), "[]");
    assert_eq!(inline(Value::Table(Table::new())), "{}");
    assert_eq!(
        inline(Value::Array(vec![
            Value::Integer(1),
            Value::Table(table(vec![("x", Value::Integer(1)), ("y z", Value::Boolean(false))])),
        ])),
        "[1, { x = 1, \"y z\" = false }]"
    );

    // Arrays of arrays of tables stay inline.
    let doc = table(vec![(
        "a",
        Value::Array(vec![Value::Array(vec![Value::Table(table(vec![(
            "b",
            Value::Integer(1),
        )]))])]),
    )]);
    assert_eq!(encode(&doc).unwrap(), "a = [[{ b = 1 }]]\n");
}

#[test]
fn invalid_decimal_fails_the_whole_document() {
    let doc = table(vec![(
        "t",
        Value::Table(table(vec![("d", Value::Decimal("nope".into()))])),
    )]);
    assert!(encode(&doc).is_err());
}

#[test]
fn output_decodes_to_the_same_tree() {
    let source = r#"
title = "TOML \"Example\""
"quoted key" = 'literal \n'
nums = [1, -2, 3.5, inf, nan]
dates = [1979-05-27, 07:32:00, 1979-05-27T07:32:00, 1979-05-27T07:32:00-07:00]
point = { x = 1, y = { z = [] } }

[owner]
name = "Tom"

[owner.address."street.name"]
number = 42

[[fruit]]
name = "apple"

[fruit.physical]
color = "red"

[[fruit.variety]]
name = "red delicious"

[[fruit]]
name = "banana"
"#;
    let tree = crate::decode(source).unwrap();
    let text = encode(&tree).unwrap();
    let again = crate::decode(&text).unwrap_or_else(|e| panic!("{e:#}\n{text}"));
    assert_eq!(tree, again, "{text}");
}
