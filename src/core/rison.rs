//! Rison encoding for the dashboard REST API `q` parameter.
//!
//! Rison is a compact JSON variant: objects are `(k:v,...)`, arrays are
//! `!(a,b)`, literals are `!t`, `!f` and `!n`, and strings are left bare when
//! they are valid identifiers, otherwise quoted with `'` using `!` as escape.
//! Object keys are emitted in sorted order.

use serde_json::Value;

const NOT_ID_CHARS: &str = " '!:(),*@$";
const NOT_ID_START: &str = "-0123456789";

/// Encode a JSON value as a rison string
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("!n"),
        Value::Bool(true) => out.push_str("!t"),
        Value::Bool(false) => out.push_str("!f"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push_str("!(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(')');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('(');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, &map[key]);
            }
            out.push(')');
        }
    }
}

fn write_number(out: &mut String, n: &serde_json::Number) {
    // Rison writes exponents without '+' and in lowercase.
    let s = n.to_string().replace("e+", "e").replace('E', "e");
    out.push_str(&s);
}

fn is_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        None => false,
        Some(first) => {
            !NOT_ID_CHARS.contains(first)
                && !NOT_ID_START.contains(first)
                && chars.all(|c| !NOT_ID_CHARS.contains(c))
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    if is_id(s) {
        out.push_str(s);
        return;
    }
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' | '!' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_literals() {
        assert_eq!(encode(&json!(null)), "!n");
        assert_eq!(encode(&json!(true)), "!t");
        assert_eq!(encode(&json!(false)), "!f");
        assert_eq!(encode(&json!(42)), "42");
        assert_eq!(encode(&json!(-3)), "-3");
        assert_eq!(encode(&json!(1.5)), "1.5");
    }

    #[test]
    fn test_strings() {
        assert_eq!(encode(&json!("table_name")), "table_name");
        assert_eq!(encode(&json!("database.database_name")), "database.database_name");
        assert_eq!(encode(&json!("")), "''");
        assert_eq!(encode(&json!("two words")), "'two words'");
        assert_eq!(encode(&json!("10k")), "'10k'");
        assert_eq!(encode(&json!("-x")), "'-x'");
        assert_eq!(encode(&json!("it's!")), "'it!'s!!'");
    }

    #[test]
    fn test_arrays_and_objects() {
        assert_eq!(encode(&json!([])), "!()");
        assert_eq!(encode(&json!(["a", 1, true])), "!(a,1,!t)");
        assert_eq!(encode(&json!({})), "()");
        assert_eq!(encode(&json!({"b": 2, "a": "x"})), "(a:x,b:2)");
    }

    #[test]
    fn test_dataset_query_shape() {
        let q = json!({
            "columns": ["id", "table_name"],
            "filters": [{"col": "table_name", "opr": "ct", "value": "sales"}],
            "page": 0,
            "page_size": 50,
            "order_column": "table_name",
            "order_direction": "asc",
        });
        assert_eq!(
            encode(&q),
            "(columns:!(id,table_name),filters:!((col:table_name,opr:ct,value:sales)),\
             order_column:table_name,order_direction:asc,page:0,page_size:50)"
        );
    }
}
