//! Converts the parser's JSON sublanguage value into plain `serde_json::Value`
//! for embedding in a dashgraph/annotation document. Libpaths collapse to
//! plain strings here: by the time a widget or assignment value reaches this
//! crate it has already been resolved or is meant for passthrough display.

use pfsc_parser::Value as PValue;
use serde_json::{Map, Value as JValue};

pub fn to_json(value: &PValue) -> JValue {
    match value {
        PValue::Null => JValue::Null,
        PValue::Bool(b) => JValue::Bool(*b),
        PValue::Int(i) => JValue::Number((*i).into()),
        PValue::Float(f) => serde_json::Number::from_f64(*f).map(JValue::Number).unwrap_or(JValue::Null),
        PValue::Str(s) | PValue::Libpath(s) => JValue::String(s.clone()),
        PValue::Array(items) => JValue::Array(items.iter().map(to_json).collect()),
        PValue::Object(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k.clone(), to_json(v));
            }
            JValue::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn libpath_collapses_to_plain_string() {
        assert_eq!(to_json(&PValue::Libpath("a.b.c".to_string())), JValue::String("a.b.c".to_string()));
    }

    #[test]
    fn object_preserves_key_order_as_map() {
        let v = PValue::Object(vec![("x".to_string(), PValue::Int(1))]);
        let j = to_json(&v);
        assert_eq!(j["x"], JValue::Number(1.into()));
    }
}
