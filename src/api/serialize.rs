use serde_json::Value;

/// Object identifier key used by stored records
pub const ID_KEY: &str = "_id";

/// 递归遍历 JSON，把所有 `_id` 字段转换为字符串
///
/// Applied only to response bodies; stored records keep integer ids.
pub fn stringify_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == ID_KEY {
                    if let Value::Number(n) = child {
                        let text = n.to_string();
                        *child = Value::String(text);
                        continue;
                    }
                }
                stringify_ids(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(stringify_ids),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_ids_at_any_depth() {
        let mut value = json!({
            "_id": 7,
            "latest": { "_id": 8, "acc_x": 1.5 },
            "history": [ { "_id": 9 }, { "other": 10 } ]
        });
        stringify_ids(&mut value);
        assert_eq!(
            value,
            json!({
                "_id": "7",
                "latest": { "_id": "8", "acc_x": 1.5 },
                "history": [ { "_id": "9" }, { "other": 10 } ]
            })
        );
    }

    #[test]
    fn leaves_other_numbers_and_string_ids_alone() {
        let mut value = json!({ "_id": "abc", "count": 3, "acc_z": -0.5 });
        let expected = value.clone();
        stringify_ids(&mut value);
        assert_eq!(value, expected);
    }

    #[test]
    fn scalars_are_untouched() {
        let mut value = json!(42);
        stringify_ids(&mut value);
        assert_eq!(value, json!(42));
    }
}
