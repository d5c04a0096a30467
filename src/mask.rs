//! Redaction of credentials in logged request and callback bodies

use serde_json::Value;

fn mask_tail(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len > 4 {
        "*".repeat(len - 4) + &chars[len - 4..].iter().collect::<String>()
    } else {
        "*".repeat(len)
    }
}

/// Keys whose values must never reach the logs at all.
fn is_secret_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("password") || k.contains("secret")
}

/// Keys whose values are partially masked, keeping the last four characters.
fn is_token_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k == "tokenid" || k == "token" || k == "signature"
}

pub fn secure_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut new = serde_json::Map::with_capacity(map.len());
            for (k, val) in map {
                let new_val = match val {
                    Value::String(_) | Value::Number(_) if is_secret_key(k) => {
                        Value::String("***".to_string())
                    }
                    Value::String(s) if is_token_key(k) => Value::String(mask_tail(s)),
                    _ => secure_value(val),
                };
                new.insert(k.clone(), new_val);
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(secure_value).collect()),
        other => other.clone(),
    }
}
