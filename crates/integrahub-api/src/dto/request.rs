//! Request DTOs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Callback parameters that belong under the payment's `notes`.
const NOTE_KEYS: [&str; 3] = ["redirect_to", "redirect_message", "use_sandbox"];

/// Query of the Dropbox OAuth callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DropboxCallbackQuery {
    /// Authorization code.
    pub code: Option<String>,
    /// State issued with the authorize URL.
    pub state: Option<String>,
}

/// Turns the checkout callback query into the request payload logged for
/// the payment.
///
/// Redirect hints and the sandbox flag go under `notes`. A numeric
/// `amount` stays a number.
pub fn payment_callback_payload(params: Vec<(String, String)>) -> Value {
    let mut data = Map::new();
    let mut notes = Map::new();
    for (key, value) in params {
        if NOTE_KEYS.contains(&key.as_str()) {
            notes.insert(key, Value::String(value));
        } else if key == "amount" {
            data.insert(key, amount(value));
        } else {
            data.insert(key, Value::String(value));
        }
    }
    if !notes.is_empty() {
        data.insert("notes".to_string(), Value::Object(notes));
    }
    Value::Object(data)
}

fn amount(value: String) -> Value {
    match value.parse::<u64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_callback_payload_nests_notes() {
        let payload = payment_callback_payload(vec![
            ("razorpay_payment_id".to_string(), "pay_1".to_string()),
            ("amount".to_string(), "50000".to_string()),
            ("redirect_to".to_string(), "/cart".to_string()),
        ]);

        assert_eq!(
            payload,
            json!({
                "razorpay_payment_id": "pay_1",
                "amount": 50000,
                "notes": { "redirect_to": "/cart" }
            })
        );
    }
}
