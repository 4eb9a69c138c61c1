use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Result codes carried in the response envelope. Clients branch on these
/// rather than on the HTTP status: `0` is success, `-1` is any request or
/// server failure, `-2` marks an unmatched route.
pub const CODE_OK: i32 = 0;
pub const CODE_ERROR: i32 = -1;
pub const CODE_NOT_FOUND: i32 = -2;

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Envelope {
    /// 0 on success, -1 on failure, -2 for unknown routes
    pub code: i32,
    /// Human-readable outcome description
    pub msg: String,
    /// Operation result; omitted entirely on errors
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_value"
    )]
    pub data: Option<JsonValue>,
}

impl Envelope {
    pub fn ok(msg: impl Into<String>, data: JsonValue) -> Self {
        Self {
            code: CODE_OK,
            msg: msg.into(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Request body for the set and append endpoints
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetEntryRequest {
    /// Dictionary key; must be a non-empty string
    pub key: String,
    /// Value to store; any JSON value, explicit `null` included
    #[serde(default, deserialize_with = "explicit_value")]
    pub value: Option<JsonValue>,
}

/// Request body for the delete endpoint
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DeleteEntryRequest {
    /// Dictionary key to remove
    pub key: String,
}

/// Query parameters for the dictionary read endpoints
#[derive(Debug, Deserialize)]
pub struct DictQuery {
    pub key: Option<String>,
}

/// Query parameters for the raw-record write endpoint
#[derive(Debug, Deserialize)]
pub struct PutRecordQuery {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Query parameters for the raw-record delete endpoint
#[derive(Debug, Deserialize)]
pub struct DeleteRecordQuery {
    pub key: Option<String>,
}

/// Keeps an explicitly present `null` distinguishable from a missing field.
/// Serde's default `Option` handling folds both into `None`; routing through
/// this deserializer makes a present field always `Some`. Used for the `value`
/// a client sends and for `data` when an envelope is read back.
fn explicit_value<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_with_present_value() {
        let request: SetEntryRequest =
            serde_json::from_value(json!({"key": "phone", "value": "15510001000"})).unwrap();

        assert_eq!(request.key, "phone");
        assert_eq!(request.value, Some(json!("15510001000")));
    }

    #[test]
    fn test_set_request_distinguishes_null_from_missing() {
        let with_null: SetEntryRequest =
            serde_json::from_value(json!({"key": "k", "value": null})).unwrap();
        assert_eq!(with_null.value, Some(JsonValue::Null));

        let missing: SetEntryRequest = serde_json::from_value(json!({"key": "k"})).unwrap();
        assert_eq!(missing.value, None);
    }

    #[test]
    fn test_set_request_rejects_non_string_key() {
        let result = serde_json::from_value::<SetEntryRequest>(json!({"key": 5, "value": 1}));

        assert!(result.is_err());
    }

    #[test]
    fn test_set_request_accepts_any_value_shape() {
        let request: SetEntryRequest =
            serde_json::from_value(json!({"key": "k", "value": {"nested": [1, 2, {"deep": true}]}}))
                .unwrap();

        assert_eq!(request.value, Some(json!({"nested": [1, 2, {"deep": true}]})));
    }

    #[test]
    fn test_success_envelope_shape() {
        let envelope = Envelope::ok("ok", json!({"a": 1}));

        let raw = serde_json::to_value(&envelope).unwrap();

        assert_eq!(raw, json!({"code": 0, "msg": "ok", "data": {"a": 1}}));
    }

    #[test]
    fn test_success_envelope_with_null_data_keeps_field() {
        let raw = serde_json::to_value(&Envelope::ok("ok", JsonValue::Null)).unwrap();

        assert_eq!(raw, json!({"code": 0, "msg": "ok", "data": null}));
    }

    #[test]
    fn test_envelope_null_data_survives_round_trip() {
        let raw = serde_json::to_string(&Envelope::ok("ok", JsonValue::Null)).unwrap();
        assert_eq!(raw, r#"{"code":0,"msg":"ok","data":null}"#);

        // Reading the envelope back must not fold "data": null into absence
        let parsed: Envelope = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.data, Some(JsonValue::Null));

        let absent: Envelope = serde_json::from_str(r#"{"code":-1,"msg":"bad"}"#).unwrap();
        assert!(absent.data.is_none());
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let raw = serde_json::to_value(&Envelope::error(CODE_ERROR, "bad")).unwrap();

        assert_eq!(raw, json!({"code": -1, "msg": "bad"}));
    }
}
