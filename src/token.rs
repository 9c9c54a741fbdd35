//! Request/response token codec
//!
//! Tokens are standard padded base64 (RFC 4648) wrapped around a JSON
//! object. The request token names the parts a client intends to upload;
//! the response token acknowledges which of them were stored.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Decoded request token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestToken {
    /// Opaque request identifier, echoed back untouched (`null` when absent)
    #[serde(default)]
    pub uuid: Value,
    /// Declared identifiers; each names one part and the file it becomes
    pub image_uuids: Vec<String>,
}

/// Acknowledgement returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseToken {
    pub uuid: Value,
    pub request_images: Vec<String>,
    pub uploaded_images: Vec<String>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("token payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("token payload has the wrong shape: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("failed to serialize response token: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode a base64(JSON) request token.
///
/// Line breaks are ignored, so tokens wrapped at 76 columns or carrying a
/// trailing newline decode like their single-line form. Syntax errors and
/// shape errors are reported separately so callers can log which stage
/// rejected the token.
pub fn decode_request(token: &str) -> Result<RequestToken, TokenError> {
    let unwrapped: Vec<u8> = token
        .bytes()
        .filter(|b| !matches!(b, b'\r' | b'\n'))
        .collect();
    let raw = STANDARD.decode(unwrapped)?;
    let value: Value = serde_json::from_slice(&raw).map_err(TokenError::Json)?;
    serde_json::from_value(value).map_err(TokenError::Shape)
}

/// Serialize and base64-encode a response token
pub fn encode_response(token: &ResponseToken) -> Result<String, TokenError> {
    let json = serde_json::to_vec(token).map_err(TokenError::Encode)?;
    Ok(STANDARD.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_json(value: &Value) -> String {
        STANDARD.encode(value.to_string())
    }

    #[test]
    fn test_decode_request_token() {
        let token = encode_json(&json!({"uuid": "r1", "imageUuids": ["a.png", "b.png"]}));
        let decoded = decode_request(&token).unwrap();
        assert_eq!(decoded.uuid, json!("r1"));
        assert_eq!(decoded.image_uuids, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_uuid_keeps_any_json_type() {
        for uuid in [json!(42), json!({"nested": [1, 2]}), json!(null), json!(true)] {
            let token = encode_json(&json!({"uuid": uuid, "imageUuids": []}));
            assert_eq!(decode_request(&token).unwrap().uuid, uuid);
        }
    }

    #[test]
    fn test_missing_uuid_is_null() {
        let token = encode_json(&json!({"imageUuids": ["x"]}));
        assert_eq!(decode_request(&token).unwrap().uuid, Value::Null);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let token = encode_json(&json!({"uuid": 1, "imageUuids": [], "extra": "ok"}));
        assert!(decode_request(&token).is_ok());
    }

    #[test]
    fn test_wrapped_token_decodes() {
        let names: Vec<String> = (0..8).map(|i| format!("image-{i:02}.png")).collect();
        let token = encode_json(&json!({"uuid": "wrapped", "imageUuids": names}));
        assert!(token.len() > 76);

        let mut wrapped = token
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        wrapped.push('\n');

        let decoded = decode_request(&wrapped).unwrap();
        assert_eq!(decoded.uuid, json!("wrapped"));
        assert_eq!(decoded.image_uuids, names);
    }

    #[test]
    fn test_invalid_base64() {
        let err = decode_request("not base64!!").unwrap_err();
        assert!(matches!(err, TokenError::Decode(_)));
    }

    #[test]
    fn test_invalid_json() {
        let token = STANDARD.encode("{not json");
        assert!(matches!(decode_request(&token), Err(TokenError::Json(_))));
    }

    #[test]
    fn test_wrong_shape() {
        let cases = [
            json!({"uuid": "r1"}),
            json!({"uuid": "r1", "imageUuids": "a.png"}),
            json!({"uuid": "r1", "imageUuids": ["a.png", 7]}),
            json!({"uuid": "r1", "imageUuids": null}),
            json!(["a.png"]),
        ];
        for case in cases {
            let result = decode_request(&encode_json(&case));
            assert!(matches!(result, Err(TokenError::Shape(_))), "{case}");
        }
    }

    #[test]
    fn test_encode_response_token() {
        let token = ResponseToken {
            uuid: json!("r1"),
            request_images: vec!["a.png".into(), "b.png".into()],
            uploaded_images: vec!["a.png".into()],
        };
        let encoded = encode_response(&token).unwrap();
        let raw = STANDARD.decode(encoded).unwrap();
        let value: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(
            value,
            json!({"uuid": "r1", "requestImages": ["a.png", "b.png"], "uploadedImages": ["a.png"]})
        );
    }
}
