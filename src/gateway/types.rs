//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `Amount`: Format-validated Decimal at the Serde layer
//! - `error_codes`: Standard error code constants

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create success response with a custom message
    pub fn success_msg(data: T, msg: impl Into<String>) -> Self {
        Self {
            code: 0,
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard handler result: success payload or (status, error envelope).
pub type HandlerResult<T> =
    Result<(axum::http::StatusCode, axum::Json<ApiResponse<T>>), ApiError>;

/// Error half of a handler result.
pub type ApiError = (axum::http::StatusCode, axum::Json<ApiResponse<()>>);

pub fn ok<T>(data: T) -> (axum::http::StatusCode, axum::Json<ApiResponse<T>>) {
    (axum::http::StatusCode::OK, axum::Json(ApiResponse::success(data)))
}

pub fn created<T>(data: T) -> (axum::http::StatusCode, axum::Json<ApiResponse<T>>) {
    (
        axum::http::StatusCode::CREATED,
        axum::Json(ApiResponse::success(data)),
    )
}

pub fn fail(status: axum::http::StatusCode, code: i32, msg: impl Into<String>) -> ApiError {
    (status, axum::Json(ApiResponse::<()>::error(code, msg)))
}

// ============================================================================
// Amount: Format-Validated Decimal at Serde Layer
// ============================================================================

/// Monetary amount with format validation during deserialization.
///
/// Accepts both JSON numbers and JSON strings:
/// - Rejects `.5` (must be `0.5`)
/// - Rejects `5.` (must be `5.0` or `5`)
/// - Rejects negative amounts
/// - Rejects empty strings
#[derive(Debug, Clone, Copy, ToSchema)]
#[schema(value_type = String, example = "100.00")]
pub struct Amount(Decimal);

impl Amount {
    /// Get the inner Decimal value
    pub fn inner(self) -> Decimal {
        self.0
    }

    #[cfg(test)]
    pub fn from_decimal(d: Decimal) -> Self {
        Self(d)
    }
}

impl std::ops::Deref for Amount {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        // Support both JSON number and JSON string
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DecimalOrString {
            String(String),
            Number(Decimal),
        }

        let value = DecimalOrString::deserialize(deserializer)?;

        match value {
            DecimalOrString::String(s) => {
                if s.is_empty() {
                    return Err(D::Error::custom("Amount cannot be empty"));
                }
                if s.starts_with('.') {
                    return Err(D::Error::custom("Invalid format: use 0.5 not .5"));
                }
                if s.ends_with('.') {
                    return Err(D::Error::custom("Invalid format: use 5.0 not 5."));
                }

                let d = Decimal::from_str(&s)
                    .map_err(|e| D::Error::custom(format!("Invalid decimal: {}", e)))?;

                if d.is_sign_negative() {
                    return Err(D::Error::custom("Amount cannot be negative"));
                }

                Ok(Amount(d))
            }
            DecimalOrString::Number(d) => {
                if d.is_sign_negative() {
                    return Err(D::Error::custom("Amount cannot be negative"));
                }
                Ok(Amount(d))
            }
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Serialize as string to preserve precision
        serializer.serialize_str(&self.0.to_string())
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const VALIDATION: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;
    pub const COOLDOWN_ACTIVE: i32 = 1003;
    pub const WITHDRAWALS_CLOSED: i32 = 1004;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const FORBIDDEN: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4004;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount_from_json(json: &str) -> Result<Amount, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_amount_accepts_number_and_string() {
        assert_eq!(
            amount_from_json("100.5").unwrap().inner(),
            Decimal::new(1005, 1)
        );
        assert_eq!(
            amount_from_json("\"100.50\"").unwrap().inner(),
            Decimal::new(10050, 2)
        );
    }

    #[test]
    fn test_amount_rejects_bad_formats() {
        assert!(amount_from_json("\"\"").is_err());
        assert!(amount_from_json("\".5\"").is_err());
        assert!(amount_from_json("\"5.\"").is_err());
        assert!(amount_from_json("\"abc\"").is_err());
    }

    #[test]
    fn test_amount_rejects_negative() {
        assert!(amount_from_json("-1").is_err());
        assert!(amount_from_json("\"-0.01\"").is_err());
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let amount = Amount::from_decimal(Decimal::new(5000, 2));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"50.00\"");
    }

    #[test]
    fn test_api_response_shapes() {
        let ok = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(ok["code"], 0);
        assert_eq!(ok["msg"], "ok");
        assert_eq!(ok["data"], 5);

        let err = serde_json::to_value(ApiResponse::<()>::error(
            error_codes::VALIDATION,
            "bad input",
        ))
        .unwrap();
        assert_eq!(err["code"], 1001);
        assert!(err.get("data").is_none());
    }
}
