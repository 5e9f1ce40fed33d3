use serde_json::Value;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

/// Store key the portfolio document is saved under.
pub const STATE_KEY: &str = "portfolio_v1";

/// Suggested file name for exports.
pub const EXPORT_FILE_NAME: &str = "portfolio-export.json";

/// Serialize the document for storage or export.
pub fn to_json(portfolio: &Portfolio, pretty: bool) -> Result<String, CoreError> {
    let result = if pretty {
        serde_json::to_string_pretty(portfolio)
    } else {
        serde_json::to_string(portfolio)
    };
    result.map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))
}

/// Parse a document previously written by [`to_json`].
pub fn parse_stored_document(raw: &str) -> Result<Portfolio, CoreError> {
    serde_json::from_str(raw).map_err(|e| CoreError::MalformedStoredState(e.to_string()))
}

/// Check the outer shape of an import document.
///
/// Must be an object with an `assets` array and a `settings` object. Field
/// level problems are caught afterwards by deserialization.
pub fn validate_import_document(doc: &Value) -> Result<(), CoreError> {
    let obj = doc
        .as_object()
        .ok_or_else(|| CoreError::MalformedImport("document is not a JSON object".into()))?;

    match obj.get("assets") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(CoreError::MalformedImport("`assets` is not an array".into())),
        None => return Err(CoreError::MalformedImport("missing `assets` array".into())),
    }

    match obj.get("settings") {
        Some(Value::Object(_)) => {}
        Some(_) => return Err(CoreError::MalformedImport("`settings` is not an object".into())),
        None => return Err(CoreError::MalformedImport("missing `settings` object".into())),
    }

    Ok(())
}

/// Parse and validate an import document.
pub fn parse_import_document(raw: &str) -> Result<Portfolio, CoreError> {
    let doc: Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::MalformedImport(format!("not valid JSON: {e}")))?;
    validate_import_document(&doc)?;
    serde_json::from_value(doc).map_err(|e| CoreError::MalformedImport(e.to_string()))
}
