//! The Open Assembly response envelope.
//!
//! Every portal service wraps its rows as
//! `{ "<SERVICE>": [ { "head": [...] }, { "row": [...] } ] }`. When a query
//! matches nothing the service name is absent and the body is a bare
//! `{ "RESULT": { "CODE": "INFO-200", ... } }`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::Error;

/// Result code the portal uses for "no matching data".
pub const NO_DATA_CODE: &str = "INFO-200";

/// Status block returned by the portal.
#[derive(Debug, Deserialize)]
pub struct PortalResult {
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "MESSAGE", default)]
    pub message: String,
}

/// Extract the rows of `service` from a portal response body.
///
/// A "no data" result yields an empty vector; any other body that lacks the
/// service key or the `row` array is reported as [`Error::UnexpectedShape`].
pub fn parse_envelope<T: DeserializeOwned>(service: &str, body: &str) -> Result<Vec<T>, Error> {
    let value: Value = serde_json::from_str(body)?;

    let Some(sections) = value.get(service) else {
        if let Some(result) = value.get("RESULT") {
            let result: PortalResult = serde_json::from_value(result.clone())?;
            if result.code == NO_DATA_CODE {
                return Ok(Vec::new());
            }
            return Err(Error::UnexpectedShape(format!(
                "{}: {} {}",
                service, result.code, result.message
            )));
        }
        return Err(Error::UnexpectedShape(format!("missing {} key", service)));
    };

    let rows = sections
        .as_array()
        .and_then(|parts| parts.iter().find_map(|part| part.get("row")))
        .ok_or_else(|| Error::UnexpectedShape(format!("{} has no row section", service)))?;

    Ok(serde_json::from_value(rows.clone())?)
}
