use crate::{Error, Result};
use serde_json::Value;

/// One positional pair from the prediction reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePart {
    pub index: usize,
    /// Declared `type` tag, if the description carried one.
    pub tag: Option<String>,
    pub description: Value,
    pub payload: Value,
}

/// Pairs `descriptions[i]` with `responses[i]`.
///
/// Both arrays must be present and of equal length; otherwise nothing is
/// returned.
pub fn parse_response(body: Value) -> Result<Vec<ResponsePart>> {
    let Value::Object(mut body) = body else {
        return Err(Error::decode("prediction reply is not a JSON object"));
    };

    let descriptions = take_array(&mut body, "descriptions")?;
    let responses = take_array(&mut body, "responses")?;
    if descriptions.len() != responses.len() {
        return Err(Error::decode(format!(
            "reply has {} descriptions but {} responses",
            descriptions.len(),
            responses.len()
        )));
    }

    Ok(descriptions
        .into_iter()
        .zip(responses)
        .enumerate()
        .map(|(index, (description, payload))| ResponsePart {
            index,
            tag: description
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string),
            description,
            payload,
        })
        .collect())
}

fn take_array(body: &mut serde_json::Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match body.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::decode(format!("'{}' is not an array", key))),
        None => Err(Error::decode(format!("reply is missing '{}'", key))),
    }
}
