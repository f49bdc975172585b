//! Defensive JSON extraction from free-text model replies

use super::OptimizeError;

/// Locates the JSON object inside a model reply.
///
/// The model is asked for raw JSON but is not contractually guaranteed to
/// comply: replies arrive wrapped in markdown fences, prefixed with prose,
/// or both. Fence markers are dropped first, then the text is sliced from
/// the first `{` to the last `}` inclusive. A reply without such a pair is
/// a fatal parse failure, never a partial result.
pub fn extract_json(raw: &str) -> Result<String, OptimizeError> {
    let cleaned = raw.replace("```json", "").replace("```", "");

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(first), Some(last)) if last > first => Ok(cleaned[first..=last].to_string()),
        _ => Err(OptimizeError::Parse(
            "no JSON object found in reply".to_string(),
        )),
    }
}
