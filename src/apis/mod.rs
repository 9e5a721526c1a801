// Provider clients. Each wraps an injected HttpClientPort and implements the
// capability ports in app::ports.

pub mod apify;
pub mod sociavault;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::app::ports::HttpJsonResult;
use crate::error::{FinderError, Result};

pub use apify::ApifyClient;
pub use sociavault::SociaVaultClient;

const MAX_ERROR_BODY: usize = 300;

/// Providers encode lists either as arrays or as index-keyed objects
/// (`{"0": .., "1": ..}`). Both decode to a Vec in index order.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListOrMap<T> {
    List(Vec<T>),
    Map(std::collections::HashMap<String, T>),
}

impl<T> Default for ListOrMap<T> {
    fn default() -> Self {
        ListOrMap::List(Vec::new())
    }
}

impl<T> ListOrMap<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListOrMap::List(items) => items,
            ListOrMap::Map(map) => {
                let mut entries: Vec<(String, T)> = map.into_iter().collect();
                // Numeric keys in numeric order; anything else after them, lexically
                entries.sort_by(|(a, _), (b, _)| {
                    match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y),
                        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                        (Err(_), Err(_)) => a.cmp(b),
                    }
                });
                entries.into_iter().map(|(_, v)| v).collect()
            }
        }
    }
}

/// Optional list field that may also be `null`
pub fn list_of<T>(value: Option<ListOrMap<T>>) -> Vec<T> {
    value.map(ListOrMap::into_vec).unwrap_or_default()
}

/// Ids arrive as strings or as (large) integers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Str(String),
    Num(u64),
    Other(Value),
}

impl IdValue {
    pub fn as_id(&self) -> Option<String> {
        match self {
            IdValue::Str(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            IdValue::Num(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// First usable id among the candidates, in order
pub fn first_id(candidates: &[Option<&IdValue>]) -> Option<String> {
    candidates.iter().flatten().find_map(|id| id.as_id())
}

/// Counts may be integers, floats, numeric strings or null
pub fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from_value(&Value::deserialize(deserializer)?).unwrap_or(0))
}

pub fn lenient_opt_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from_value(&Value::deserialize(deserializer)?))
}

fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `null` becomes `false`
pub fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Trimmed, non-empty string
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn a non-2xx response into an UpstreamError
pub fn ensure_success(provider: &'static str, resp: HttpJsonResult) -> Result<Value> {
    if resp.is_success() {
        return Ok(resp.body);
    }
    let message = match &resp.body {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let message: String = message.chars().take(MAX_ERROR_BODY).collect();
    Err(FinderError::api(provider, resp.status, message))
}

/// Image references: `{ "url_list": [..] }` or `{ "url_list": {"0": ..} }`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoverImage {
    pub url_list: Option<ListOrMap<String>>,
}

impl CoverImage {
    pub fn first_url(self) -> Option<String> {
        list_of(self.url_list)
            .into_iter()
            .find(|u| !u.trim().is_empty())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_keyed_objects_keep_numeric_order() {
        let decoded: ListOrMap<String> =
            serde_json::from_value(json!({"10": "k", "2": "c", "0": "a", "1": "b"})).unwrap();
        assert_eq!(decoded.into_vec(), vec!["a", "b", "c", "k"]);

        let decoded: ListOrMap<String> = serde_json::from_value(json!(["x", "y"])).unwrap();
        assert_eq!(decoded.into_vec(), vec!["x", "y"]);
    }

    #[test]
    fn test_id_values() {
        let big: IdValue = serde_json::from_value(json!(7439000000000000001u64)).unwrap();
        assert_eq!(big.as_id().as_deref(), Some("7439000000000000001"));

        let blank = IdValue::Str("  ".into());
        let fallback = IdValue::Str("123".into());
        assert_eq!(first_id(&[Some(&blank), None, Some(&fallback)]).as_deref(), Some("123"));
    }

    #[test]
    fn test_lenient_counts() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "lenient_u64")]
            count: u64,
        }
        let parse = |v: Value| serde_json::from_value::<Row>(v).unwrap().count;
        assert_eq!(parse(json!({"count": 12})), 12);
        assert_eq!(parse(json!({"count": 12.0})), 12);
        assert_eq!(parse(json!({"count": "40"})), 40);
        assert_eq!(parse(json!({"count": null})), 0);
        assert_eq!(parse(json!({})), 0);
    }

    #[test]
    fn test_ensure_success_maps_status() {
        let err = ensure_success(
            "apify",
            HttpJsonResult {
                status: 402,
                body: json!("Payment required"),
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "apify API error (402): Payment required");
        assert!(!err.is_configuration());
    }
}
