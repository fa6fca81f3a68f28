use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;

///
/// Id
///
/// Scalar entity identity. Serializes untagged, so JSON sees a plain
/// number or string.
///

#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Text(String),
}

impl Id {
    /// Render this id as a JSON value for link hashes.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_serialize_untagged() {
        assert_eq!(serde_json::to_value(Id::from(7)).unwrap(), json!(7));
        assert_eq!(serde_json::to_value(Id::from("abc")).unwrap(), json!("abc"));
        assert_eq!(Id::from(7).to_value(), json!(7));
    }

    #[test]
    fn ids_deserialize_from_number_or_string() {
        let int: Id = serde_json::from_value(json!(42)).unwrap();
        let text: Id = serde_json::from_value(json!("x-1")).unwrap();

        assert_eq!(int, Id::Int(42));
        assert_eq!(text, Id::Text("x-1".to_string()));
        assert_eq!(text.to_string(), "x-1");
    }
}
