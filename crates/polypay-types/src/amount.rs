//! Wire encoding for smallest-unit amounts.
//!
//! `u128` amounts are written as decimal strings (`"100000000"`), the same
//! way `rust_decimal` values travel with `serde-with-str`. Strings survive
//! JavaScript consumers and serde's buffered paths (internally tagged
//! enums), neither of which can carry a 128-bit integer.
//!
//! ```ignore
//! #[serde(with = "crate::amount")]
//! gross_amount: u128,
//! ```

use serde::{Deserialize, Deserializer, Serializer, de};

#[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by `serde(with)`
pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(amount)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| de::Error::custom(format!("invalid amount {raw:?}: expected base-10 u128")))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        amount: u128,
    }

    #[test]
    fn full_width_as_string() {
        let json = serde_json::to_string(&Wrapper { amount: u128::MAX }).unwrap();
        assert_eq!(json, format!(r#"{{"amount":"{}"}}"#, u128::MAX));
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount, u128::MAX);
    }

    #[test]
    fn rejects_numbers_and_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"amount":"-1"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"amount":"1.5"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"amount":100}"#).is_err());
    }
}
