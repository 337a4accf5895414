use ::serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::id::SnowflakeId;

fn check<E: de::Error>(raw: u64) -> Result<SnowflakeId, E> {
    let id = SnowflakeId::from_raw(raw);
    if !id.is_valid() {
        return Err(E::custom(format_args!(
            "{raw} is not a snowflake id (reserved top bit set)"
        )));
    }
    Ok(id)
}

/// Serializes as the raw `u64`.
impl Serialize for SnowflakeId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_raw().serialize(s)
    }
}

/// Deserializes from a raw `u64`, rejecting values with the reserved top bit
/// set.
impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        check(u64::deserialize(d)?)
    }
}

/// `#[serde(with = "as_padded_string")]` support: the ID as a 20-digit
/// zero-padded decimal string.
///
/// Useful for formats or consumers (e.g., JavaScript) that lose precision on
/// 64-bit integers. Padded strings sort the same way the integers do.
pub mod as_padded_string {
    use super::{Deserializer, Serializer, check, de};
    use crate::id::SnowflakeId;

    /// Serialize a snowflake ID as a zero-padded decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S: Serializer>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.to_padded_string())
    }

    /// Deserialize a snowflake ID from a decimal string, padded or not.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The string is not a decimal `u64`
    /// - The value has the reserved top bit set
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SnowflakeId, D::Error> {
        struct PaddedVisitor;

        impl de::Visitor<'_> for PaddedVisitor {
            type Value = SnowflakeId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a decimal snowflake id string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let raw = v
                    .parse::<u64>()
                    .map_err(|e| E::custom(format_args!("invalid snowflake id {v:?}: {e}")))?;
                check(raw)
            }
        }

        d.deserialize_str(PaddedVisitor)
    }
}
