//! Scalar data values (spec §3.2).

use serde_json::Number;

/// A scalar field value. Maps-of-scalar and nested records are not scalars
/// (spec §3.2) — only these five shapes are representable.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
    /// Epoch milliseconds (spec §4.6: "dates: compared by epoch milliseconds").
    Date(i64),
    Array(Vec<Scalar>),
}

/// The declared type of a data field, independent of any particular value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScalarType {
    Boolean,
    Number,
    String,
    Date,
    Array,
}

impl Scalar {
    #[must_use]
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Bool(_) => ScalarType::Boolean,
            Scalar::Number(_) => ScalarType::Number,
            Scalar::String(_) => ScalarType::String,
            Scalar::Date(_) => ScalarType::Date,
            Scalar::Array(_) => ScalarType::Array,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Scalar::Number(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<i64> {
        match self {
            Scalar::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Scalar::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn matches_type(&self, ty: ScalarType) -> bool {
        self.scalar_type() == ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_matches_variant() {
        assert_eq!(Scalar::Bool(true).scalar_type(), ScalarType::Boolean);
        assert_eq!(Scalar::Date(0).scalar_type(), ScalarType::Date);
        assert!(Scalar::String("x".into()).matches_type(ScalarType::String));
        assert!(!Scalar::String("x".into()).matches_type(ScalarType::Number));
    }
}
