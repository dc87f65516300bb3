use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single scalar value read from a worksheet cell
///
/// `Empty`, `Error` and empty-text cells are treated as missing: they never
/// appear in a filter's selectable values and never match a filter.
#[derive(Clone, Debug)]
pub enum CellValue {
    /// Blank cell
    Empty,

    /// Text content
    Text(String),

    /// Whole number (also used for floats without a fractional part)
    Int(i64),

    /// Floating point number
    Float(f64),

    /// Boolean
    Bool(bool),

    /// Excel date or timestamp
    DateTime(NaiveDateTime),

    /// Excel error such as `#N/A` or `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Build a numeric value, collapsing whole floats into `Int`
    ///
    /// Spreadsheet files store every number as a double, so `10` and `10.0`
    /// must end up as the same value for filtering to behave.
    pub fn number(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            CellValue::Int(f as i64)
        } else {
            CellValue::Float(f)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Whether the value counts as missing (null)
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty | CellValue::Error(_) => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    fn float_key(f: f64) -> u64 {
        // -0.0 and 0.0 are the same value
        if f == 0.0 { 0.0f64.to_bits() } else { f.to_bits() }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        use CellValue::*;
        match (self, other) {
            (Empty, Empty) => true,
            (Text(a), Text(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => Self::float_key(*a) == Self::float_key(*b),
            (Bool(a), Bool(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Error(a), Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Empty => {}
            CellValue::Text(s) | CellValue::Error(s) => s.hash(state),
            CellValue::Int(i) => i.hash(state),
            CellValue::Float(f) => Self::float_key(*f).hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => {
                if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
                    write!(f, "{}", dt.date())
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::number(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn whole_floats_become_ints() {
        assert_eq!(CellValue::number(10.0), CellValue::Int(10));
        assert_eq!(CellValue::number(2.5), CellValue::Float(2.5));
        assert!(matches!(CellValue::number(f64::NAN), CellValue::Float(_)));
    }

    #[test]
    fn missing_values() {
        assert!(CellValue::Empty.is_missing());
        assert!(CellValue::Error("#N/A".into()).is_missing());
        assert!(CellValue::text("").is_missing());
        assert!(!CellValue::text(" ").is_missing());
        assert!(!CellValue::Int(0).is_missing());
    }

    #[test]
    fn equality_is_by_type_and_value() {
        assert_ne!(CellValue::Int(1), CellValue::text("1"));
        assert_eq!(CellValue::Float(-0.0), CellValue::Float(0.0));

        let set: HashSet<CellValue> = [CellValue::Float(0.5), CellValue::Float(0.5), CellValue::text("a")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(dt).to_string(), "2024-03-01");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::number(3.0).to_string(), "3");
        assert_eq!(CellValue::Bool(true).to_string(), "true");
    }
}
