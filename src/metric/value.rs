use std::cmp;
use std::fmt;

/// A single field of a `Sample`.
///
/// Integers and floats are numeric and add together when samples are rolled
/// up. Booleans and text are categorical: once a roll-up has seen a value it
/// keeps it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Whole number, written as `123i` in line protocol.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// true / false
    Boolean(bool),
    /// Free text.
    Text(String),
}

impl FieldValue {
    /// Whether this value takes part in numeric roll-ups.
    pub fn is_numeric(&self) -> bool {
        match *self {
            FieldValue::Integer(_) | FieldValue::Float(_) => true,
            FieldValue::Boolean(_) | FieldValue::Text(_) => false,
        }
    }

    /// The value as a float, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Integer(i) => Some(i as f64),
            FieldValue::Float(f) => Some(f),
            FieldValue::Boolean(_) | FieldValue::Text(_) => None,
        }
    }

    /// Whether this value is a numeric zero. Categorical values are never
    /// zero.
    pub fn is_zero(&self) -> bool {
        self.as_f64().map_or(false, |f| f == 0.0)
    }

    /// Fold `incoming` into `self`.
    ///
    /// Numeric values add, integer plus integer saturating and anything
    /// involving a float becoming a float. A categorical accumulator, or a
    /// categorical incoming value, leaves `self` untouched: the first value
    /// seen wins.
    pub fn merge(&mut self, incoming: &FieldValue) {
        let merged = match (&*self, incoming) {
            (&FieldValue::Integer(x), &FieldValue::Integer(y)) => {
                FieldValue::Integer(x.saturating_add(y))
            }
            (&FieldValue::Integer(x), &FieldValue::Float(y)) => {
                FieldValue::Float(x as f64 + y)
            }
            (&FieldValue::Float(x), &FieldValue::Integer(y)) => {
                FieldValue::Float(x + y as f64)
            }
            (&FieldValue::Float(x), &FieldValue::Float(y)) => FieldValue::Float(x + y),
            _ => return,
        };
        *self = merged;
    }

    /// Total order over field values, used only to put leaves into a
    /// reproducible order. Variants order Integer < Float < Boolean < Text.
    pub fn total_cmp(&self, other: &FieldValue) -> cmp::Ordering {
        match (self, other) {
            (&FieldValue::Integer(x), &FieldValue::Integer(y)) => x.cmp(&y),
            (&FieldValue::Float(x), &FieldValue::Float(y)) => x.total_cmp(&y),
            (&FieldValue::Boolean(x), &FieldValue::Boolean(y)) => x.cmp(&y),
            (&FieldValue::Text(ref x), &FieldValue::Text(ref y)) => x.cmp(y),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match *self {
            FieldValue::Integer(_) => 0,
            FieldValue::Float(_) => 1,
            FieldValue::Boolean(_) => 2,
            FieldValue::Text(_) => 3,
        }
    }

    /// Render the value as an InfluxDB line protocol field value.
    pub fn to_line_protocol(&self, s: &mut String) {
        match *self {
            FieldValue::Integer(i) => {
                s.push_str(&i.to_string());
                s.push('i');
            }
            FieldValue::Float(f) => s.push_str(&f.to_string()),
            FieldValue::Boolean(b) => s.push_str(if b { "true" } else { "false" }),
            FieldValue::Text(ref t) => {
                s.push('"');
                for c in t.chars() {
                    if c == '"' || c == '\\' {
                        s.push('\\');
                    }
                    s.push(c);
                }
                s.push('"');
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Text(ref t) => write!(f, "{}", t),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> FieldValue {
        FieldValue::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> FieldValue {
        FieldValue::Integer(i64::from(i))
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> FieldValue {
        if u > i64::max_value() as u64 {
            FieldValue::Integer(i64::max_value())
        } else {
            FieldValue::Integer(u as i64)
        }
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> FieldValue {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> FieldValue {
        FieldValue::Boolean(b)
    }
}

impl<'a> From<&'a str> for FieldValue {
    fn from(s: &'a str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> FieldValue {
        FieldValue::Text(s)
    }
}
