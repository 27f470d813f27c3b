use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire marker for a field the page did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// A value extracted from the page, or nothing.
///
/// `Absent` only turns into the `"N/A"` marker when serialized, so code inside
/// the crate never compares against the literal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    Present(T),
    #[default]
    Absent,
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

impl Field<String> {
    /// Empty text, or text spelled like the marker, counts as absent.
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(text) if !text.is_empty() && !text.is_sentinel() => Field::Present(text),
            _ => Field::Absent,
        }
    }
}

impl Field<Vec<String>> {
    /// An empty list, or one holding only the marker, counts as absent.
    pub fn from_entries(entries: Vec<String>) -> Self {
        if entries.is_sentinel() {
            Field::Absent
        } else {
            Field::Present(entries)
        }
    }
}

/// Values that are themselves spelled like the absence marker on the wire.
pub trait Sentinel {
    fn is_sentinel(&self) -> bool;
}

impl Sentinel for String {
    fn is_sentinel(&self) -> bool {
        self == NOT_AVAILABLE
    }
}

impl Sentinel for Vec<String> {
    fn is_sentinel(&self) -> bool {
        self.is_empty() || (self.len() == 1 && self[0] == NOT_AVAILABLE)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Present(value) => value.serialize(serializer),
            Field::Absent => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de> + Sentinel,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<V> {
            Value(V),
            Marker(String),
        }

        match Repr::<T>::deserialize(deserializer)? {
            Repr::Value(value) if value.is_sentinel() => Ok(Field::Absent),
            Repr::Value(value) => Ok(Field::Present(value)),
            Repr::Marker(marker) if marker == NOT_AVAILABLE => Ok(Field::Absent),
            Repr::Marker(other) => Err(serde::de::Error::custom(format!(
                "expected a value or \"{NOT_AVAILABLE}\", got {other:?}"
            ))),
        }
    }
}
