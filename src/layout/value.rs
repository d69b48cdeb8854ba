use alloy_primitives::{Bytes, FixedBytes};

use super::LayoutError;

/// A decoded (or to-be-encoded) layout value.
///
/// Integers up to 16 bytes are carried as `u128`; typed schemas narrow them
/// with [`Record::take_uint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(u128),
    Bytes(Bytes),
    Record(Record),
    List(Vec<Value>),
}

impl Value {
    pub fn as_uint(&self) -> Option<u128> {
        match self {
            Self::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Unwraps a record, reporting `field` on mismatch.
    pub fn try_into_record(self, field: &'static str) -> Result<Record, LayoutError> {
        self.into_record().ok_or(LayoutError::TypeMismatch {
            field,
            expected: "record",
        })
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

macro_rules! impl_from_uint {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::Uint(value as u128)
            }
        })*
    };
}

impl_from_uint!(u8, u16, u32, u64, u128);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Uint(value as u128)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl<const N: usize> From<FixedBytes<N>> for Value {
    fn from(value: FixedBytes<N>) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value.as_slice()))
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(value: [u8; N]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(&value))
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

/// Named field values in layout order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    entries: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn get(&self, name: &'static str) -> Result<&Value, LayoutError> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
            .ok_or(LayoutError::MissingField(name))
    }

    pub fn uint(&self, name: &'static str) -> Result<u128, LayoutError> {
        self.get(name)?.as_uint().ok_or(LayoutError::TypeMismatch {
            field: name,
            expected: "integer",
        })
    }

    pub fn bytes(&self, name: &'static str) -> Result<&Bytes, LayoutError> {
        self.get(name)?.as_bytes().ok_or(LayoutError::TypeMismatch {
            field: name,
            expected: "bytes",
        })
    }

    pub fn list(&self, name: &'static str) -> Result<&[Value], LayoutError> {
        self.get(name)?.as_list().ok_or(LayoutError::TypeMismatch {
            field: name,
            expected: "list",
        })
    }

    fn take(&mut self, name: &'static str) -> Result<Value, LayoutError> {
        let index = self
            .entries
            .iter()
            .position(|(key, _)| *key == name)
            .ok_or(LayoutError::MissingField(name))?;
        Ok(self.entries.remove(index).1)
    }

    /// Removes an integer field and narrows it to `T`.
    pub fn take_uint<T: TryFrom<u128>>(&mut self, name: &'static str) -> Result<T, LayoutError> {
        let raw = match self.take(name)? {
            Value::Uint(raw) => raw,
            _ => {
                return Err(LayoutError::TypeMismatch {
                    field: name,
                    expected: "integer",
                })
            }
        };
        T::try_from(raw).map_err(|_| LayoutError::ValueOutOfRange {
            field: name,
            size: std::mem::size_of::<T>(),
            value: raw.to_string(),
        })
    }

    pub fn take_bool(&mut self, name: &'static str) -> Result<bool, LayoutError> {
        match self.take_uint::<u8>(name)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(LayoutError::InvalidValue {
                field: name,
                reason: format!("expected 0 or 1 for a boolean, got {other}"),
            }),
        }
    }

    pub fn take_bytes(&mut self, name: &'static str) -> Result<Bytes, LayoutError> {
        match self.take(name)? {
            Value::Bytes(bytes) => Ok(bytes),
            _ => Err(LayoutError::TypeMismatch {
                field: name,
                expected: "bytes",
            }),
        }
    }

    pub fn take_fixed<const N: usize>(
        &mut self,
        name: &'static str,
    ) -> Result<FixedBytes<N>, LayoutError> {
        let bytes = self.take_bytes(name)?;
        FixedBytes::<N>::try_from(bytes.as_ref()).map_err(|_| LayoutError::LengthMismatch {
            field: name,
            expected: N,
            actual: bytes.len(),
        })
    }

    pub fn take_record(&mut self, name: &'static str) -> Result<Record, LayoutError> {
        match self.take(name)? {
            Value::Record(record) => Ok(record),
            _ => Err(LayoutError::TypeMismatch {
                field: name,
                expected: "record",
            }),
        }
    }

    pub fn take_list(&mut self, name: &'static str) -> Result<Vec<Value>, LayoutError> {
        match self.take(name)? {
            Value::List(items) => Ok(items),
            _ => Err(LayoutError::TypeMismatch {
                field: name,
                expected: "list",
            }),
        }
    }

    /// Removes a raw or structured field without interpreting it.
    pub fn take_value(&mut self, name: &'static str) -> Result<Value, LayoutError> {
        self.take(name)
    }
}
