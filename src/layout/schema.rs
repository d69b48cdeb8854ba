use alloy_primitives::Bytes;

use super::{deserialize, serialize, Layout, LayoutError, Value};

/// A typed view over a [`Layout`].
///
/// Implementors describe their wire layout once and map to and from the
/// generic [`Value`] tree; encoding and decoding come for free.
pub trait Schema: Sized {
    fn layout() -> Layout;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, LayoutError>;

    fn encode(&self) -> Result<Vec<u8>, LayoutError> {
        serialize(&Self::layout(), &self.to_value())
    }

    fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        Self::from_value(deserialize(&Self::layout(), bytes)?)
    }

    /// Size of the encoded form.
    fn encoded_size(&self) -> Result<usize, LayoutError> {
        match Self::layout().fixed_size() {
            Some(size) => Ok(size),
            None => Ok(self.encode()?.len()),
        }
    }
}

/// Content of a customizable slot (a length-prefixed or tail field).
///
/// Raw [`Bytes`] leave the slot uninterpreted; any [`Schema`] type decodes
/// the slot through its own layout.
pub trait Payload: Sized {
    fn slot_layout() -> Option<Layout>;

    fn to_slot_value(&self) -> Value;

    fn from_slot_value(value: Value) -> Result<Self, LayoutError>;
}

impl<T: Schema> Payload for T {
    fn slot_layout() -> Option<Layout> {
        Some(T::layout())
    }

    fn to_slot_value(&self) -> Value {
        self.to_value()
    }

    fn from_slot_value(value: Value) -> Result<Self, LayoutError> {
        T::from_value(value)
    }
}

impl Payload for Bytes {
    fn slot_layout() -> Option<Layout> {
        None
    }

    fn to_slot_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_slot_value(value: Value) -> Result<Self, LayoutError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            _ => Err(LayoutError::TypeMismatch {
                field: "payload",
                expected: "bytes",
            }),
        }
    }
}
