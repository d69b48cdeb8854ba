//! Name-keyed layout registry
//!
//! Attestation payloads arrive as bytes whose structure is only known once a
//! discriminator or the attestation type has been inspected. The registry maps
//! symbolic names to composed layouts so such payloads can be decoded into a
//! generic [`Value`] tree; new variants are added with
//! [`LayoutRegistry::register`] without touching the codec.

use std::collections::HashMap;

use alloy_primitives::Bytes;

use super::{
    ManagerMessage, NativeTokenTransfer, TransceiverInfo, TransceiverRegistration, Vaa,
    WormholeTransferMessage,
};
use crate::layout::{deserialize, serialize, Layout, LayoutError, Schema, Value};

pub const WORMHOLE_TRANSFER: &str = "Ntt:WormholeTransfer";
pub const NATIVE_TOKEN_TRANSFER: &str = "Ntt:NativeTokenTransfer";
pub const TRANSCEIVER_INFO: &str = "Ntt:TransceiverInfo";
pub const TRANSCEIVER_REGISTRATION: &str = "Ntt:TransceiverRegistration";
pub const MANAGER_MESSAGE: &str = "Ntt:ManagerMessage";

#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: HashMap<String, Layout>,
}

impl LayoutRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the NTT catalogue.
    pub fn ntt() -> Result<Self, LayoutError> {
        let mut registry = Self::new();
        registry.register(
            WORMHOLE_TRANSFER,
            Vaa::<Bytes>::layout().customize("body.payload", WormholeTransferMessage::layout())?,
        );
        registry.register(NATIVE_TOKEN_TRANSFER, NativeTokenTransfer::layout());
        registry.register(TRANSCEIVER_INFO, TransceiverInfo::layout());
        registry.register(TRANSCEIVER_REGISTRATION, TransceiverRegistration::layout());
        registry.register(
            MANAGER_MESSAGE,
            ManagerMessage::<NativeTokenTransfer>::layout(),
        );
        Ok(registry)
    }

    /// Registers (or replaces) a layout under `name`.
    pub fn register(&mut self, name: impl Into<String>, layout: Layout) {
        self.layouts.insert(name.into(), layout);
    }

    pub fn get(&self, name: &str) -> Result<&Layout, LayoutError> {
        self.layouts
            .get(name)
            .ok_or_else(|| LayoutError::UnknownLayout(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn decode(&self, name: &str, bytes: &[u8]) -> Result<Value, LayoutError> {
        deserialize(self.get(name)?, bytes)
    }

    pub fn encode(&self, name: &str, value: &Value) -> Result<Vec<u8>, LayoutError> {
        serialize(self.get(name)?, value)
    }
}
