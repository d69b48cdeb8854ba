//! Production implementations of the trait seams in [`crate::traits`].
//!
//! - [`EvmNttAdapter`]: an NTT manager on an EVM chain, through Alloy
//! - [`EvmSigner`]: a wallet-carrying Alloy provider
//! - [`WormholescanAttestationSource`]: signed VAAs from the Wormholescan API
//! - [`TokioClock`]: real time
//!
//! Tests use the in-memory fakes in [`crate::testing`] instead.

mod evm;
mod evm_signer;
mod tokio_clock;
mod wormholescan;

pub use self::evm::EvmNttAdapter;
pub use self::evm_signer::EvmSigner;
pub use self::tokio_clock::TokioClock;
pub use self::wormholescan::WormholescanAttestationSource;
