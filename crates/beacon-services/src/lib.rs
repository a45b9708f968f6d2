//! beacon-services — presence registry, peer selection, and signaling relay.
//!
//! Every service here is stateless beyond its injected [`PeerStateStore`];
//! any number of service instances can share one store.

pub mod error;
pub mod memory_store;
pub mod registry;
pub mod relay;
pub mod scorer;
pub mod selector;
pub mod store;
pub mod sweep;
pub mod turn;

pub use error::{ServiceError, StoreError};
pub use memory_store::MemoryStore;
pub use registry::Registry;
pub use relay::Relay;
pub use scorer::{PeerScore, ScoreFactors};
pub use selector::{PeerQuery, Selector, SelectorConfig};
pub use store::PeerStateStore;
pub use sweep::{SweepReport, Sweeper};
pub use turn::{TurnCredentials, TurnIssuer};
