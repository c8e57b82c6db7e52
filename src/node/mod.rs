//! Single-node façade
//!
//! Owns the chain behind one lock and wires transaction submission, peer
//! transaction construction, mining and block commit together.

#[allow(clippy::module_inception)]
pub mod node;
pub mod summary;

pub use node::Node;
pub use summary::{BalanceSummary, BlockSummary, ChainSummary};
