//! Chain-state component: the canonical tip.
//!
//! Owns the single piece of mutable shared state in the node, the tip
//! pointer, plus the genesis block it was seeded with. The tip only
//! moves through [`ChainState::advance_tip`], called by the persistence
//! component after the corresponding write has been made durable
//! (write-then-advance). The chain holds a non-owning link back to the
//! persistence component for metadata; the orchestrator owns both sides.

mod state;

pub use state::{
    ChainError, ChainEvent, ChainMetadata, ChainState, MetadataError, MetadataStore, Tip,
};
