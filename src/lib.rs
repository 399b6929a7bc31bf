//! # neurosim
//!
//! A small engine for classical, rule-based neural network simulation:
//! fixed-topology recurrent nets (Hopfield associative memory) and
//! competitive winner-take-all nets.
//!
//! The engine is deliberately minimal and deterministic: no backprop, no
//! gradient machinery, no hidden threads. A caller builds a [`network::Network`]
//! (or one of the prewired nets), then drives it in a loop: `update()` advances
//! activations, `train()` adapts weights.
//!
//! ## Quick Start
//!
//! ```
//! use neurosim::prelude::*;
//!
//! // Four-neuron associative memory.
//! let mut hopfield = Hopfield::new(4).unwrap();
//!
//! // Store a pattern, then recall from a corrupted cue.
//! hopfield.set_pattern(&[1.0, 1.0, -1.0, -1.0]).unwrap();
//! hopfield.train().unwrap();
//!
//! hopfield.set_pattern(&[1.0, -1.0, -1.0, -1.0]).unwrap();
//! hopfield.update();
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support; gates the `storage` module
//!   and the demo binary
//! - `serde`: Enable serialization/deserialization of engine state
//!
//! ## no_std Support
//!
//! Disable default features for `no_std` environments:
//! ```toml
//! neurosim = { version = "0.1", default-features = false }
//! ```
//!
//! ## Modules
//!
//! - [`network`]: Neurons, synapses, topology and the update scheduler
//! - [`group`]: Named neuron/synapse aggregates and bulk operations
//! - [`learning`]: Hebbian and winner-take-all learning rules
//! - [`hopfield`]: Symmetric binary associative memory
//! - [`competitive`]: Winner-take-all competitive network

// no_std support
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/bounded.rs"]
pub mod bounded;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/group.rs"]
pub mod group;

#[path = "core/learning.rs"]
pub mod learning;

#[path = "core/hopfield.rs"]
pub mod hopfield;

#[path = "core/competitive.rs"]
pub mod competitive;

#[cfg(feature = "std")]
#[path = "core/storage.rs"]
pub mod storage;

/// Prelude module for convenient imports.
///
/// ```
/// use neurosim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bounded::{round_to, Bounds};
    pub use crate::competitive::{Competitive, CompetitiveParams, UpdateMethod};
    pub use crate::error::EngineError;
    pub use crate::group::{NeuronGroup, SynapseGroup};
    pub use crate::hopfield::Hopfield;
    pub use crate::learning::LearningRule;
    pub use crate::network::{
        Activation, Network, Neuron, NeuronId, Strength, SweepOrder, Synapse, SynapseId,
        SynapseTemplate, UpdateRule,
    };
    pub use crate::prng::Prng;
}
