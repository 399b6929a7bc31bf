//! Discrete Hopfield associative memory over the generic substrate.
//!
//! Wraps a [`Network`] built as a full symmetric recurrent topology of
//! binary threshold neurons, with Hebbian outer-product storage and the
//! seeded asynchronous sweep as recall dynamics.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::bounded::round_to;
use crate::error::EngineError;
use crate::learning::LearningRule;
use crate::network::{Activation, Network, Neuron, NeuronId, Synapse, SynapseTemplate};

#[derive(Debug, Clone)]
pub struct Hopfield {
    net: Network,
}

impl Hopfield {
    /// Builds `n` binary neurons wired all-to-all without self-connections.
    /// Every unordered pair gets two directed synapses holding the same
    /// integral weight, drawn uniformly from `[-1, 1]` and rounded.
    pub fn new(n: usize) -> Result<Self, EngineError> {
        if n == 0 {
            return Err(EngineError::config(
                "a hopfield network needs at least one neuron",
            ));
        }
        let mut net = Network::new();
        let ids: Vec<NeuronId> = (0..n).map(|_| net.add_neuron(Neuron::binary())).collect();
        let template = SynapseTemplate::default();
        for i in 0..n {
            for j in 0..i {
                net.add_synapse(template.instantiate(ids[j], ids[i]))?;
                net.add_synapse(template.instantiate(ids[i], ids[j]))?;
            }
        }
        let mut hopfield = Hopfield { net };
        hopfield.randomize_weights();
        Ok(hopfield)
    }

    /// Clamps the given pattern onto the neurons, in index order.
    pub fn set_pattern(&mut self, pattern: &[Activation]) -> Result<(), EngineError> {
        self.net.set_activations(pattern)
    }

    pub fn pattern(&self) -> Vec<Activation> {
        self.net.activations()
    }

    /// Stores the current activation pattern as a Hebbian trace. Cumulative
    /// across calls; mirrored synapses receive identical increments, so
    /// symmetry is preserved in practice even though each direction is
    /// updated independently.
    pub fn train(&mut self) -> Result<(), EngineError> {
        LearningRule::HebbianOuterProduct.apply(&mut self.net)?;
        Ok(())
    }

    /// One seeded asynchronous recall sweep.
    pub fn update(&mut self) {
        self.net.update();
    }

    /// Re-draws every upper-triangular pair uniformly from the synapse
    /// bounds, rounds to an integer, and mirrors it onto the reverse
    /// synapse. Re-establishes the symmetry invariant.
    pub fn randomize_weights(&mut self) {
        let ids = self.net.neuron_ids().to_vec();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let Some(bounds) = self.net.weight(ids[i], ids[j]).map(|s| s.bounds()) else {
                    continue;
                };
                let value = round_to(bounds.sample(self.net.rng_mut()), 0);
                if let Some(forward) = self.net.weight_mut(ids[i], ids[j]) {
                    forward.set_strength(value);
                }
                if let Some(reverse) = self.net.weight_mut(ids[j], ids[i]) {
                    reverse.set_strength(value);
                }
            }
        }
    }

    /// Strength of the synapse between the neurons at positions `i` and `j`.
    pub fn weight(&self, i: usize, j: usize) -> Option<&Synapse> {
        let a = self.net.neuron_id_at(i)?;
        let b = self.net.neuron_id_at(j)?;
        self.net.weight(a, b)
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.net
    }
}
