//! Winner-take-all competitive network.
//!
//! A clamped input layer feeds a fully connected output layer; training
//! picks the output with maximal net input and moves its incoming weights
//! toward the input pattern. Losers optionally drift (leaky learning) or
//! decay (Alvarez-Squire).

#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounded::Bounds;
use crate::error::EngineError;
use crate::learning::{select_winner, winner_take_all};
use crate::network::{
    Activation, Network, Neuron, NeuronId, Strength, SynapseTemplate, UpdateRule,
};

const INPUT_GROUP: &str = "inputs";
const OUTPUT_GROUP: &str = "outputs";

/// Loser-handling flavor of the competitive update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpdateMethod {
    /// Classic competitive learning; only the winner (and, with leaky
    /// learning, a weak echo on the losers) changes.
    #[default]
    RummZipser,
    /// Adds a multiplicative decay on all non-winning weights each step.
    AlvarezSquire,
}

/// Tunable parameters of the winner-take-all rule.
///
/// `Default` gives a conservative Rumelhart-Zipser setup; override fields
/// through the `with_*` builders and check coherence with [`validate`].
///
/// [`validate`]: CompetitiveParams::validate
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompetitiveParams {
    /// Step size (epsilon) of the winner update.
    pub learning_rate: f64,
    /// Activation assigned to the winning output after a step.
    pub win_value: f64,
    /// Activation assigned to losing outputs after a step.
    pub lose_value: f64,
    /// When set, losers drift weakly toward the input instead of decaying.
    pub use_leaky_learning: bool,
    /// Step size of the leaky drift.
    pub leaky_learning_rate: f64,
    /// Rescale each output's incoming weight vector to component sum 1
    /// after every step.
    pub normalize_inputs: bool,
    /// Fraction of each non-winning weight forgotten per step
    /// (Alvarez-Squire only).
    pub synapse_decay_percent: f64,
    pub update_method: UpdateMethod,
}

impl Default for CompetitiveParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            win_value: 1.0,
            lose_value: 0.0,
            use_leaky_learning: false,
            leaky_learning_rate: 0.025,
            normalize_inputs: false,
            synapse_decay_percent: 0.0,
            update_method: UpdateMethod::RummZipser,
        }
    }
}

impl CompetitiveParams {
    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn with_win_value(mut self, value: f64) -> Self {
        self.win_value = value;
        self
    }

    pub fn with_lose_value(mut self, value: f64) -> Self {
        self.lose_value = value;
        self
    }

    pub fn with_leaky_learning(mut self, rate: f64) -> Self {
        self.use_leaky_learning = true;
        self.leaky_learning_rate = rate;
        self
    }

    pub fn with_normalize_inputs(mut self, on: bool) -> Self {
        self.normalize_inputs = on;
        self
    }

    pub fn with_synapse_decay(mut self, percent: f64) -> Self {
        self.synapse_decay_percent = percent;
        self.update_method = UpdateMethod::AlvarezSquire;
        self
    }

    pub fn with_update_method(mut self, method: UpdateMethod) -> Self {
        self.update_method = method;
        self
    }

    /// Coherence check; every training entry point calls this before
    /// touching any weight.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.learning_rate.is_finite() || !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(EngineError::config("learning_rate must lie in [0, 1]"));
        }
        if !self.leaky_learning_rate.is_finite() || !(0.0..=1.0).contains(&self.leaky_learning_rate)
        {
            return Err(EngineError::config("leaky_learning_rate must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.lose_value)
            || !(0.0..=1.0).contains(&self.win_value)
            || self.lose_value > self.win_value
        {
            return Err(EngineError::config(
                "output values must satisfy 0 <= lose_value <= win_value <= 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.synapse_decay_percent) {
            return Err(EngineError::config(
                "synapse_decay_percent must lie in [0, 1]",
            ));
        }
        if self.update_method == UpdateMethod::RummZipser && self.synapse_decay_percent != 0.0 {
            return Err(EngineError::config(
                "synapse decay requires the Alvarez-Squire update method",
            ));
        }
        Ok(())
    }
}

/// A self-contained two-layer competitive network.
#[derive(Debug, Clone)]
pub struct Competitive {
    net: Network,
    params: CompetitiveParams,
    input_group: String,
    output_group: String,
}

impl Competitive {
    /// Clamped inputs in `[0, 1]`, linear outputs in `[0, 1]`, full
    /// feedforward wiring with weights drawn uniformly from `[0, 1]`.
    pub fn new(
        input_count: usize,
        output_count: usize,
        params: CompetitiveParams,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        if input_count == 0 || output_count == 0 {
            return Err(EngineError::config(
                "a competitive network needs at least one input and one output",
            ));
        }
        let mut net = Network::new();
        let inputs: Vec<NeuronId> = (0..input_count)
            .map(|_| net.add_neuron(Neuron::clamped_input()))
            .collect();
        net.define_group(INPUT_GROUP, &inputs)?;
        Self::attach(&mut net, INPUT_GROUP, OUTPUT_GROUP, output_count, &params)?;
        net.randomize_group_weights(OUTPUT_GROUP)?;
        Ok(Self {
            net,
            params,
            input_group: INPUT_GROUP.to_string(),
            output_group: OUTPUT_GROUP.to_string(),
        })
    }

    /// Wires a fresh competitive output layer into an existing network,
    /// reading its inputs from `input_group`. The feedforward synapses are
    /// registered as a synapse group named after `output_group`.
    pub fn attach(
        net: &mut Network,
        input_group: &str,
        output_group: &str,
        output_count: usize,
        params: &CompetitiveParams,
    ) -> Result<(), EngineError> {
        params.validate()?;
        if output_count == 0 {
            return Err(EngineError::config(
                "a competitive layer needs at least one output",
            ));
        }
        // Every name is checked before the first neuron; a failed attach
        // leaves nothing registered.
        net.group_members_checked(input_group)?;
        if net.neuron_group(output_group).is_some() {
            return Err(EngineError::config(format!(
                "duplicate group name '{output_group}'"
            )));
        }
        if net.synapse_group(output_group).is_some() {
            return Err(EngineError::config(format!(
                "duplicate synapse group name '{output_group}'"
            )));
        }
        let outputs: Vec<NeuronId> = (0..output_count)
            .map(|_| {
                net.add_neuron(Neuron::new(
                    Bounds::new(0.0, 1.0),
                    UpdateRule::Linear {
                        slope: 1.0,
                        offset: 0.0,
                    },
                ))
            })
            .collect();
        net.define_group(output_group, &outputs)?;
        let template = SynapseTemplate::new(0.0, Bounds::new(0.0, 1.0));
        net.connect_groups(output_group, input_group, output_group, template)?;
        Ok(())
    }

    /// One training step on `pattern`. Clamps the pattern onto the input
    /// group, runs the winner-take-all update, and returns the winning
    /// output index.
    pub fn train(&mut self, pattern: &[Activation]) -> Result<usize, EngineError> {
        self.net.set_group_activations(&self.input_group, pattern)?;
        winner_take_all(
            &mut self.net,
            &self.input_group,
            &self.output_group,
            &self.params,
        )
    }

    /// Classification without learning: clamps `pattern`, settles the
    /// output layer, returns the winner. No weight changes.
    pub fn compete(&mut self, pattern: &[Activation]) -> Result<usize, EngineError> {
        self.net.set_group_activations(&self.input_group, pattern)?;
        let inputs = self.net.group_members_checked(&self.input_group)?;
        let outputs = self.net.group_members_checked(&self.output_group)?;
        let winner = select_winner(&self.net, &inputs, &outputs);
        for (k, &out) in outputs.iter().enumerate() {
            let value = if k == winner {
                self.params.win_value
            } else {
                self.params.lose_value
            };
            self.net.set_activation(out, value);
        }
        Ok(winner)
    }

    /// Re-draws every feedforward weight uniformly from its bounds.
    pub fn randomize_weights(&mut self) -> Result<(), EngineError> {
        self.net.randomize_group_weights(&self.output_group)
    }

    /// Incoming feedforward weights of the output at `index`, in input
    /// order.
    pub fn incoming_weights(&self, index: usize) -> Result<Vec<Strength>, EngineError> {
        let inputs = self.net.group_members_checked(&self.input_group)?;
        let outputs = self.net.group_members_checked(&self.output_group)?;
        let out = *outputs
            .get(index)
            .ok_or_else(|| EngineError::config("output index out of range"))?;
        Ok(inputs
            .iter()
            .map(|&inp| self.net.weight(inp, out).map_or(0.0, |s| s.strength()))
            .collect())
    }

    pub fn output_activations(&self) -> Result<Vec<Activation>, EngineError> {
        self.net.group_activations(&self.output_group)
    }

    pub fn params(&self) -> &CompetitiveParams {
        &self.params
    }

    pub fn set_params(&mut self, params: CompetitiveParams) -> Result<(), EngineError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.net
    }
}
