// Neurons, synapses, network topology and the update scheduler.
//
// The network is an arena: neurons and synapses are addressed by stable
// integer ids that are never reused. Insertion order is preserved and
// index-addressable; groups (see group.rs) store id sets over the arena.

#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(not(feature = "std"))]
use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounded::Bounds;
use crate::error::EngineError;
use crate::group::{NeuronGroup, SynapseGroup};
use crate::prng::Prng;

pub type NeuronId = usize;
pub type SynapseId = usize;

/// A neuron's scalar output value.
pub type Activation = f64;

/// A synapse's scalar weight.
pub type Strength = f64;

/// Fixed seed for the asynchronous update sweep.
///
/// Every sweep reseeds its generator with this constant, so repeated runs
/// over the same network produce identical update-order sequences. This is a
/// reproducibility guarantee, not a bug; do not replace with system entropy.
pub const SWEEP_SEED: u64 = 4_123_123;

/// How a neuron computes its next activation from its net input.
///
/// A closed tagged set; variants carry their parameters and are dispatched
/// through [`UpdateRule::apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpdateRule {
    /// Holds its activation; used for externally driven input units.
    Clamped,
    /// Upper bound if net input exceeds the threshold, lower bound otherwise.
    Binary { threshold: f64 },
    /// Affine response, clamped to bounds.
    Linear { slope: f64, offset: f64 },
}

impl UpdateRule {
    /// Next activation from the weighted input sum, before clamping.
    pub fn apply(&self, net_input: f64, current: Activation, bounds: Bounds) -> Activation {
        match *self {
            UpdateRule::Clamped => current,
            UpdateRule::Binary { threshold } => {
                if net_input > threshold {
                    bounds.upper
                } else {
                    bounds.lower
                }
            }
            UpdateRule::Linear { slope, offset } => slope * net_input + offset,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Neuron {
    activation: Activation,
    /// Staging area for the next activation, decoupled from `activation`
    /// until committed.
    buffer: Activation,
    bounds: Bounds,
    rule: UpdateRule,
}

impl Neuron {
    pub fn new(bounds: Bounds, rule: UpdateRule) -> Self {
        Self {
            activation: bounds.clamp(0.0),
            buffer: bounds.clamp(0.0),
            bounds,
            rule,
        }
    }

    /// Binary neuron on `[-1, 1]` with a zero threshold.
    pub fn binary() -> Self {
        Self::new(Bounds::new(-1.0, 1.0), UpdateRule::Binary { threshold: 0.0 })
    }

    /// Clamped input neuron on `[0, 1]`.
    pub fn clamped_input() -> Self {
        Self::new(Bounds::new(0.0, 1.0), UpdateRule::Clamped)
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    pub fn set_activation(&mut self, value: Activation) {
        self.activation = self.bounds.clamp(value);
    }

    pub(crate) fn set_buffer(&mut self, value: Activation) {
        self.buffer = self.bounds.clamp(value);
    }

    pub(crate) fn commit_buffer(&mut self) {
        self.activation = self.buffer;
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Synapse {
    source: NeuronId,
    target: NeuronId,
    strength: Strength,
    bounds: Bounds,
}

impl Synapse {
    pub fn new(source: NeuronId, target: NeuronId, strength: Strength, bounds: Bounds) -> Self {
        Self {
            source,
            target,
            strength: bounds.clamp(strength),
            bounds,
        }
    }

    pub fn source(&self) -> NeuronId {
        self.source
    }

    pub fn target(&self) -> NeuronId {
        self.target
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_strength(&mut self, value: Strength) {
        self.strength = self.bounds.clamp(value);
    }

    /// Redraw the strength uniformly from the bounds.
    pub fn randomize(&mut self, rng: &mut Prng) {
        self.strength = self.bounds.sample(rng);
    }
}

/// A synapse without endpoints, used only for harvesting default values
/// when bulk-wiring groups.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseTemplate {
    pub strength: Strength,
    pub bounds: Bounds,
}

impl SynapseTemplate {
    pub fn new(strength: Strength, bounds: Bounds) -> Self {
        Self { strength, bounds }
    }

    pub fn instantiate(&self, source: NeuronId, target: NeuronId) -> Synapse {
        Synapse::new(source, target, self.strength, self.bounds)
    }
}

impl Default for SynapseTemplate {
    fn default() -> Self {
        Self {
            strength: 0.0,
            bounds: Bounds::default(),
        }
    }
}

/// Order policy for the asynchronous sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SweepOrder {
    /// `n` index draws with replacement from a generator reseeded with
    /// [`SWEEP_SEED`] every sweep. The same neuron may be selected several
    /// times and some not at all, and every sweep replays the same draw
    /// sequence. Preserved as-is; downstream behavior depends on it.
    #[default]
    SeededDraws,
    /// Fisher-Yates permutation over the same fixed-seed generator; every
    /// neuron is updated exactly once per sweep.
    Permutation,
}

#[derive(Debug, Clone)]
pub struct Network {
    neuron_order: Vec<NeuronId>,
    neurons: HashMap<NeuronId, Neuron>,

    synapse_order: Vec<SynapseId>,
    synapses: HashMap<SynapseId, Synapse>,

    // At most one synapse per ordered (source, target) pair.
    weight_index: HashMap<(NeuronId, NeuronId), SynapseId>,
    // Fan-in index for net-input computation.
    incoming: HashMap<NeuronId, Vec<SynapseId>>,

    pub(crate) neuron_groups: Vec<NeuronGroup>,
    pub(crate) synapse_groups: Vec<SynapseGroup>,

    rng: Prng,
    sweep_order: SweepOrder,

    next_neuron_id: NeuronId,
    next_synapse_id: SynapseId,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self::with_seed(1)
    }

    /// A network whose randomization draws are reproducible from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            neuron_order: Vec::new(),
            neurons: HashMap::new(),
            synapse_order: Vec::new(),
            synapses: HashMap::new(),
            weight_index: HashMap::new(),
            incoming: HashMap::new(),
            neuron_groups: Vec::new(),
            synapse_groups: Vec::new(),
            rng: Prng::new(seed),
            sweep_order: SweepOrder::default(),
            next_neuron_id: 0,
            next_synapse_id: 0,
        }
    }

    pub fn sweep_order(&self) -> SweepOrder {
        self.sweep_order
    }

    pub fn set_sweep_order(&mut self, order: SweepOrder) {
        self.sweep_order = order;
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Prng {
        &mut self.rng
    }

    // ---------------------------------------------------------------------
    // Topology
    // ---------------------------------------------------------------------

    /// Append a neuron; assigns the next index. O(1) amortized.
    pub fn add_neuron(&mut self, neuron: Neuron) -> NeuronId {
        let id = self.next_neuron_id;
        self.next_neuron_id += 1;
        self.neuron_order.push(id);
        self.neurons.insert(id, neuron);
        id
    }

    /// Append a synapse. Both endpoints must already be present, and the
    /// ordered (source, target) pair must be unused.
    pub fn add_synapse(&mut self, synapse: Synapse) -> Result<SynapseId, EngineError> {
        if !self.neurons.contains_key(&synapse.source) {
            return Err(EngineError::topology("synapse source not in network"));
        }
        if !self.neurons.contains_key(&synapse.target) {
            return Err(EngineError::topology("synapse target not in network"));
        }
        let pair = (synapse.source, synapse.target);
        if self.weight_index.contains_key(&pair) {
            return Err(EngineError::topology("duplicate synapse for ordered pair"));
        }

        let id = self.next_synapse_id;
        self.next_synapse_id += 1;
        self.incoming.entry(synapse.target).or_default().push(id);
        self.weight_index.insert(pair, id);
        self.synapse_order.push(id);
        self.synapses.insert(id, synapse);
        Ok(id)
    }

    /// Remove a neuron and every synapse attached to it.
    ///
    /// Any group still holding the id becomes stale and will fail fast on
    /// its next use.
    pub fn remove_neuron(&mut self, id: NeuronId) -> Option<Neuron> {
        let neuron = self.neurons.remove(&id)?;
        self.neuron_order.retain(|&n| n != id);

        let attached: Vec<SynapseId> = self
            .synapse_order
            .iter()
            .copied()
            .filter(|sid| {
                self.synapses
                    .get(sid)
                    .map(|s| s.source == id || s.target == id)
                    .unwrap_or(false)
            })
            .collect();
        for sid in attached {
            self.remove_synapse(sid);
        }
        self.incoming.remove(&id);
        Some(neuron)
    }

    pub fn remove_synapse(&mut self, id: SynapseId) -> Option<Synapse> {
        let synapse = self.synapses.remove(&id)?;
        self.synapse_order.retain(|&s| s != id);
        self.weight_index.remove(&(synapse.source, synapse.target));
        if let Some(fan_in) = self.incoming.get_mut(&synapse.target) {
            fan_in.retain(|&s| s != id);
        }
        Some(synapse)
    }

    /// The synapse from `a` to `b`, if any. Directed: `weight(a, b)` and
    /// `weight(b, a)` are independent.
    pub fn weight(&self, a: NeuronId, b: NeuronId) -> Option<&Synapse> {
        let sid = self.weight_index.get(&(a, b))?;
        self.synapses.get(sid)
    }

    pub(crate) fn weight_mut(&mut self, a: NeuronId, b: NeuronId) -> Option<&mut Synapse> {
        let sid = *self.weight_index.get(&(a, b))?;
        self.synapses.get_mut(&sid)
    }

    pub fn neuron_count(&self) -> usize {
        self.neuron_order.len()
    }

    pub fn synapse_count(&self) -> usize {
        self.synapse_order.len()
    }

    pub fn contains_neuron(&self, id: NeuronId) -> bool {
        self.neurons.contains_key(&id)
    }

    pub fn contains_synapse(&self, id: SynapseId) -> bool {
        self.synapses.contains_key(&id)
    }

    /// Id of the neuron at insertion-order `index`.
    pub fn neuron_id_at(&self, index: usize) -> Option<NeuronId> {
        self.neuron_order.get(index).copied()
    }

    pub fn synapse_id_at(&self, index: usize) -> Option<SynapseId> {
        self.synapse_order.get(index).copied()
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    pub fn synapse(&self, id: SynapseId) -> Option<&Synapse> {
        self.synapses.get(&id)
    }

    pub fn neuron_ids(&self) -> &[NeuronId] {
        &self.neuron_order
    }

    pub fn synapse_ids(&self) -> &[SynapseId] {
        &self.synapse_order
    }

    // ---------------------------------------------------------------------
    // Per-entity mutation (each write individually clamped/validated)
    // ---------------------------------------------------------------------

    pub fn set_activation(&mut self, id: NeuronId, value: Activation) -> bool {
        match self.neurons.get_mut(&id) {
            Some(n) => {
                n.set_activation(value);
                true
            }
            None => false,
        }
    }

    pub fn set_strength(&mut self, id: SynapseId, value: Strength) -> bool {
        match self.synapses.get_mut(&id) {
            Some(s) => {
                s.set_strength(value);
                true
            }
            None => false,
        }
    }

    /// Replace a neuron's bounds; the current activation and buffer are
    /// re-clamped into the new range.
    pub fn set_neuron_bounds(&mut self, id: NeuronId, bounds: Bounds) -> Result<(), EngineError> {
        bounds.validate().map_err(EngineError::config)?;
        let neuron = self
            .neurons
            .get_mut(&id)
            .ok_or_else(|| EngineError::topology("no such neuron"))?;
        neuron.bounds = bounds;
        neuron.activation = bounds.clamp(neuron.activation);
        neuron.buffer = bounds.clamp(neuron.buffer);
        Ok(())
    }

    pub fn set_synapse_bounds(&mut self, id: SynapseId, bounds: Bounds) -> Result<(), EngineError> {
        bounds.validate().map_err(EngineError::config)?;
        let synapse = self
            .synapses
            .get_mut(&id)
            .ok_or_else(|| EngineError::topology("no such synapse"))?;
        synapse.bounds = bounds;
        synapse.strength = bounds.clamp(synapse.strength);
        Ok(())
    }

    pub fn set_update_rule(&mut self, id: NeuronId, rule: UpdateRule) -> bool {
        match self.neurons.get_mut(&id) {
            Some(n) => {
                n.rule = rule;
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Whole-network vector I/O
    // ---------------------------------------------------------------------

    pub fn activations(&self) -> Vec<Activation> {
        self.neuron_order
            .iter()
            .filter_map(|id| self.neurons.get(id))
            .map(|n| n.activation)
            .collect()
    }

    pub fn set_activations(&mut self, pattern: &[Activation]) -> Result<(), EngineError> {
        if pattern.len() != self.neuron_order.len() {
            return Err(EngineError::DimensionMismatch {
                expected: self.neuron_order.len(),
                got: pattern.len(),
            });
        }
        for (id, &value) in self.neuron_order.iter().zip(pattern) {
            if let Some(n) = self.neurons.get_mut(id) {
                n.set_activation(value);
            }
        }
        Ok(())
    }

    pub fn randomize_activations(&mut self) {
        for id in &self.neuron_order {
            if let Some(n) = self.neurons.get_mut(id) {
                n.activation = n.bounds.sample(&mut self.rng);
            }
        }
    }

    /// Weighted sum over the current activations of all neurons with an
    /// incoming synapse to `id`.
    pub fn net_input(&self, id: NeuronId) -> f64 {
        let Some(fan_in) = self.incoming.get(&id) else {
            return 0.0;
        };
        let mut sum = 0.0;
        for sid in fan_in {
            if let Some(s) = self.synapses.get(sid) {
                if let Some(src) = self.neurons.get(&s.source) {
                    sum += s.strength * src.activation;
                }
            }
        }
        sum
    }

    // ---------------------------------------------------------------------
    // Update scheduler
    // ---------------------------------------------------------------------

    /// One asynchronous sweep: exactly `neuron_count()` scheduled updates
    /// with immediate commits, so later draws observe already-updated
    /// neighbors. An empty network performs zero draws.
    pub fn update(&mut self) {
        let n = self.neuron_order.len();
        if n == 0 {
            return;
        }

        // Reseeded per sweep: the draw sequence itself is deterministic.
        let mut sweep_rng = Prng::new(SWEEP_SEED);

        match self.sweep_order {
            SweepOrder::SeededDraws => {
                for _ in 0..n {
                    let idx = sweep_rng.gen_index(n);
                    let id = self.neuron_order[idx];
                    self.update_one(id);
                }
            }
            SweepOrder::Permutation => {
                let mut order = self.neuron_order.clone();
                for i in (1..n).rev() {
                    let j = sweep_rng.gen_index(i + 1);
                    order.swap(i, j);
                }
                for id in order {
                    self.update_one(id);
                }
            }
        }
    }

    /// Double-buffered step: every buffer is computed from the pre-step
    /// state, then all buffers are committed together.
    pub fn update_synchronous(&mut self) {
        let order = self.neuron_order.clone();
        for &id in &order {
            let net = self.net_input(id);
            if let Some(n) = self.neurons.get_mut(&id) {
                let next = n.rule.apply(net, n.activation, n.bounds);
                n.set_buffer(next);
            }
        }
        for &id in &order {
            if let Some(n) = self.neurons.get_mut(&id) {
                n.commit_buffer();
            }
        }
    }

    fn update_one(&mut self, id: NeuronId) {
        let net = self.net_input(id);
        if let Some(n) = self.neurons.get_mut(&id) {
            let next = n.rule.apply(net, n.activation, n.bounds);
            n.set_buffer(next);
            n.commit_buffer();
        }
    }

    // ---------------------------------------------------------------------
    // Structural snapshot (persistence boundary)
    // ---------------------------------------------------------------------

    /// Structural representation sufficient to reconstruct exact state.
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            sweep_order: self.sweep_order,
            rng_state: self.rng.state(),
            neurons: self
                .neuron_order
                .iter()
                .filter_map(|&id| {
                    self.neurons.get(&id).map(|n| NeuronState {
                        id,
                        activation: n.activation,
                        buffer: n.buffer,
                        bounds: n.bounds,
                        rule: n.rule,
                    })
                })
                .collect(),
            synapses: self
                .synapse_order
                .iter()
                .filter_map(|&id| {
                    self.synapses.get(&id).map(|s| SynapseState {
                        id,
                        source: s.source,
                        target: s.target,
                        strength: s.strength,
                        bounds: s.bounds,
                    })
                })
                .collect(),
            neuron_groups: self.neuron_groups.clone(),
            synapse_groups: self.synapse_groups.clone(),
            next_neuron_id: self.next_neuron_id,
            next_synapse_id: self.next_synapse_id,
        }
    }

    /// Rebuild a network from a snapshot, re-deriving the lookup indexes
    /// and re-validating the topology invariants.
    pub fn from_snapshot(snapshot: NetworkSnapshot) -> Result<Self, EngineError> {
        let mut net = Self::with_seed(1);
        net.rng = Prng::from_state(snapshot.rng_state);
        net.sweep_order = snapshot.sweep_order;

        for state in &snapshot.neurons {
            state.bounds.validate().map_err(EngineError::config)?;
            if net.neurons.contains_key(&state.id) {
                return Err(EngineError::topology("duplicate neuron id in snapshot"));
            }
            let mut neuron = Neuron::new(state.bounds, state.rule);
            neuron.set_activation(state.activation);
            neuron.set_buffer(state.buffer);
            net.neuron_order.push(state.id);
            net.neurons.insert(state.id, neuron);
        }

        for state in &snapshot.synapses {
            state.bounds.validate().map_err(EngineError::config)?;
            if net.synapses.contains_key(&state.id) {
                return Err(EngineError::topology("duplicate synapse id in snapshot"));
            }
            if !net.neurons.contains_key(&state.source) || !net.neurons.contains_key(&state.target)
            {
                return Err(EngineError::topology("snapshot synapse endpoint missing"));
            }
            let pair = (state.source, state.target);
            if net.weight_index.contains_key(&pair) {
                return Err(EngineError::topology("duplicate synapse for ordered pair"));
            }
            net.incoming.entry(state.target).or_default().push(state.id);
            net.weight_index.insert(pair, state.id);
            net.synapse_order.push(state.id);
            net.synapses.insert(
                state.id,
                Synapse::new(state.source, state.target, state.strength, state.bounds),
            );
        }

        net.neuron_groups = snapshot.neuron_groups;
        net.synapse_groups = snapshot.synapse_groups;
        net.next_neuron_id = snapshot
            .next_neuron_id
            .max(net.neuron_order.iter().copied().max().map_or(0, |m| m + 1));
        net.next_synapse_id = snapshot
            .next_synapse_id
            .max(net.synapse_order.iter().copied().max().map_or(0, |m| m + 1));
        Ok(net)
    }
}

/// Per-neuron entry in a [`NetworkSnapshot`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronState {
    pub id: NeuronId,
    pub activation: Activation,
    pub buffer: Activation,
    pub bounds: Bounds,
    pub rule: UpdateRule,
}

/// Per-synapse entry in a [`NetworkSnapshot`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseState {
    pub id: SynapseId,
    pub source: NeuronId,
    pub target: NeuronId,
    pub strength: Strength,
    pub bounds: Bounds,
}

/// Flat, order-preserving structural dump of a network.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkSnapshot {
    pub sweep_order: SweepOrder,
    pub rng_state: u64,
    pub neurons: Vec<NeuronState>,
    pub synapses: Vec<SynapseState>,
    pub neuron_groups: Vec<NeuronGroup>,
    pub synapse_groups: Vec<SynapseGroup>,
    pub next_neuron_id: NeuronId,
    pub next_synapse_id: SynapseId,
}
