// Named aggregates over the network arena.
//
// Groups hold ids, not references. Removing a neuron or synapse from the
// network leaves any group that mentions it stale; every group operation
// re-validates membership and fails fast instead of touching dangling state.

#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::network::{Activation, Network, NeuronId, SynapseId, SynapseTemplate};

/// Named ordered subset of a network's neurons.
///
/// The addressable unit for vector I/O and the endpoint of a
/// [`SynapseGroup`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronGroup {
    name: String,
    members: Vec<NeuronId>,
}

impl NeuronGroup {
    pub(crate) fn new(name: String, members: Vec<NeuronId>) -> Self {
        Self { name, members }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[NeuronId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Named subset of a network's synapses connecting exactly one source
/// neuron group to one target neuron group.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseGroup {
    name: String,
    source_group: String,
    target_group: String,
    members: Vec<SynapseId>,
}

impl SynapseGroup {
    pub(crate) fn new(
        name: String,
        source_group: String,
        target_group: String,
        members: Vec<SynapseId>,
    ) -> Self {
        Self {
            name,
            source_group,
            target_group,
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_group(&self) -> &str {
        &self.source_group
    }

    pub fn target_group(&self) -> &str {
        &self.target_group
    }

    pub fn members(&self) -> &[SynapseId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True iff source and target are the same neuron group.
    pub fn is_recurrent(&self) -> bool {
        self.source_group == self.target_group
    }
}

impl Network {
    /// Register a named group over existing neurons.
    pub fn define_group(&mut self, name: &str, members: &[NeuronId]) -> Result<(), EngineError> {
        if self.neuron_groups.iter().any(|g| g.name == name) {
            return Err(EngineError::config(format!("duplicate group name '{name}'")));
        }
        for &id in members {
            if !self.contains_neuron(id) {
                return Err(EngineError::topology(format!(
                    "group '{name}' member {id} not in network"
                )));
            }
        }
        self.neuron_groups
            .push(NeuronGroup::new(name.to_string(), members.to_vec()));
        Ok(())
    }

    pub fn neuron_group(&self, name: &str) -> Option<&NeuronGroup> {
        self.neuron_groups.iter().find(|g| g.name == name)
    }

    pub fn synapse_group(&self, name: &str) -> Option<&SynapseGroup> {
        self.synapse_groups.iter().find(|g| g.name == name)
    }

    pub fn neuron_groups(&self) -> &[NeuronGroup] {
        &self.neuron_groups
    }

    pub fn synapse_groups(&self) -> &[SynapseGroup] {
        &self.synapse_groups
    }

    /// Fully wire `source` to `target` with synapses harvested from the
    /// template, registering the result as a named synapse group.
    ///
    /// Recurrent wiring (source == target) skips self-connections.
    /// All-or-nothing: no synapse is created unless every pair is free.
    pub fn connect_groups(
        &mut self,
        name: &str,
        source: &str,
        target: &str,
        template: SynapseTemplate,
    ) -> Result<(), EngineError> {
        if self.synapse_groups.iter().any(|g| g.name == name) {
            return Err(EngineError::config(format!(
                "duplicate synapse group name '{name}'"
            )));
        }
        template.bounds.validate().map_err(EngineError::config)?;

        let source_members = self.group_members_checked(source)?;
        let target_members = self.group_members_checked(target)?;
        let recurrent = source == target;

        let mut pairs: Vec<(NeuronId, NeuronId)> = Vec::new();
        for &s in &source_members {
            for &t in &target_members {
                if recurrent && s == t {
                    continue;
                }
                if self.weight(s, t).is_some() {
                    return Err(EngineError::topology(format!(
                        "pair ({s}, {t}) already wired"
                    )));
                }
                pairs.push((s, t));
            }
        }

        let mut members = Vec::with_capacity(pairs.len());
        for (s, t) in pairs {
            let sid = self.add_synapse(template.instantiate(s, t))?;
            members.push(sid);
        }
        self.synapse_groups.push(SynapseGroup::new(
            name.to_string(),
            source.to_string(),
            target.to_string(),
            members,
        ));
        Ok(())
    }

    /// The group's activation vector, in member order.
    pub fn group_activations(&self, name: &str) -> Result<Vec<Activation>, EngineError> {
        let members = self.group_members_checked(name)?;
        Ok(members
            .iter()
            .filter_map(|id| self.neuron(*id))
            .map(|n| n.activation())
            .collect())
    }

    /// Write an activation vector into the group, clamped per neuron.
    /// All-or-nothing: validated before any write.
    pub fn set_group_activations(
        &mut self,
        name: &str,
        pattern: &[Activation],
    ) -> Result<(), EngineError> {
        let members = self.group_members_checked(name)?;
        if pattern.len() != members.len() {
            return Err(EngineError::DimensionMismatch {
                expected: members.len(),
                got: pattern.len(),
            });
        }
        for (&id, &value) in members.iter().zip(pattern) {
            self.set_activation(id, value);
        }
        Ok(())
    }

    /// Redraw every contained synapse independently from its own bounds
    /// (no symmetry assumption).
    pub fn randomize_group_weights(&mut self, name: &str) -> Result<(), EngineError> {
        let members = self.synapse_group_members_checked(name)?;
        for sid in members {
            let strength = {
                let synapse = self
                    .synapse(sid)
                    .ok_or_else(|| EngineError::stale(name, format!("synapse {sid} was removed")))?;
                let bounds = synapse.bounds();
                bounds.sample(self.rng_mut())
            };
            self.set_strength(sid, strength);
        }
        Ok(())
    }

    /// Bulk multiplicative decay: every contained strength shrinks by
    /// `percent` (in `[0, 1]`).
    pub fn decay_group_weights(&mut self, name: &str, percent: f64) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&percent) {
            return Err(EngineError::config("decay percent must be in [0, 1]"));
        }
        let members = self.synapse_group_members_checked(name)?;
        let keep = 1.0 - percent;
        for sid in members {
            let strength = self
                .synapse(sid)
                .ok_or_else(|| EngineError::stale(name, format!("synapse {sid} was removed")))?
                .strength();
            self.set_strength(sid, strength * keep);
        }
        Ok(())
    }

    /// Member ids of a neuron group, after verifying none is stale.
    pub(crate) fn group_members_checked(&self, name: &str) -> Result<Vec<NeuronId>, EngineError> {
        let group = self
            .neuron_group(name)
            .ok_or_else(|| EngineError::topology(format!("no such neuron group '{name}'")))?;
        for &id in group.members() {
            if !self.contains_neuron(id) {
                return Err(EngineError::stale(name, format!("neuron {id} was removed")));
            }
        }
        Ok(group.members().to_vec())
    }

    pub(crate) fn synapse_group_members_checked(
        &self,
        name: &str,
    ) -> Result<Vec<SynapseId>, EngineError> {
        let group = self
            .synapse_group(name)
            .ok_or_else(|| EngineError::topology(format!("no such synapse group '{name}'")))?;
        for &id in group.members() {
            if !self.contains_synapse(id) {
                return Err(EngineError::stale(name, format!("synapse {id} was removed")));
            }
        }
        Ok(group.members().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounded::Bounds;
    use crate::network::Neuron;

    fn net_with_groups(inputs: usize, outputs: usize) -> Network {
        let mut net = Network::with_seed(21);
        let ins: Vec<NeuronId> = (0..inputs)
            .map(|_| net.add_neuron(Neuron::clamped_input()))
            .collect();
        let outs: Vec<NeuronId> = (0..outputs)
            .map(|_| net.add_neuron(Neuron::binary()))
            .collect();
        net.define_group("inputs", &ins).unwrap();
        net.define_group("outputs", &outs).unwrap();
        net
    }

    #[test]
    fn define_group_rejects_unknown_members_and_duplicates() {
        let mut net = Network::new();
        let a = net.add_neuron(Neuron::binary());
        net.define_group("a", &[a]).unwrap();

        let err = net.define_group("a", &[a]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));

        let err = net.define_group("b", &[999]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTopology(_)));
        assert!(net.neuron_group("b").is_none());
    }

    #[test]
    fn connect_groups_wires_full_bipartite() {
        let mut net = net_with_groups(2, 3);
        net.connect_groups("ff", "inputs", "outputs", SynapseTemplate::default())
            .unwrap();
        let group = net.synapse_group("ff").unwrap();
        assert_eq!(group.len(), 6);
        assert!(!group.is_recurrent());
        assert_eq!(group.source_group(), "inputs");
        assert_eq!(group.target_group(), "outputs");
    }

    #[test]
    fn recurrent_connection_skips_self_loops() {
        let mut net = net_with_groups(0, 4);
        net.connect_groups("rec", "outputs", "outputs", SynapseTemplate::default())
            .unwrap();
        let group = net.synapse_group("rec").unwrap();
        assert!(group.is_recurrent());
        assert_eq!(group.len(), 4 * 3);
        for &sid in group.members() {
            let s = net.synapse(sid).unwrap();
            assert_ne!(s.source(), s.target());
        }
    }

    #[test]
    fn connect_groups_is_all_or_nothing_on_occupied_pair() {
        let mut net = net_with_groups(2, 2);
        let a = net.neuron_group("inputs").unwrap().members()[0];
        let b = net.neuron_group("outputs").unwrap().members()[0];
        net.add_synapse(crate::network::Synapse::new(a, b, 0.5, Bounds::default()))
            .unwrap();

        let err = net
            .connect_groups("ff", "inputs", "outputs", SynapseTemplate::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTopology(_)));
        // Only the pre-existing synapse remains.
        assert_eq!(net.synapse_count(), 1);
        assert!(net.synapse_group("ff").is_none());
    }

    #[test]
    fn group_vector_io_checks_dimension() {
        let mut net = net_with_groups(3, 1);
        net.set_group_activations("inputs", &[1.0, 0.0, 1.0]).unwrap();
        assert_eq!(net.group_activations("inputs").unwrap(), vec![1.0, 0.0, 1.0]);

        let err = net.set_group_activations("inputs", &[1.0]).unwrap_err();
        assert_eq!(err, EngineError::DimensionMismatch { expected: 3, got: 1 });
    }

    #[test]
    fn stale_group_fails_fast_after_removal() {
        let mut net = net_with_groups(2, 1);
        let gone = net.neuron_group("inputs").unwrap().members()[0];
        net.remove_neuron(gone);

        let err = net.group_activations("inputs").unwrap_err();
        assert!(matches!(err, EngineError::StaleReference { .. }));
        let err = net.set_group_activations("inputs", &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, EngineError::StaleReference { .. }));
    }

    #[test]
    fn stale_synapse_group_fails_fast() {
        let mut net = net_with_groups(2, 2);
        net.connect_groups("ff", "inputs", "outputs", SynapseTemplate::default())
            .unwrap();
        let victim = net.synapse_group("ff").unwrap().members()[0];
        net.remove_synapse(victim);

        let err = net.randomize_group_weights("ff").unwrap_err();
        assert!(matches!(err, EngineError::StaleReference { .. }));
    }

    #[test]
    fn randomize_group_weights_stays_in_bounds() {
        let mut net = net_with_groups(3, 3);
        let template = SynapseTemplate::new(0.0, Bounds::new(-0.5, 0.5));
        net.connect_groups("ff", "inputs", "outputs", template)
            .unwrap();
        net.randomize_group_weights("ff").unwrap();
        for &sid in net.synapse_group("ff").unwrap().members().to_vec().iter() {
            let s = net.synapse(sid).unwrap();
            assert!(s.bounds().contains(s.strength()));
        }
    }

    #[test]
    fn decay_group_weights_shrinks_strengths() {
        let mut net = net_with_groups(2, 2);
        let template = SynapseTemplate::new(0.8, Bounds::new(-1.0, 1.0));
        net.connect_groups("ff", "inputs", "outputs", template)
            .unwrap();
        net.decay_group_weights("ff", 0.5).unwrap();
        for &sid in net.synapse_group("ff").unwrap().members().to_vec().iter() {
            assert_eq!(net.synapse(sid).unwrap().strength(), 0.4);
        }

        let err = net.decay_group_weights("ff", 1.5).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
