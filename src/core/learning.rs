// Learning rules: pluggable policies that mutate synapse strengths.
//
// A closed tagged-variant set dispatched through `LearningRule::apply`.
// Both rules read the network's *current* activations as the training
// pattern; callers stage a pattern (directly or via a group) and then apply.

#[cfg(not(feature = "std"))]
use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::competitive::{CompetitiveParams, UpdateMethod};
use crate::error::EngineError;
use crate::network::{Network, NeuronId};

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LearningRule {
    /// Hebbian outer-product training over every synapse (Hopfield).
    HebbianOuterProduct,
    /// Unsupervised winner-take-all competition between two named groups.
    WinnerTakeAll {
        source: String,
        target: String,
        params: CompetitiveParams,
    },
}

impl LearningRule {
    /// One training step over the network's current activations.
    ///
    /// Returns the winning output index for the competitive variant.
    pub fn apply(&self, net: &mut Network) -> Result<Option<usize>, EngineError> {
        match self {
            LearningRule::HebbianOuterProduct => {
                hebbian_outer_product(net)?;
                Ok(None)
            }
            LearningRule::WinnerTakeAll {
                source,
                target,
                params,
            } => winner_take_all(net, source, target, params).map(Some),
        }
    }
}

/// One-shot Hebbian outer-product update from the current activation
/// pattern: for every synapse `src -> tgt`,
/// `w += norm(src.activation) * norm(tgt.activation)` where `norm` maps
/// the shared activation range onto `[-1, 1]`.
///
/// Cumulative: repeated calls over successive patterns superimpose traces.
/// Precondition (validated before any write): all neurons share neuron 0's
/// bounds.
pub fn hebbian_outer_product(net: &mut Network) -> Result<(), EngineError> {
    let Some(first) = net.neuron_id_at(0) else {
        return Ok(());
    };
    let shared = net
        .neuron(first)
        .ok_or_else(|| EngineError::topology("no such neuron"))?
        .bounds();
    let lo = shared.lower;
    let hi = shared.upper;
    if hi <= lo {
        return Err(EngineError::config(
            "hebbian training needs a non-degenerate activation range",
        ));
    }
    for &id in net.neuron_ids() {
        let bounds = net
            .neuron(id)
            .ok_or_else(|| EngineError::topology("no such neuron"))?
            .bounds();
        if bounds != shared {
            return Err(EngineError::config(
                "hebbian training requires all neurons to share bounds",
            ));
        }
    }

    let norm = |x: f64| (2.0 * x - hi - lo) / (hi - lo);

    let synapse_ids = net.synapse_ids().to_vec();
    for sid in synapse_ids {
        let (src, tgt, strength) = {
            let s = net
                .synapse(sid)
                .ok_or_else(|| EngineError::topology("no such synapse"))?;
            (s.source(), s.target(), s.strength())
        };
        let src_act = net
            .neuron(src)
            .ok_or_else(|| EngineError::topology("no such neuron"))?
            .activation();
        let tgt_act = net
            .neuron(tgt)
            .ok_or_else(|| EngineError::topology("no such neuron"))?
            .activation();
        net.set_strength(sid, strength + norm(src_act) * norm(tgt_act));
    }
    Ok(())
}

/// One competitive training step between `source` (input pattern holder)
/// and `target` (output units). Returns the winner's index within the
/// target group.
///
/// All validation happens before the first weight write; a failed call
/// leaves the network untouched.
pub fn winner_take_all(
    net: &mut Network,
    source: &str,
    target: &str,
    params: &CompetitiveParams,
) -> Result<usize, EngineError> {
    params.validate()?;
    let inputs = net.group_members_checked(source)?;
    let outputs = net.group_members_checked(target)?;
    if outputs.is_empty() {
        return Err(EngineError::config("output group is empty"));
    }

    let winner = select_winner(net, &inputs, &outputs);

    for (k, &out) in outputs.iter().enumerate() {
        let is_winner = k == winner;
        for &inp in &inputs {
            let input_act = net
                .neuron(inp)
                .map(|n| n.activation())
                .unwrap_or(0.0);
            let Some(syn) = net.weight_mut(inp, out) else {
                continue;
            };
            let w = syn.strength();
            if is_winner {
                // Strengthen association with the winning cluster.
                syn.set_strength(w + params.learning_rate * params.win_value * (input_act - w));
            } else if params.use_leaky_learning {
                // Small nonzero drift toward the input; prevents dead units.
                syn.set_strength(w + params.leaky_learning_rate * (input_act - w));
            } else if params.lose_value != 0.0 {
                // Push weakly toward zero; lose_value = 0 leaves it unchanged.
                syn.set_strength(w - params.learning_rate * params.lose_value * w);
            }
        }

        if !is_winner && params.update_method == UpdateMethod::AlvarezSquire {
            // Stabilizing forgetting term on non-winning weights.
            let keep = 1.0 - params.synapse_decay_percent;
            for &inp in &inputs {
                if let Some(syn) = net.weight_mut(inp, out) {
                    let w = syn.strength();
                    syn.set_strength(w * keep);
                }
            }
        }
    }

    if params.normalize_inputs {
        // Keep competition fair across units: each output's incoming weight
        // vector is rescaled to component sum 1.
        for &out in &outputs {
            let sum: f64 = inputs
                .iter()
                .filter_map(|&inp| net.weight(inp, out))
                .map(|s| s.strength())
                .sum();
            if sum.abs() > f64::EPSILON {
                for &inp in &inputs {
                    if let Some(syn) = net.weight_mut(inp, out) {
                        let w = syn.strength();
                        syn.set_strength(w / sum);
                    }
                }
            }
        }
    }

    // Settle the output layer: winner takes win_value, losers lose_value.
    for (k, &out) in outputs.iter().enumerate() {
        let value = if k == winner {
            params.win_value
        } else {
            params.lose_value
        };
        net.set_activation(out, value);
    }

    Ok(winner)
}

/// Index (within `outputs`) of the unit with maximal net input from the
/// `inputs` members. Ties break toward the first maximum in iteration
/// order, stable and deterministic.
pub(crate) fn select_winner(net: &Network, inputs: &[NeuronId], outputs: &[NeuronId]) -> usize {
    let mut winner = 0;
    let mut best = f64::NEG_INFINITY;
    for (k, &out) in outputs.iter().enumerate() {
        let mut net_in = 0.0;
        for &inp in inputs {
            if let Some(syn) = net.weight(inp, out) {
                let act = net.neuron(inp).map(|n| n.activation()).unwrap_or(0.0);
                net_in += syn.strength() * act;
            }
        }
        if net_in > best {
            best = net_in;
            winner = k;
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounded::Bounds;
    use crate::network::{Neuron, Synapse};

    /// Fully connected (no self-loops) net of binary neurons with zeroed
    /// symmetric-topology weights on wide synapse bounds.
    fn full_net(n: usize, weight_bounds: Bounds) -> Network {
        let mut net = Network::with_seed(2);
        let ids: Vec<NeuronId> = (0..n).map(|_| net.add_neuron(Neuron::binary())).collect();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    net.add_synapse(Synapse::new(ids[i], ids[j], 0.0, weight_bounds))
                        .unwrap();
                }
            }
        }
        net
    }

    #[test]
    fn outer_product_signs_follow_pattern() {
        let mut net = full_net(4, Bounds::new(-4.0, 4.0));
        net.set_activations(&[1.0, 1.0, -1.0, -1.0]).unwrap();
        hebbian_outer_product(&mut net).unwrap();

        let id = |i| net.neuron_id_at(i).unwrap();
        // Same-sign pair increases, opposite-sign pair decreases, by the
        // exact outer-product formula (norm is identity on [-1, 1]).
        assert_eq!(net.weight(id(0), id(1)).unwrap().strength(), 1.0);
        assert_eq!(net.weight(id(0), id(2)).unwrap().strength(), -1.0);
        assert_eq!(net.weight(id(2), id(3)).unwrap().strength(), 1.0);
    }

    #[test]
    fn training_twice_doubles_the_increment() {
        let mut net = full_net(3, Bounds::new(-4.0, 4.0));
        net.set_activations(&[0.5, 0.5, -0.5]).unwrap();
        hebbian_outer_product(&mut net).unwrap();
        let id = |i: usize, net: &Network| net.neuron_id_at(i).unwrap();
        let once = net.weight(id(0, &net), id(1, &net)).unwrap().strength();
        assert_eq!(once, 0.25);

        hebbian_outer_product(&mut net).unwrap();
        let twice = net.weight(id(0, &net), id(1, &net)).unwrap().strength();
        assert_eq!(twice, 2.0 * once);
    }

    #[test]
    fn norm_maps_asymmetric_ranges() {
        // Bounds [0, 1]: norm(x) = 2x - 1, so a (1, 0) pair contributes -1.
        let mut net = Network::with_seed(2);
        let a = net.add_neuron(Neuron::new(
            Bounds::new(0.0, 1.0),
            crate::network::UpdateRule::Clamped,
        ));
        let b = net.add_neuron(Neuron::new(
            Bounds::new(0.0, 1.0),
            crate::network::UpdateRule::Clamped,
        ));
        net.add_synapse(Synapse::new(a, b, 0.0, Bounds::new(-2.0, 2.0)))
            .unwrap();
        net.set_activation(a, 1.0);
        net.set_activation(b, 0.0);
        hebbian_outer_product(&mut net).unwrap();
        assert_eq!(net.weight(a, b).unwrap().strength(), -1.0);
    }

    #[test]
    fn mixed_bounds_are_rejected_before_any_write() {
        let mut net = full_net(3, Bounds::new(-4.0, 4.0));
        let odd = net.neuron_id_at(2).unwrap();
        net.set_neuron_bounds(odd, Bounds::new(-2.0, 2.0)).unwrap();
        net.set_activations(&[1.0, 1.0, 1.0]).unwrap();

        let err = hebbian_outer_product(&mut net).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
        // No synapse was touched.
        for &sid in net.synapse_ids() {
            assert_eq!(net.synapse(sid).unwrap().strength(), 0.0);
        }
    }

    #[test]
    fn empty_network_training_is_noop() {
        let mut net = Network::new();
        hebbian_outer_product(&mut net).unwrap();
    }

    #[test]
    fn hebbian_rule_dispatch_reports_no_winner() {
        let mut net = full_net(3, Bounds::new(-4.0, 4.0));
        net.set_activations(&[1.0, -1.0, 1.0]).unwrap();
        let winner = LearningRule::HebbianOuterProduct.apply(&mut net).unwrap();
        assert_eq!(winner, None);

        let id = |i: usize, net: &Network| net.neuron_id_at(i).unwrap();
        assert_eq!(net.weight(id(0, &net), id(1, &net)).unwrap().strength(), -1.0);
        assert_eq!(net.weight(id(0, &net), id(2, &net)).unwrap().strength(), 1.0);
    }

    #[test]
    fn winner_take_all_rule_resolves_its_groups_by_name() {
        let mut net = Network::with_seed(3);
        let sensors: Vec<NeuronId> = (0..2)
            .map(|_| net.add_neuron(Neuron::clamped_input()))
            .collect();
        let clusters: Vec<NeuronId> = (0..2)
            .map(|_| net.add_neuron(Neuron::clamped_input()))
            .collect();
        net.define_group("sensors", &sensors).unwrap();
        net.define_group("clusters", &clusters).unwrap();
        let w = [[0.6, 0.3], [0.4, 0.2]];
        for (i, &inp) in sensors.iter().enumerate() {
            for (o, &out) in clusters.iter().enumerate() {
                net.add_synapse(Synapse::new(inp, out, w[i][o], Bounds::new(0.0, 1.0)))
                    .unwrap();
            }
        }
        net.set_activation(sensors[0], 1.0);
        net.set_activation(sensors[1], 0.0);

        let rule = LearningRule::WinnerTakeAll {
            source: String::from("sensors"),
            target: String::from("clusters"),
            params: CompetitiveParams::default().with_learning_rate(0.5),
        };
        let winner = rule.apply(&mut net).unwrap();
        assert_eq!(winner, Some(0));
        assert_eq!(net.weight(sensors[0], clusters[0]).unwrap().strength(), 0.8);
        assert_eq!(net.weight(sensors[0], clusters[1]).unwrap().strength(), 0.3);

        let unknown = LearningRule::WinnerTakeAll {
            source: String::from("sensors"),
            target: String::from("phantoms"),
            params: CompetitiveParams::default(),
        };
        assert!(matches!(
            unknown.apply(&mut net),
            Err(EngineError::InvalidTopology(_))
        ));
    }

    #[test]
    fn winner_selection_is_first_maximum() {
        let mut net = Network::with_seed(9);
        let i0 = net.add_neuron(Neuron::clamped_input());
        let outs: Vec<NeuronId> = (0..3).map(|_| net.add_neuron(Neuron::clamped_input())).collect();
        for &o in &outs {
            net.add_synapse(Synapse::new(i0, o, 0.5, Bounds::new(0.0, 1.0)))
                .unwrap();
        }
        net.set_activation(i0, 1.0);
        // All net inputs equal: the first output wins.
        assert_eq!(select_winner(&net, &[i0], &outs), 0);

        // A clear margin wins regardless of position.
        net.weight_mut(i0, outs[2]).unwrap().set_strength(0.9);
        assert_eq!(select_winner(&net, &[i0], &outs), 2);
    }
}
