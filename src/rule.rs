//! Connection rules, evaluated once per source/target pair during build.
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::NetError;
use crate::nodes::Node;

/// A source/target pair presented to a connection rule.
#[derive(Debug)]
pub struct Pair<'a> {
    /// The node producing spikes.
    pub source: &'a Node,
    /// The node receiving spikes.
    pub target: &'a Node,
    /// Whether source and target are the same node of the same population.
    pub self_pair: bool,
}

/// Decides the number of synapses between a source and a target node.
///
/// Implemented for plain functions, so ad-hoc rules can be passed directly:
///
/// ```
/// use pointnet::rule::{ConnectionRule, Pair};
/// use rand::Rng;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// fn every_pair(_: &Pair, rng: &mut ChaCha8Rng) -> usize {
///     rng.gen_range(0..5)
/// }
/// # let node = pointnet::nodes::Node { node_id: 0, node_type_id: 0, position: None, rotation_angle_yaxis: None, rotation_angle_zaxis: None };
/// # let pair = Pair { source: &node, target: &node, self_pair: true };
/// # let mut rng = ChaCha8Rng::seed_from_u64(42);
/// assert!(every_pair.nsyns(&pair, &mut rng) < 5);
/// ```
pub trait ConnectionRule: Send + Sync {
    /// The number of synapses to create for the pair. Zero means no edge.
    fn nsyns(&self, pair: &Pair, rng: &mut ChaCha8Rng) -> usize;
}

impl<F> ConnectionRule for F
where
    F: Fn(&Pair, &mut ChaCha8Rng) -> usize + Send + Sync,
{
    fn nsyns(&self, pair: &Pair, rng: &mut ChaCha8Rng) -> usize {
        self(pair, rng)
    }
}

/// Connects a pair with fixed probability, excluding self-pairs.
///
/// With probability `prob` the pair receives a uniform number of synapses in
/// `[min_syns, max_syns)`, otherwise none.
#[derive(Debug, PartialEq, Clone)]
pub struct Probabilistic {
    prob: f64,
    min_syns: usize,
    max_syns: usize,
}

impl Probabilistic {
    pub fn new(prob: f64, min_syns: usize, max_syns: usize) -> Result<Self, NetError> {
        if !(0.0..=1.0).contains(&prob) {
            return Err(NetError::InvalidParameter(format!(
                "The connection probability must be in [0, 1], got {}",
                prob
            )));
        }
        if min_syns >= max_syns {
            return Err(NetError::InvalidParameter(format!(
                "The minimum number of synapses must be less than the maximum ({} >= {})",
                min_syns, max_syns
            )));
        }
        Ok(Probabilistic {
            prob,
            min_syns,
            max_syns,
        })
    }
}

impl ConnectionRule for Probabilistic {
    fn nsyns(&self, pair: &Pair, rng: &mut ChaCha8Rng) -> usize {
        if pair.self_pair {
            return 0;
        }
        if rng.gen_bool(self.prob) {
            rng.gen_range(self.min_syns..self.max_syns)
        } else {
            0
        }
    }
}

/// Connects every pair with a uniform number of synapses in `[0, max_syns)`.
/// The usual rule for virtual populations driving an internal one.
#[derive(Debug, PartialEq, Clone)]
pub struct UniformRange {
    max_syns: usize,
}

impl UniformRange {
    pub fn new(max_syns: usize) -> Result<Self, NetError> {
        if max_syns == 0 {
            return Err(NetError::InvalidParameter(
                "The maximum number of synapses must be positive".to_string(),
            ));
        }
        Ok(UniformRange { max_syns })
    }
}

impl ConnectionRule for UniformRange {
    fn nsyns(&self, _pair: &Pair, rng: &mut ChaCha8Rng) -> usize {
        rng.gen_range(0..self.max_syns)
    }
}
