//! Arena-backed service graph.

use alloc::format;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::error::{PartitionError, PartitionResult};

/// Index of a node inside a [`ServiceGraph`].
pub type NodeId = usize;

/// The synthetic platform node feeding the service root.
pub const PLATFORM: NodeId = 0;

#[derive(Debug, Clone)]
struct NodeInfo {
    /// Per-invocation execution time in ms.
    runtime: u64,
    /// Resident memory footprint in MB.
    memory: u64,
    /// Average invocation rate on the incoming edge.
    rate: u64,
    /// Transferred data units on the incoming edge.
    data: u64,
    pred: Option<NodeId>,
    succ: SmallVec<[NodeId; 4]>,
}

/// A rooted service tree with per-function runtime/memory attributes and
/// per-edge invocation rates.
///
/// Node `0` is the platform; functions occupy ids `1..=n` in the order they
/// were added. Ids are the canonical traversal order: every invocation edge
/// goes from a lower to a higher id, so increasing id order along any chain
/// is a topological order.
#[derive(Debug, Clone)]
pub struct ServiceGraph {
    nodes: Vec<NodeInfo>,
}

impl ServiceGraph {
    /// Creates a graph containing only the platform node.
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![NodeInfo {
                runtime: 0,
                memory: 0,
                rate: 0,
                data: 0,
                pred: None,
                succ: SmallVec::new(),
            }],
        }
    }

    /// Adds a function node and returns its id.
    pub fn add_function(&mut self, runtime: u64, memory: u64) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeInfo {
            runtime,
            memory,
            rate: 0,
            data: 1,
            pred: None,
            succ: SmallVec::new(),
        });
        id
    }

    /// Adds the invocation edge `from -> to` with the given rate.
    pub fn add_invocation(&mut self, from: NodeId, to: NodeId, rate: u64) -> PartitionResult<()> {
        self.add_invocation_with_data(from, to, rate, 1)
    }

    /// Adds the invocation edge `from -> to` carrying `rate` invocations and
    /// `data` transferred units.
    pub fn add_invocation_with_data(
        &mut self,
        from: NodeId,
        to: NodeId,
        rate: u64,
        data: u64,
    ) -> PartitionResult<()> {
        if from >= self.nodes.len() {
            return Err(PartitionError::UnknownNode { node: from });
        }
        if to >= self.nodes.len() {
            return Err(PartitionError::UnknownNode { node: to });
        }
        if to == PLATFORM || to <= from {
            return Err(PartitionError::edge(
                from,
                to,
                "edges must go from a lower id to a higher id",
            ));
        }
        if rate == 0 {
            return Err(PartitionError::ZeroAttribute {
                node: to,
                attribute: "rate",
            });
        }
        if self.nodes[to].pred.is_some() {
            return Err(PartitionError::edge(from, to, "node already has a predecessor"));
        }
        self.nodes[to].pred = Some(from);
        self.nodes[to].rate = rate;
        self.nodes[to].data = data.max(1);
        self.nodes[from].succ.push(to);
        Ok(())
    }

    /// Builds the degenerate chain graph `platform -> 1 -> 2 -> ..` from the
    /// three attribute vectors, with `rate[i]` on the edge entering node
    /// `i + 1`.
    pub fn chain(runtime: &[u64], memory: &[u64], rate: &[u64]) -> PartitionResult<Self> {
        if runtime.is_empty() {
            return Err(PartitionError::EmptyChain);
        }
        if runtime.len() != memory.len() || runtime.len() != rate.len() {
            return Err(PartitionError::LengthMismatch {
                runtime: runtime.len(),
                memory: memory.len(),
                rate: rate.len(),
            });
        }
        let mut sg = Self::new();
        for ((&rt, &mem), &r) in runtime.iter().zip(memory).zip(rate) {
            let v = sg.add_function(rt, mem);
            sg.add_invocation(v - 1, v, r)?;
        }
        sg.validate()?;
        Ok(sg)
    }

    /// Checks the structural invariants: exactly one platform out-edge,
    /// every function connected and positively attributed.
    pub fn validate(&self) -> PartitionResult<()> {
        if self.len() == 0 {
            return Err(PartitionError::graph("graph contains no functions"));
        }
        if self.nodes[PLATFORM].succ.len() != 1 {
            return Err(PartitionError::graph(format!(
                "platform must invoke exactly one root, found {}",
                self.nodes[PLATFORM].succ.len()
            )));
        }
        for v in self.functions() {
            let node = &self.nodes[v];
            if node.pred.is_none() {
                return Err(PartitionError::graph(format!("node {v} is unreachable")));
            }
            if node.runtime == 0 {
                return Err(PartitionError::ZeroAttribute {
                    node: v,
                    attribute: "runtime",
                });
            }
            if node.memory == 0 {
                return Err(PartitionError::ZeroAttribute {
                    node: v,
                    attribute: "memory",
                });
            }
            if node.rate == 0 {
                return Err(PartitionError::ZeroAttribute {
                    node: v,
                    attribute: "rate",
                });
            }
        }
        Ok(())
    }

    /// Number of function nodes (the platform is not counted).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The root function invoked by the platform.
    pub fn root(&self) -> Option<NodeId> {
        self.nodes[PLATFORM].succ.first().copied()
    }

    /// Iterator over all function ids in increasing order.
    pub fn functions(&self) -> impl Iterator<Item = NodeId> + '_ {
        1..self.nodes.len()
    }

    pub fn contains(&self, v: NodeId) -> bool {
        v < self.nodes.len()
    }

    pub fn runtime(&self, v: NodeId) -> u64 {
        self.nodes[v].runtime
    }

    pub fn memory(&self, v: NodeId) -> u64 {
        self.nodes[v].memory
    }

    /// Invocation rate on the edge entering `v`.
    pub fn rate(&self, v: NodeId) -> u64 {
        self.nodes[v].rate
    }

    /// Transferred data units on the edge entering `v` (defaults to 1).
    pub fn data(&self, v: NodeId) -> u64 {
        self.nodes[v].data
    }

    pub fn pred(&self, v: NodeId) -> Option<NodeId> {
        self.nodes[v].pred
    }

    pub fn succ(&self, v: NodeId) -> &[NodeId] {
        &self.nodes[v].succ
    }

    pub fn out_degree(&self, v: NodeId) -> usize {
        self.nodes[v].succ.len()
    }

    pub fn is_leaf(&self, v: NodeId) -> bool {
        self.nodes[v].succ.is_empty()
    }

    /// True if `v` has more than one successor.
    pub fn is_branching(&self, v: NodeId) -> bool {
        self.nodes[v].succ.len() > 1
    }
}

impl Default for ServiceGraph {
    fn default() -> Self {
        Self::new()
    }
}
