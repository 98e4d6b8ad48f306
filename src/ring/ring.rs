use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::hash::{HashStrategy, RequestKey};
use super::probe::ProbePolicy;
use super::types::{LookupMiss, RingConfig, RingError};

/// Immutable snapshot of node placements.
///
/// `slots[s]` holds the ordinal of the node owning slot `s`, and
/// `placements[i][j]` is the slot taken by replica `j` of node `i`. A ring is
/// never patched: membership changes build a new one and swap it in.
#[derive(Debug, Clone)]
pub struct Ring {
    slots: Vec<Option<usize>>,
    nodes: Vec<String>,
    placements: Vec<Vec<usize>>,
    vnodes: usize,
    hash: Arc<dyn HashStrategy>,
    probe: ProbePolicy,
}

impl Ring {
    pub fn build(config: &RingConfig, nodes: &[String]) -> Result<Self, RingError> {
        config.validate()?;
        Self::build_with(
            config.hash.strategy(),
            config.probe,
            config.slots,
            config.vnodes,
            nodes,
        )
    }

    /// Places `vnodes` replicas of every node, in list order.
    ///
    /// Fails as a whole with `CapacityExhausted` as soon as one replica cannot be
    /// placed within the probe bound.
    pub fn build_with(
        hash: Arc<dyn HashStrategy>,
        probe: ProbePolicy,
        capacity: usize,
        vnodes: usize,
        nodes: &[String],
    ) -> Result<Self, RingError> {
        if capacity == 0 || vnodes == 0 {
            return Err(RingError::InvalidConfig(format!(
                "capacity ({}) and virtual nodes ({}) must be positive",
                capacity, vnodes
            )));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = nodes.iter().find(|node| !seen.insert(node.as_str())) {
            return Err(RingError::InvalidConfig(format!(
                "node {} appears more than once",
                duplicate
            )));
        }

        let mut slots: Vec<Option<usize>> = vec![None; capacity];
        let mut placements = Vec::with_capacity(nodes.len());

        for (ordinal, node) in nodes.iter().enumerate() {
            let mut replicas = Vec::with_capacity(vnodes);

            for replica in 0..vnodes {
                let origin = hash.placement(ordinal, replica, capacity);
                let slot = probe
                    .sequence(origin, capacity)
                    .find(|&candidate| slots[candidate].is_none())
                    .ok_or_else(|| RingError::CapacityExhausted {
                        node: node.clone(),
                        replica,
                        slots: capacity,
                    })?;

                slots[slot] = Some(ordinal);
                replicas.push(slot);
            }

            placements.push(replicas);
        }

        tracing::debug!(
            "Built {} ring: {} nodes, {}/{} slots occupied",
            hash.name(),
            nodes.len(),
            nodes.len() * vnodes,
            capacity
        );

        Ok(Self {
            slots,
            nodes: nodes.to_vec(),
            placements,
            vnodes,
            hash,
            probe,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn vnodes(&self) -> usize {
        self.vnodes
    }

    pub fn probe(&self) -> ProbePolicy {
        self.probe
    }

    pub fn hash_name(&self) -> &'static str {
        self.hash.name()
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn request_slot(&self, key: &RequestKey) -> usize {
        self.hash.request(key, self.capacity())
    }

    pub fn lookup(&self, key: &RequestKey) -> Result<&str, LookupMiss> {
        self.lookup_slot(self.request_slot(key))
    }

    /// First occupied slot along the probe sequence starting at `origin`.
    pub fn lookup_slot(&self, origin: usize) -> Result<&str, LookupMiss> {
        if self.nodes.is_empty() {
            return Err(LookupMiss::EmptyRing);
        }

        self.probe
            .sequence(origin % self.capacity(), self.capacity())
            .find_map(|slot| self.slots[slot])
            .map(|ordinal| self.nodes[ordinal].as_str())
            .ok_or(LookupMiss::Exhausted)
    }

    pub fn owner(&self, slot: usize) -> Option<&str> {
        self.slots
            .get(slot)
            .copied()
            .flatten()
            .map(|ordinal| self.nodes[ordinal].as_str())
    }

    /// Slots of every virtual node of `node`, indexed by replica.
    pub fn slots_of(&self, node: &str) -> Option<&[usize]> {
        self.nodes
            .iter()
            .position(|candidate| candidate == node)
            .map(|ordinal| self.placements[ordinal].as_slice())
    }

    pub fn slot_map(&self) -> BTreeMap<usize, &str> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, owner)| owner.map(|ordinal| (slot, self.nodes[ordinal].as_str())))
            .collect()
    }
}
