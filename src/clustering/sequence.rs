//! Sequential-recombination clustering with optional explicit ghosts.
//!
//! Every active pseudojet caches its geometric nearest neighbour in (y, φ)
//! among partners closer than R. For the generalised-kt family the globally
//! smallest d_ij always pairs a pseudojet with that neighbour, so each
//! pseudojet contributes one candidate, min(d_iB, d_i,NN), and the candidates
//! sit in a min-heap. Neighbour searches only visit the 3×3 block of
//! rapidity–azimuth tiles around a pseudojet; tiles are at least R wide.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::f64::consts::PI;

use crate::error::HiJetError;
use crate::types::{delta_phi, FourMomentum, Jet, Particle};

use super::ghosts::GhostedAreaSpec;
use super::history::MergeTree;
use super::{JetAlgorithm, JetDefinition};

/// Momentum factor used for pseudojets with vanishing kt under anti-kt.
const HUGE_MOMENTUM_FACTOR: f64 = 1e300;

/// Tiles are never narrower than this, whatever R.
const MIN_TILE_SIZE: f64 = 0.1;

/// Rapidities beyond this share the outermost tile row.
const TILED_RAP_LIMIT: f64 = 20.0;

//==================================================================================
// I. Active Pseudojets
//==================================================================================

#[derive(Debug, Clone)]
struct ActiveJet {
    node: usize,
    momentum: FourMomentum,
    rap: f64,
    phi: f64,
    /// kt^(2p) for the algorithm's exponent p.
    factor: f64,
    tile: usize,
    /// Nearest partner closer than R, if any.
    nn: Option<usize>,
    nn_dist2: f64,
}

impl ActiveJet {
    fn new(node: usize, momentum: FourMomentum, algorithm: JetAlgorithm, tiling: &Tiling) -> Self {
        let rap = momentum.rapidity();
        let phi = momentum.phi();
        Self {
            node,
            momentum,
            rap,
            phi,
            factor: momentum_factor(&momentum, algorithm),
            tile: tiling.tile_of(rap, phi),
            nn: None,
            nn_dist2: f64::MAX,
        }
    }

    fn dist2(&self, other: &ActiveJet) -> f64 {
        let dy = self.rap - other.rap;
        let dphi = delta_phi(self.phi, other.phi);
        dy * dy + dphi * dphi
    }
}

fn momentum_factor(p: &FourMomentum, algorithm: JetAlgorithm) -> f64 {
    let kt2 = p.pt2();
    match algorithm {
        JetAlgorithm::Kt => kt2,
        JetAlgorithm::CambridgeAachen => 1.0,
        JetAlgorithm::AntiKt => {
            if kt2 > 1e-300 {
                1.0 / kt2
            } else {
                HUGE_MOMENTUM_FACTOR
            }
        }
    }
}

/// Orders neighbours by distance, then by slot, so ties never depend on
/// the order in which tiles are visited.
fn is_closer(d2: f64, slot: usize, best_d2: f64, best: Option<usize>) -> bool {
    match d2.total_cmp(&best_d2) {
        Ordering::Less => true,
        Ordering::Equal => best.map_or(true, |b| slot < b),
        Ordering::Greater => false,
    }
}

//==================================================================================
// II. Rapidity–Azimuth Tiling
//==================================================================================

/// Buckets of active slots. Any two pseudojets closer than R lie in the same
/// tile or in adjacent ones (azimuth wraps around).
#[derive(Debug)]
struct Tiling {
    rap_min: f64,
    tile_size: f64,
    n_rap: usize,
    n_phi: usize,
    phi_width: f64,
    members: Vec<Vec<usize>>,
}

impl Tiling {
    fn new(raps: impl Iterator<Item = f64>, radius: f64) -> Self {
        let tile_size = radius.max(MIN_TILE_SIZE);
        let (mut lo, mut hi) = (f64::MAX, f64::MIN);
        for y in raps {
            let y = y.clamp(-TILED_RAP_LIMIT, TILED_RAP_LIMIT);
            lo = lo.min(y);
            hi = hi.max(y);
        }
        if lo > hi {
            lo = 0.0;
            hi = 0.0;
        }
        let n_rap = ((hi - lo) / tile_size).floor() as usize + 1;
        let n_phi = ((2.0 * PI / tile_size).floor() as usize).max(1);
        Self {
            rap_min: lo,
            tile_size,
            n_rap,
            n_phi,
            phi_width: 2.0 * PI / n_phi as f64,
            members: vec![Vec::new(); n_rap * n_phi],
        }
    }

    fn tile_of(&self, rap: f64, phi: f64) -> usize {
        let irap = ((rap - self.rap_min) / self.tile_size).floor().max(0.0) as usize;
        let iphi = (phi / self.phi_width).floor().max(0.0) as usize;
        irap.min(self.n_rap - 1) * self.n_phi + iphi.min(self.n_phi - 1)
    }

    /// The tile itself and its (up to eight) distinct neighbours.
    fn neighbourhood(&self, tile: usize) -> Vec<usize> {
        let (irap, iphi) = (tile / self.n_phi, tile % self.n_phi);
        let mut out = Vec::with_capacity(9);
        for r in irap.saturating_sub(1)..=(irap + 1).min(self.n_rap - 1) {
            for step in [self.n_phi - 1, 0, 1] {
                out.push(r * self.n_phi + (iphi + step) % self.n_phi);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Active slots in the neighbourhoods of all `tiles`, without repeats.
    fn slots_near(&self, tiles: &[usize]) -> Vec<usize> {
        let mut visited: Vec<usize> = tiles.iter().flat_map(|&t| self.neighbourhood(t)).collect();
        visited.sort_unstable();
        visited.dedup();
        let mut slots: Vec<usize> = visited
            .into_iter()
            .flat_map(|t| self.members[t].iter().copied())
            .collect();
        slots.sort_unstable();
        slots
    }

    fn insert(&mut self, tile: usize, slot: usize) {
        self.members[tile].push(slot);
    }

    fn remove(&mut self, tile: usize, slot: usize) {
        if let Some(pos) = self.members[tile].iter().position(|&s| s == slot) {
            self.members[tile].swap_remove(pos);
        }
    }
}

//==================================================================================
// III. Candidate Heap
//==================================================================================

/// The smallest distance a slot takes part in, as of `generation`.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    slot: usize,
    generation: u64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Smallest distance first; ties go to the lowest slot.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.slot.cmp(&other.slot))
            .then(self.generation.cmp(&other.generation))
    }
}

/// Mutable clustering state; lives only for one `ClusterSequence::run`.
struct Workspace {
    slots: Vec<Option<ActiveJet>>,
    tiling: Tiling,
    generation: Vec<u64>,
    heap: BinaryHeap<Reverse<Candidate>>,
    r2: f64,
}

impl Workspace {
    /// min(d_iB, d_i,NN) for slot `i`, with the partner when it is a pair.
    fn best_distance(&self, i: usize) -> Option<(f64, Option<usize>)> {
        let jet = self.slots[i].as_ref()?;
        let dib = jet.factor * self.r2;
        if let Some(nn) = jet.nn {
            if let Some(other) = self.slots[nn].as_ref() {
                let dij = jet.factor.min(other.factor) * jet.nn_dist2;
                if dij < dib {
                    return Some((dij, Some(nn)));
                }
            }
        }
        Some((dib, None))
    }

    /// Invalidates any queued candidate of `i` and queues the current one.
    fn schedule(&mut self, i: usize) {
        self.generation[i] += 1;
        if let Some((distance, _)) = self.best_distance(i) {
            self.heap.push(Reverse(Candidate {
                distance,
                slot: i,
                generation: self.generation[i],
            }));
        }
    }

    fn refresh_nn(&mut self, i: usize) {
        let Some(jet) = self.slots[i].as_ref() else { return };
        let mut nn = None;
        let mut nn_dist2 = f64::MAX;
        for tile in self.tiling.neighbourhood(jet.tile) {
            for &k in &self.tiling.members[tile] {
                if k == i {
                    continue;
                }
                let Some(other) = self.slots[k].as_ref() else { continue };
                let d2 = jet.dist2(other);
                if d2 < self.r2 && is_closer(d2, k, nn_dist2, nn) {
                    nn = Some(k);
                    nn_dist2 = d2;
                }
            }
        }
        if let Some(jet) = self.slots[i].as_mut() {
            jet.nn = nn;
            jet.nn_dist2 = nn_dist2;
        }
    }

    /// Slot `i` now holds the merge of the old `i` and `j`; `touched` are the
    /// slots near either parent or the merged pseudojet.
    fn update_after_merge(&mut self, i: usize, j: usize, touched: &[usize]) {
        for &k in touched {
            if k == i {
                continue;
            }
            let (Some(merged), Some(other)) = (self.slots[i].as_ref(), self.slots[k].as_ref()) else {
                continue;
            };
            if other.nn == Some(i) || other.nn == Some(j) {
                self.refresh_nn(k);
                self.schedule(k);
                continue;
            }
            let d2 = merged.dist2(other);
            if d2 < self.r2 && is_closer(d2, i, other.nn_dist2, other.nn) {
                if let Some(other) = self.slots[k].as_mut() {
                    other.nn = Some(i);
                    other.nn_dist2 = d2;
                }
                self.schedule(k);
            }
        }
        self.refresh_nn(i);
        self.schedule(i);
    }

    fn update_after_removal(&mut self, i: usize, touched: &[usize]) {
        for &k in touched {
            if self.slots[k].as_ref().map_or(false, |o| o.nn == Some(i)) {
                self.refresh_nn(k);
                self.schedule(k);
            }
        }
    }
}

//==================================================================================
// IV. Cluster Sequence
//==================================================================================

/// One clustering run over a fixed set of inputs.
#[derive(Debug, Clone)]
pub struct ClusterSequence {
    jet_def: JetDefinition,
    /// Real particles first, then any ghosts, in the order they were clustered.
    inputs: Vec<Particle>,
    tree: MergeTree,
    final_nodes: Vec<usize>,
    ghost_area: Option<f64>,
}

impl ClusterSequence {
    /// Clusters `particles`; when `area` is given, explicit ghosts are added
    /// and every jet carries its active area.
    pub fn new(
        particles: &[Particle],
        jet_def: JetDefinition,
        area: Option<&GhostedAreaSpec>,
    ) -> Result<Self, HiJetError> {
        jet_def.validate()?;

        let mut inputs: Vec<Particle> = particles.to_vec();
        let ghost_area = match area {
            Some(spec) => {
                spec.validate()?;
                inputs.extend(spec.generate_ghosts());
                Some(spec.actual_ghost_area())
            }
            None => None,
        };

        let mut sequence = Self {
            jet_def,
            tree: MergeTree::with_inputs(inputs.iter().map(|p| p.momentum)),
            inputs,
            final_nodes: Vec::new(),
            ghost_area,
        };
        sequence.run();

        log::debug!(
            "Clustered {} inputs ({} ghosts) with {:?} R={} into {} inclusive jets",
            sequence.inputs.len(),
            sequence.inputs.iter().filter(|p| p.is_ghost()).count(),
            jet_def.algorithm,
            jet_def.radius,
            sequence.final_nodes.len()
        );
        Ok(sequence)
    }

    fn run(&mut self) {
        let algorithm = self.jet_def.algorithm;
        let tiling = Tiling::new(
            self.inputs.iter().map(|p| p.momentum.rapidity()),
            self.jet_def.radius,
        );
        let slots: Vec<Option<ActiveJet>> = self
            .inputs
            .iter()
            .enumerate()
            .map(|(i, p)| Some(ActiveJet::new(i, p.momentum, algorithm, &tiling)))
            .collect();

        let n = slots.len();
        let mut ws = Workspace {
            slots,
            tiling,
            generation: vec![0; n],
            heap: BinaryHeap::with_capacity(2 * n),
            r2: self.jet_def.radius * self.jet_def.radius,
        };
        for i in 0..n {
            if let Some(tile) = ws.slots[i].as_ref().map(|jet| jet.tile) {
                ws.tiling.insert(tile, i);
            }
        }
        for i in 0..n {
            ws.refresh_nn(i);
            ws.schedule(i);
        }

        while let Some(Reverse(candidate)) = ws.heap.pop() {
            let i = candidate.slot;
            if candidate.generation != ws.generation[i] {
                continue;
            }
            let Some((d, partner)) = ws.best_distance(i) else { continue };

            match partner {
                Some(j) => {
                    let (Some(a), Some(b)) = (ws.slots[i].take(), ws.slots[j].take()) else {
                        continue;
                    };
                    ws.tiling.remove(a.tile, i);
                    ws.tiling.remove(b.tile, j);
                    ws.generation[j] += 1;

                    let momentum = a.momentum + b.momentum;
                    let node = self.tree.merge(a.node, b.node, momentum, d);
                    let merged = ActiveJet::new(node, momentum, algorithm, &ws.tiling);
                    let touched = ws.tiling.slots_near(&[a.tile, b.tile, merged.tile]);
                    ws.tiling.insert(merged.tile, i);
                    ws.slots[i] = Some(merged);
                    ws.update_after_merge(i, j, &touched);
                }
                None => {
                    let Some(jet) = ws.slots[i].take() else { continue };
                    ws.tiling.remove(jet.tile, i);
                    ws.generation[i] += 1;
                    self.tree.finish(jet.node, d);
                    self.final_nodes.push(jet.node);
                    let touched = ws.tiling.slots_near(&[jet.tile]);
                    ws.update_after_removal(i, &touched);
                }
            }
        }
    }

    pub fn jet_def(&self) -> &JetDefinition {
        &self.jet_def
    }

    pub fn tree(&self) -> &MergeTree {
        &self.tree
    }

    pub fn inputs(&self) -> &[Particle] {
        &self.inputs
    }

    /// Per-ghost area when the run was area-aware.
    pub fn ghost_area(&self) -> Option<f64> {
        self.ghost_area
    }

    /// History nodes that left the clustering as inclusive jets, in order.
    pub fn final_nodes(&self) -> &[usize] {
        &self.final_nodes
    }

    /// Builds the jet rooted at history node `node`.
    pub fn jet_at(&self, node: usize) -> Jet {
        let constituents: Vec<Particle> = self
            .tree
            .leaves(node)
            .into_iter()
            .map(|leaf| self.inputs[leaf])
            .collect();
        let area = match self.ghost_area {
            Some(ghost_area) => {
                constituents.iter().filter(|p| p.is_ghost()).count() as f64 * ghost_area
            }
            None => 0.0,
        };
        Jet::new(self.tree.node(node).momentum, constituents, area)
    }

    /// Inclusive jets with pt ≥ `ptmin`, in clustering order.
    pub fn inclusive_jets(&self, ptmin: f64) -> Vec<Jet> {
        let ptmin2 = ptmin * ptmin;
        self.final_nodes
            .iter()
            .filter(|&&node| self.tree.node(node).momentum.pt2() >= ptmin2)
            .map(|&node| self.jet_at(node))
            .collect()
    }
}
