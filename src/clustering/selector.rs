//! Acceptance predicates over jet sequences.
//!
//! A selector is evaluated on a whole sequence at once because some criteria
//! (`NHardest`) depend on the other jets. Selection never reorders.

use serde::{Deserialize, Serialize};

use crate::types::Jet;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// |y| < max
    AbsRapMax(f64),
    /// pt ≥ min
    PtMin(f64),
    /// The n jets with highest pt in the sequence.
    NHardest(usize),
    Not(Box<Selector>),
    And(Box<Selector>, Box<Selector>),
}

impl Selector {
    pub fn abs_rap_max(max: f64) -> Self {
        Selector::AbsRapMax(max)
    }

    pub fn pt_min(min: f64) -> Self {
        Selector::PtMin(min)
    }

    pub fn n_hardest(n: usize) -> Self {
        Selector::NHardest(n)
    }

    pub fn not(self) -> Self {
        Selector::Not(Box::new(self))
    }

    pub fn and(self, other: Selector) -> Self {
        Selector::And(Box::new(self), Box::new(other))
    }

    /// Per-jet pass flags, evaluated against the full sequence.
    pub fn mask(&self, jets: &[Jet]) -> Vec<bool> {
        match self {
            Selector::AbsRapMax(max) => jets.iter().map(|j| j.rapidity().abs() < *max).collect(),
            Selector::PtMin(min) => {
                let min2 = min * min;
                jets.iter().map(|j| j.momentum.pt2() >= min2).collect()
            }
            Selector::NHardest(n) => {
                let mut order: Vec<usize> = (0..jets.len()).collect();
                order.sort_by(|&a, &b| jets[b].momentum.pt2().total_cmp(&jets[a].momentum.pt2()));
                let mut mask = vec![false; jets.len()];
                for &i in order.iter().take(*n) {
                    mask[i] = true;
                }
                mask
            }
            Selector::Not(inner) => inner.mask(jets).into_iter().map(|m| !m).collect(),
            Selector::And(a, b) => a
                .mask(jets)
                .into_iter()
                .zip(b.mask(jets))
                .map(|(x, y)| x && y)
                .collect(),
        }
    }

    pub fn apply(&self, jets: &[Jet]) -> Vec<Jet> {
        jets.iter()
            .zip(self.mask(jets))
            .filter(|(_, keep)| *keep)
            .map(|(j, _)| j.clone())
            .collect()
    }

    pub fn passes(&self, jet: &Jet) -> bool {
        self.mask(std::slice::from_ref(jet))[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Origin, Particle};

    fn jet(pt: f64, y: f64) -> Jet {
        Jet::from_constituents(vec![Particle::massless(pt, y, 1.0, Origin::Signal)], 0.0)
    }

    #[test]
    fn test_abs_rap_max_keeps_order() {
        let jets = vec![jet(10.0, 0.5), jet(20.0, 3.5), jet(30.0, -2.9)];
        let kept = Selector::abs_rap_max(3.0).apply(&jets);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].pt() - 10.0).abs() < 1e-9);
        assert!((kept[1].pt() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_hardest_then_rapidity() {
        let jets = vec![jet(10.0, 0.5), jet(50.0, 0.0), jet(40.0, 0.1), jet(5.0, 4.0), jet(1.0, 0.0)];
        let sel = Selector::abs_rap_max(3.0).and(Selector::n_hardest(2).not());
        let kept = sel.apply(&jets);
        let pts: Vec<f64> = kept.iter().map(|j| j.pt().round()).collect();
        assert_eq!(pts, vec![10.0, 1.0]);
    }

    #[test]
    fn test_n_hardest_larger_than_sequence() {
        let jets = vec![jet(10.0, 0.5)];
        assert_eq!(Selector::n_hardest(3).apply(&jets).len(), 1);
        assert!(Selector::pt_min(5.0).passes(&jets[0]));
    }
}
