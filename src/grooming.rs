//! Soft-drop grooming.
//!
//! A jet's real constituents are reclustered with Cambridge/Aachen at a radius
//! large enough to merge them all into one tree. The tree is then declustered
//! from the last merge backward. At each step the two branches p1 (harder) and
//! p2 give z = min(pT1, pT2) / (pT1 + pT2) and their separation Δ; the step is
//! accepted when z > z_cut · (Δ / R)^β. A rejected step drops the softer branch
//! and follows the harder one.

use crate::clustering::{ClusterSequence, JetDefinition};
use crate::collection::JetCollection;
use crate::config::GroomingConfig;
use crate::error::HiJetError;
use crate::types::{Jet, Particle};

/// Radius for the declustering pass; large enough that everything merges.
const RECLUSTER_RADIUS: f64 = 999.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GroomedJet {
    pub jet: Jet,
    /// Momentum-sharing fraction of the accepted split; 0 if none.
    pub zg: f64,
    /// Softer branches dropped before the accepted split.
    pub n_dropped: i64,
    /// Separation of the two branches of the accepted split; 0 if none.
    pub dr12: f64,
}

impl GroomedJet {
    fn ungroomed(jet: &Jet) -> Self {
        Self {
            jet: jet.clone(),
            zg: 0.0,
            n_dropped: 0,
            dr12: 0.0,
        }
    }
}

/// Groomed jets plus per-jet diagnostics, index-aligned with the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroomingResult {
    pub jets: JetCollection,
    pub zg: Vec<f64>,
    pub n_dropped: Vec<i64>,
    pub dr12: Vec<f64>,
}

impl GroomingResult {
    /// Attaches `zg<suffix>`, `ndrop<suffix>` and `dr12<suffix>` to `collection`.
    pub fn attach_diagnostics(&self, collection: &mut JetCollection, suffix: &str) -> Result<(), HiJetError> {
        collection.add_attribute(format!("zg{suffix}"), self.zg.clone())?;
        collection.add_attribute(format!("ndrop{suffix}"), self.n_dropped.clone())?;
        collection.add_attribute(format!("dr12{suffix}"), self.dr12.clone())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftDropGroomer {
    pub z_cut: f64,
    pub beta: f64,
    /// Jet radius normalising the angular term.
    pub radius: f64,
}

impl SoftDropGroomer {
    pub fn new(z_cut: f64, beta: f64, radius: f64) -> Result<Self, HiJetError> {
        JetDefinition::cambridge(radius).validate()?;
        if !(z_cut.is_finite() && (0.0..1.0).contains(&z_cut)) {
            return Err(HiJetError::InvalidConfig(format!("z_cut must lie in [0, 1), got {z_cut}")));
        }
        if !(beta.is_finite() && beta >= 0.0) {
            return Err(HiJetError::InvalidConfig(format!("beta must be finite and >= 0, got {beta}")));
        }
        Ok(Self { z_cut, beta, radius })
    }

    pub fn from_config(config: &GroomingConfig, radius: f64) -> Result<Self, HiJetError> {
        Self::new(config.z_cut, config.beta, radius)
    }

    fn accepts(&self, z: f64, delta: f64) -> bool {
        z > self.z_cut * (delta / self.radius).powf(self.beta)
    }

    /// Grooms one jet. A jet without an accepted split comes back unchanged
    /// with all diagnostics zero.
    pub fn groom_jet(&self, jet: &Jet) -> Result<GroomedJet, HiJetError> {
        let particles: Vec<Particle> = jet.particles().copied().collect();
        if particles.len() < 2 {
            return Ok(GroomedJet::ungroomed(jet));
        }

        let cs = ClusterSequence::new(&particles, JetDefinition::cambridge(RECLUSTER_RADIUS), None)?;
        let tree = cs.tree();
        let Some(&root) = cs
            .final_nodes()
            .iter()
            .max_by(|&&a, &&b| tree.node(a).momentum.pt2().total_cmp(&tree.node(b).momentum.pt2()))
        else {
            return Ok(GroomedJet::ungroomed(jet));
        };

        let mut node = root;
        let mut n_dropped = 0;
        while let Some((a, b)) = tree.parents(node) {
            let (pa, pb) = (tree.node(a).momentum, tree.node(b).momentum);
            let (harder, pt1, pt2) = if pa.pt2() >= pb.pt2() {
                (a, pa.pt(), pb.pt())
            } else {
                (b, pb.pt(), pa.pt())
            };
            let sum = pt1 + pt2;
            let z = if sum > 0.0 { pt2 / sum } else { 0.0 };
            let delta = pa.delta_r(&pb);

            if self.accepts(z, delta) {
                return Ok(GroomedJet {
                    jet: cs.jet_at(node),
                    zg: z,
                    n_dropped,
                    dr12: delta,
                });
            }
            n_dropped += 1;
            node = harder;
        }

        log::trace!("Soft drop: no split accepted after {} steps", n_dropped);
        Ok(GroomedJet::ungroomed(jet))
    }

    /// Grooms every jet of `collection`, keeping its order.
    pub fn do_grooming(&self, collection: &JetCollection) -> Result<GroomingResult, HiJetError> {
        let mut jets = Vec::with_capacity(collection.len());
        let mut result = GroomingResult::default();
        for jet in collection.jets() {
            let groomed = self.groom_jet(jet)?;
            result.zg.push(groomed.zg);
            result.n_dropped.push(groomed.n_dropped);
            result.dr12.push(groomed.dr12);
            jets.push(groomed.jet);
        }
        result.jets = JetCollection::new(jets);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn groomer(z_cut: f64, beta: f64) -> SoftDropGroomer {
        SoftDropGroomer::new(z_cut, beta, 0.4).unwrap()
    }

    fn jet_of(particles: Vec<Particle>) -> Jet {
        Jet::from_constituents(particles, 0.5)
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(SoftDropGroomer::new(0.1, 0.0, -1.0), Err(HiJetError::InvalidRadius(_))));
        assert!(matches!(SoftDropGroomer::new(1.2, 0.0, 0.4), Err(HiJetError::InvalidConfig(_))));
        assert!(matches!(SoftDropGroomer::new(0.1, -1.0, 0.4), Err(HiJetError::InvalidConfig(_))));
    }

    #[test]
    fn test_single_constituent_falls_back_to_original() {
        let jet = jet_of(vec![Particle::massless(40.0, 0.3, 2.0, Origin::Signal)]);
        let groomed = groomer(0.1, 0.0).groom_jet(&jet).unwrap();
        assert_eq!(groomed.jet, jet);
        assert_eq!(groomed.zg, 0.0);
        assert_eq!(groomed.n_dropped, 0);
        assert_eq!(groomed.dr12, 0.0);
    }

    #[test]
    fn test_ghosts_do_not_count_as_constituents() {
        let jet = jet_of(vec![
            Particle::massless(40.0, 0.3, 2.0, Origin::Signal),
            Particle::massless(1e-100, 0.35, 2.0, Origin::Ghost),
            Particle::massless(1e-100, 0.25, 2.1, Origin::Ghost),
        ]);
        let groomed = groomer(0.1, 0.0).groom_jet(&jet).unwrap();
        assert_eq!(groomed.jet, jet);
        assert_eq!(groomed.n_dropped, 0);
    }

    #[test]
    fn test_symmetric_split_accepted_immediately() {
        let jet = jet_of(vec![
            Particle::massless(30.0, 0.0, 1.0, Origin::Signal),
            Particle::massless(20.0, 0.0, 1.2, Origin::Signal),
        ]);
        let groomed = groomer(0.1, 0.0).groom_jet(&jet).unwrap();
        assert!((groomed.zg - 0.4).abs() < 1e-9);
        assert!((groomed.dr12 - 0.2).abs() < 1e-9);
        assert_eq!(groomed.n_dropped, 0);
        assert_eq!(groomed.jet.constituents.len(), 2);
    }

    #[test]
    fn test_soft_wide_branch_dropped() {
        let jet = jet_of(vec![
            Particle::massless(50.0, 0.0, 1.0, Origin::Signal),
            Particle::massless(40.0, 0.05, 1.0, Origin::Signal),
            Particle::massless(2.0, 0.3, 1.0, Origin::Background),
        ]);
        let groomed = groomer(0.1, 0.0).groom_jet(&jet).unwrap();
        assert_eq!(groomed.n_dropped, 1);
        assert!((groomed.zg - 40.0 / 90.0).abs() < 1e-6);
        assert!((groomed.dr12 - 0.05).abs() < 1e-6);
        assert_eq!(groomed.jet.constituents.len(), 2);
        assert!(groomed.jet.constituents.iter().all(|p| p.origin == Origin::Signal));
        assert!(groomed.n_dropped <= jet.n_particles() as i64 - 1);
    }

    #[test]
    fn test_beta_relaxes_cut_at_small_angle() {
        let jet = jet_of(vec![
            Particle::massless(50.0, 0.0, 1.0, Origin::Signal),
            Particle::massless(40.0, 0.05, 1.0, Origin::Signal),
            Particle::massless(8.0, 0.3, 1.0, Origin::Signal),
        ]);
        // z ≈ 0.082 fails z_cut = 0.1 but passes 0.1 · (0.28 / 0.4)^2.
        let flat = groomer(0.1, 0.0).groom_jet(&jet).unwrap();
        let angular = groomer(0.1, 2.0).groom_jet(&jet).unwrap();
        assert_eq!(flat.n_dropped, 1);
        assert_eq!(angular.n_dropped, 0);
        assert!((angular.zg - 8.0 / 98.0).abs() < 1e-3);
        assert_eq!(angular.jet.constituents.len(), 3);
    }

    #[test]
    fn test_no_split_accepted_falls_back() {
        // Every split is too asymmetric for z_cut close to 1.
        let jet = jet_of(vec![
            Particle::massless(50.0, 0.0, 1.0, Origin::Signal),
            Particle::massless(10.0, 0.1, 1.0, Origin::Signal),
            Particle::massless(5.0, -0.2, 1.1, Origin::Signal),
        ]);
        let groomed = groomer(0.99, 0.0).groom_jet(&jet).unwrap();
        assert_eq!(groomed.jet, jet);
        assert_eq!(groomed.zg, 0.0);
        assert_eq!(groomed.n_dropped, 0);
        assert_eq!(groomed.dr12, 0.0);
    }

    #[test]
    fn test_do_grooming_keeps_order_and_attaches() {
        let mut collection = JetCollection::new(vec![
            jet_of(vec![
                Particle::massless(30.0, 0.0, 1.0, Origin::Signal),
                Particle::massless(20.0, 0.0, 1.2, Origin::Signal),
            ]),
            Jet::sentinel(),
        ]);
        let result = groomer(0.1, 0.0).do_grooming(&collection).unwrap();
        assert_eq!(result.jets.len(), 2);
        assert!(result.jets.jets()[1].is_sentinel());
        result.attach_diagnostics(&mut collection, "SigSDtest").unwrap();
        assert_eq!(collection.integer("ndropSigSDtest").unwrap(), &[0, 0]);
        assert_eq!(collection.scalar("zgSigSDtest").unwrap()[1], 0.0);
        assert!(collection.scalar("dr12SigSDtest").unwrap()[0] > 0.19);
    }
}
