//! Jet-by-jet constituent subtraction.
//!
//! Every ghost of a jet stands for the background expected in its cell:
//! pT = ρ·A_ghost and (mT − pT) = ρ_m·A_ghost. Particle–ghost pairs are
//! visited from the closest to the farthest, and each pair moves as much of the
//! ghost's remaining budget onto the particle as the particle can absorb.
//! Particles left with zero pT are dropped; the rest keep their direction.

use crate::config::SubtractionConfig;
use crate::types::{FourMomentum, Jet, Particle};

use super::estimator::BackgroundEstimate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstituentSubtractor {
    /// Pairs with ΔR above this are never used; ≤ 0 disables the cap.
    pub max_distance: f64,
    /// Exponent a in the pairing distance pT,i^a · ΔR.
    pub distance_exponent: f64,
    /// Area represented by one ghost.
    pub ghost_area: f64,
}

struct Pair {
    distance: f64,
    delta_r: f64,
    particle: usize,
    ghost: usize,
}

impl ConstituentSubtractor {
    pub fn new(config: &SubtractionConfig, ghost_area: f64) -> Self {
        Self {
            max_distance: config.max_distance,
            distance_exponent: config.distance_exponent,
            ghost_area,
        }
    }

    fn has_cap(&self) -> bool {
        self.max_distance > 0.0
    }

    /// Returns the corrected jet, or `None` if no constituent survives.
    pub fn subtract(&self, jet: &Jet, estimate: &BackgroundEstimate) -> Option<Jet> {
        let particles: Vec<&Particle> = jet.particles().collect();
        if particles.is_empty() {
            return None;
        }
        let ghosts: Vec<&Particle> = jet.ghosts().collect();

        let mut pt: Vec<f64> = particles.iter().map(|p| p.pt()).collect();
        let mut mass_term: Vec<f64> = particles
            .iter()
            .map(|p| (p.momentum.mt() - p.pt()).max(0.0))
            .collect();
        let mut ghost_pt = vec![estimate.rho.max(0.0) * self.ghost_area; ghosts.len()];
        let mut ghost_mass_term = vec![estimate.rho_m.max(0.0) * self.ghost_area; ghosts.len()];

        let mut pairs = Vec::with_capacity(particles.len() * ghosts.len());
        for (i, p) in particles.iter().enumerate() {
            let weight = if self.distance_exponent == 0.0 {
                1.0
            } else {
                pt[i].powf(self.distance_exponent)
            };
            for (k, g) in ghosts.iter().enumerate() {
                let delta_r = p.momentum.delta_r(&g.momentum);
                if self.has_cap() && delta_r > self.max_distance {
                    continue;
                }
                pairs.push(Pair {
                    distance: weight * delta_r,
                    delta_r,
                    particle: i,
                    ghost: k,
                });
            }
        }
        // Closest first; equal distances resolve by particle, then ghost index.
        pairs.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.particle.cmp(&b.particle))
                .then(a.ghost.cmp(&b.ghost))
        });

        for pair in &pairs {
            debug_assert!(!self.has_cap() || pair.delta_r <= self.max_distance);
            exchange(&mut pt[pair.particle], &mut ghost_pt[pair.ghost]);
            exchange(&mut mass_term[pair.particle], &mut ghost_mass_term[pair.ghost]);
        }

        let corrected: Vec<Particle> = particles
            .iter()
            .enumerate()
            .filter(|(i, _)| pt[*i] > 0.0)
            .map(|(i, p)| {
                let mt = pt[i] + mass_term[i];
                let mass = (mt * mt - pt[i] * pt[i]).max(0.0).sqrt();
                Particle {
                    momentum: FourMomentum::from_pt_y_phi_m(pt[i], p.rapidity(), p.phi(), mass),
                    origin: p.origin,
                    user_index: p.user_index,
                }
            })
            .collect();

        log::debug!(
            "Constituent subtraction: {} -> {} particles, {} ghosts, pt {:.3} -> {:.3}",
            particles.len(),
            corrected.len(),
            ghosts.len(),
            jet.pt(),
            corrected.iter().map(|p| p.momentum).sum::<FourMomentum>().pt()
        );

        if corrected.is_empty() {
            return None;
        }
        Some(Jet::from_constituents(corrected, jet.area))
    }
}

/// Moves budget from `ghost` onto `particle` until one of them is exhausted.
fn exchange(particle: &mut f64, ghost: &mut f64) {
    if *particle <= 0.0 || *ghost <= 0.0 {
        return;
    }
    if *particle >= *ghost {
        *particle -= *ghost;
        *ghost = 0.0;
    } else {
        *ghost -= *particle;
        *particle = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;

    fn jet_with_ghosts(particles: Vec<Particle>, n_ghosts: usize, ghost_area: f64) -> Jet {
        let mut constituents = particles;
        for k in 0..n_ghosts {
            let y = -0.2 + 0.4 * (k as f64 + 0.5) / n_ghosts as f64;
            constituents.push(Particle::massless(1e-100, y, 1.0, Origin::Ghost));
        }
        Jet::from_constituents(constituents, n_ghosts as f64 * ghost_area)
    }

    fn estimate(rho: f64, rho_m: f64) -> BackgroundEstimate {
        BackgroundEstimate {
            rho,
            rho_m,
            n_patches: 10,
        }
    }

    fn uncapped() -> ConstituentSubtractor {
        ConstituentSubtractor::new(&SubtractionConfig::default(), 0.01)
    }

    #[test]
    fn test_removes_rho_times_area() {
        let jet = jet_with_ghosts(
            vec![
                Particle::massless(30.0, 0.0, 1.0, Origin::Signal),
                Particle::massless(5.0, 0.1, 1.05, Origin::Background),
            ],
            40,
            0.01,
        );
        let out = uncapped().subtract(&jet, &estimate(20.0, 0.0)).unwrap();
        let before: f64 = jet.particles().map(|p| p.pt()).sum();
        let after: f64 = out.constituents.iter().map(|p| p.pt()).sum();
        // 40 ghosts * 0.01 * 20 = 8 GeV of background.
        assert!((before - after - 8.0).abs() < 1e-9);
        assert!(out.constituents.iter().all(|p| !p.is_ghost()));
        assert_eq!(out.area, jet.area);
    }

    #[test]
    fn test_soft_particle_fully_absorbed() {
        let jet = jet_with_ghosts(
            vec![
                Particle::massless(30.0, 0.0, 1.0, Origin::Signal),
                Particle::massless(0.5, 0.15, 1.0, Origin::Background),
            ],
            10,
            0.01,
        );
        // Ghost budgets of 0.6 each; the closest ghost alone swallows the soft particle.
        let out = uncapped().subtract(&jet, &estimate(60.0, 0.0)).unwrap();
        assert_eq!(out.constituents.len(), 1);
        assert_eq!(out.constituents[0].origin, Origin::Signal);
        assert!((out.pt() - (30.0 + 0.5 - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fully_absorbed_jet_is_dropped() {
        let jet = jet_with_ghosts(vec![Particle::massless(1.0, 0.0, 1.0, Origin::Background)], 20, 0.01);
        assert!(uncapped().subtract(&jet, &estimate(150.0, 0.0)).is_none());
    }

    #[test]
    fn test_zero_rho_leaves_jet_unchanged() {
        let jet = jet_with_ghosts(vec![Particle::massless(12.0, 0.0, 1.0, Origin::Signal)], 10, 0.01);
        let out = uncapped().subtract(&jet, &BackgroundEstimate::zero()).unwrap();
        assert!((out.pt() - 12.0).abs() < 1e-9);
        assert!((out.rapidity() - jet.rapidity()).abs() < 1e-9);
    }

    #[test]
    fn test_max_distance_limits_reach() {
        // Ghosts span |Δy| up to 0.2 from the particle; cap at 0.05 reaches few.
        let jet = jet_with_ghosts(vec![Particle::massless(50.0, 0.0, 1.0, Origin::Signal)], 40, 0.01);
        let capped = ConstituentSubtractor::new(
            &SubtractionConfig {
                max_distance: 0.05,
                distance_exponent: 0.0,
            },
            0.01,
        );
        let rho = estimate(10.0, 0.0);
        let capped_pt = capped.subtract(&jet, &rho).unwrap().pt();
        let uncapped_pt = uncapped().subtract(&jet, &rho).unwrap().pt();
        assert!((uncapped_pt - 46.0).abs() < 1e-9);
        assert!(capped_pt > uncapped_pt);
        assert!(capped_pt < 50.0);
    }

    #[test]
    fn test_momentum_never_negative() {
        let jet = jet_with_ghosts(
            vec![
                Particle::massless(2.0, 0.0, 1.0, Origin::Signal),
                Particle::massless(1.0, 0.05, 1.0, Origin::Background),
                Particle::massless(0.3, -0.1, 1.0, Origin::Background),
            ],
            30,
            0.01,
        );
        for rho in [0.0, 1.0, 10.0, 1000.0] {
            for cap in [-1.0, 0.05, 0.3] {
                let sub = ConstituentSubtractor::new(
                    &SubtractionConfig {
                        max_distance: cap,
                        distance_exponent: 1.0,
                    },
                    0.01,
                );
                if let Some(out) = sub.subtract(&jet, &estimate(rho, rho / 10.0)) {
                    for p in &out.constituents {
                        assert!(p.pt() >= 0.0);
                        assert!(p.momentum.e >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_mass_term_subtracted() {
        let massive = Particle::new(FourMomentum::from_pt_y_phi_m(10.0, 0.0, 1.0, 3.0), Origin::Signal);
        let jet = jet_with_ghosts(vec![massive], 10, 0.01);
        let mass_term_before = massive.momentum.mt() - massive.pt();
        let out = uncapped().subtract(&jet, &estimate(0.0, 2.0)).unwrap();
        let p = out.constituents[0];
        let mass_term_after = p.momentum.mt() - p.pt();
        assert!((p.pt() - 10.0).abs() < 1e-9);
        assert!((mass_term_before - mass_term_after - 0.2).abs() < 1e-6);
    }
}
