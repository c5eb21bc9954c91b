// In: src/event/mod.rs

//! The per-event driver.
//!
//! One event flows through a fixed sequence:
//! 1. Split the particle supply by origin; merged = background ++ signal.
//! 2. Cluster signal-only and merged particles into `sigJet` and `rawJet`.
//! 3. Attach angularities to the signal jets.
//! 4. Run constituent subtraction on the merged particles (`csJet`).
//! 5. Reorder `csJet` and `rawJet` onto the signal jet order.
//! 6. Groom the signal jets with every configured soft-drop setting.
//!
//! Events are processed strictly one after another; nothing carries over.

use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;

use crate::angularity::{Angularity, JetObservable};
use crate::background::CsSubtractor;
use crate::clustering::{ClusterSequence, GhostedAreaSpec, JetDefinition, Selector};
use crate::collection::export::{particle_record_batch, scalar_record_batch};
use crate::collection::JetCollection;
use crate::config::HiJetConfig;
use crate::error::HiJetError;
use crate::grooming::SoftDropGroomer;
use crate::matching::JetMatcher;
use crate::types::{sorted_by_pt, Origin, Particle};


//==================================================================================
// I. Event Boundaries
//==================================================================================

/// One event as delivered by the particle supply.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub particles: Vec<Particle>,
    pub hard_weight: f64,
    pub pu_weight: f64,
}

impl EventInput {
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            hard_weight: 1.0,
            pu_weight: 1.0,
        }
    }

    pub fn with_weights(mut self, hard_weight: f64, pu_weight: f64) -> Self {
        self.hard_weight = hard_weight;
        self.pu_weight = pu_weight;
        self
    }
}

/// The particle supply: yields events until exhausted.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<EventInput>, HiJetError>;
}

/// An in-memory event supply.
#[derive(Debug, Clone, Default)]
pub struct VecEventSource {
    events: std::vec::IntoIter<EventInput>,
}

impl VecEventSource {
    pub fn new(events: Vec<EventInput>) -> Self {
        Self {
            events: events.into_iter(),
        }
    }
}

impl EventSource for VecEventSource {
    fn next_event(&mut self) -> Result<Option<EventInput>, HiJetError> {
        Ok(self.events.next())
    }
}

/// The writer boundary: receives every processed event in order.
pub trait EventSink {
    fn write_event(&mut self, output: EventOutput) -> Result<(), HiJetError>;
}

impl EventSink for Vec<EventOutput> {
    fn write_event(&mut self, output: EventOutput) -> Result<(), HiJetError> {
        self.push(output);
        Ok(())
    }
}

//==================================================================================
// II. Event Output
//==================================================================================

/// Everything produced for one event, ready for the writer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventOutput {
    pub hard_weight: f64,
    pub pu_weight: f64,
    /// Background pT density used by the subtraction.
    pub rho: f64,
    /// Background mass-term density used by the subtraction.
    pub rho_m: f64,
    pub partons: Vec<Particle>,
    /// Named jet collections (`sigJet`, `rawJet`, `csJet`, `sigJetSD<label>`).
    pub collections: BTreeMap<String, JetCollection>,
}

impl EventOutput {
    pub fn collection(&self, name: &str) -> Option<&JetCollection> {
        self.collections.get(name)
    }

    /// One batch per named collection, plus `event` (weights and densities)
    /// and `partons`.
    pub fn to_record_batches(&self) -> Result<Vec<(String, RecordBatch)>, HiJetError> {
        let mut batches = vec![
            (
                "event".to_string(),
                scalar_record_batch(&[
                    ("hardWeight", self.hard_weight),
                    ("puWeight", self.pu_weight),
                    ("csRho", self.rho),
                    ("csRhom", self.rho_m),
                ])?,
            ),
            ("partons".to_string(), particle_record_batch("partons", &self.partons)?),
        ];
        for (name, collection) in &self.collections {
            batches.push((name.clone(), collection.to_record_batch(name)?));
        }
        Ok(batches)
    }
}

//==================================================================================
// III. Event Processor
//==================================================================================

#[derive(Debug, Clone)]
pub struct EventProcessor {
    jet_def: JetDefinition,
    area: GhostedAreaSpec,
    jet_selector: Selector,
    min_jet_pt: f64,
    subtractor: CsSubtractor,
    matcher: JetMatcher,
    groomers: Vec<(String, SoftDropGroomer)>,
    angularities: Vec<(String, Angularity)>,
}

impl EventProcessor {
    /// Validates `config` and builds every component. All configuration
    /// errors surface here, before any event is touched.
    pub fn new(config: &HiJetConfig) -> Result<Self, HiJetError> {
        config.validate()?;
        let groomers = config
            .grooming
            .iter()
            .map(|g| Ok((g.label.clone(), SoftDropGroomer::from_config(g, config.jet_radius)?)))
            .collect::<Result<Vec<_>, HiJetError>>()?;
        let angularities = config
            .angularities
            .iter()
            .map(|a| (a.label.clone(), Angularity::new(a.kappa, a.alpha, config.jet_radius)))
            .collect();

        log::info!(
            "Event processor: anti-kt R={}, |y| < {}, pt > {}, {} groomer(s), {} angularit(ies)",
            config.jet_radius,
            config.jet_rap_max,
            config.min_jet_pt,
            config.grooming.len(),
            config.angularities.len()
        );

        Ok(Self {
            jet_def: config.jet_definition(),
            area: config.ghost.area_spec(),
            jet_selector: Selector::abs_rap_max(config.jet_rap_max),
            min_jet_pt: config.min_jet_pt,
            subtractor: CsSubtractor::new(config)?,
            matcher: JetMatcher::from_config(config)?,
            groomers,
            angularities,
        })
    }

    /// Area-aware anti-kt jets within the acceptance, hardest first.
    fn cluster(&self, particles: &[Particle]) -> Result<JetCollection, HiJetError> {
        if particles.is_empty() {
            return Ok(JetCollection::default());
        }
        let cs = ClusterSequence::new(particles, self.jet_def, Some(&self.area))?;
        let jets: Vec<_> = self
            .jet_selector
            .apply(&cs.inclusive_jets(self.min_jet_pt))
            .into_iter()
            .filter(|j| !j.is_pure_ghost())
            .collect();
        Ok(JetCollection::new(sorted_by_pt(jets)))
    }

    pub fn process(&self, input: &EventInput) -> Result<EventOutput, HiJetError> {
        let select = |origin: Origin| -> Vec<Particle> {
            input.particles.iter().filter(|p| p.origin == origin).copied().collect()
        };
        let partons = select(Origin::Parton);
        let signal = select(Origin::Signal);
        let mut merged = select(Origin::Background);
        let n_background = merged.len();
        merged.extend_from_slice(&signal);

        log::info!(
            "Event: {} merged, {} signal, {} background, {} partons",
            merged.len(),
            signal.len(),
            n_background,
            partons.len()
        );

        let mut sig_jets = self.cluster(&signal)?;
        for (label, angularity) in &self.angularities {
            angularity.attach(&mut sig_jets, &format!("{label}Sig"))?;
        }

        let raw_jets = self.cluster(&merged)?;

        let subtraction = self.subtractor.do_subtraction(&merged)?;
        let (cs_jets, cs_match) = self.matcher.match_and_reorder(&subtraction.jets, &sig_jets)?;
        let (raw_jets, raw_match) = self.matcher.match_and_reorder(&raw_jets, &sig_jets)?;

        let mut collections = BTreeMap::new();
        for (label, groomer) in &self.groomers {
            let groomed = groomer.do_grooming(&sig_jets)?;
            let mut jets = groomed.jets.clone();
            groomed.attach_diagnostics(&mut jets, &format!("SigSD{label}"))?;
            collections.insert(format!("sigJetSD{label}"), jets);
        }

        log::debug!(
            "Event: {} signal jets, {} csJet and {} rawJet matched",
            sig_jets.len(),
            cs_match.n_matched(),
            raw_match.n_matched()
        );
        log_metric!(
            "event" = "processed",
            "sig_jets" = sig_jets.len(),
            "rho" = subtraction.rho()
        );

        collections.insert("sigJet".to_string(), sig_jets);
        collections.insert("csJet".to_string(), cs_jets);
        collections.insert("rawJet".to_string(), raw_jets);

        Ok(EventOutput {
            hard_weight: input.hard_weight,
            pu_weight: input.pu_weight,
            rho: subtraction.rho(),
            rho_m: subtraction.rho_m(),
            partons,
            collections,
        })
    }

    /// Processes up to `max_events` events from `source` in order, handing
    /// each result to `sink`. Returns the number of events processed.
    pub fn run(
        &self,
        source: &mut dyn EventSource,
        max_events: Option<usize>,
        sink: &mut dyn EventSink,
    ) -> Result<usize, HiJetError> {
        let mut n_events = 0;
        while max_events.map_or(true, |max| n_events < max) {
            let Some(input) = source.next_event()? else {
                break;
            };
            let output = self.process(&input)?;
            sink.write_event(output)?;
            n_events += 1;
            if n_events % 100 == 0 {
                log::info!("Processed {} events", n_events);
            }
        }
        log::info!("Finished: {} events processed", n_events);
        Ok(n_events)
    }
}
