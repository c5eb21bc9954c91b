//! Geometric jet-to-jet matching between two collections.
//!
//! Matching is greedy: the globally closest unclaimed (base, tag) pair within
//! the matching radius is committed first, then the next, until no pair is
//! left under the cutoff. This approximates minimum-weight bipartite matching
//! and agrees with it whenever jets are well separated. Equal distances go to
//! the lower base index, then the lower tag index.

use bitvec::prelude::*;
use ndarray::Array2;

use crate::collection::JetCollection;
use crate::config::HiJetConfig;
use crate::error::HiJetError;
use crate::types::Jet;

/// Result of matching a base collection onto a tag collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// For each tag jet, the base jet it was paired with.
    pub tag_to_base: Vec<Option<usize>>,
    /// For each base jet, the tag jet it was paired with.
    pub base_to_tag: Vec<Option<usize>>,
    /// ΔR of each committed pair, indexed by tag.
    pub delta_r: Vec<Option<f64>>,
}

impl MatchRecord {
    pub fn n_matched(&self) -> usize {
        self.tag_to_base.iter().filter(|m| m.is_some()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetMatcher {
    /// Pairs with ΔR above this are never committed.
    pub max_delta_r: f64,
}

impl JetMatcher {
    pub fn new(max_delta_r: f64) -> Result<Self, HiJetError> {
        if !(max_delta_r.is_finite() && max_delta_r > 0.0) {
            return Err(HiJetError::InvalidRadius(max_delta_r));
        }
        Ok(Self { max_delta_r })
    }

    /// Matches within the configured jet radius.
    pub fn from_config(config: &HiJetConfig) -> Result<Self, HiJetError> {
        Self::new(config.jet_radius)
    }

    /// Pairs jets of `base` with jets of `tag`. Sentinel (zero-momentum) jets
    /// on either side are never matched.
    pub fn match_jets(&self, base: &[Jet], tag: &[Jet]) -> MatchRecord {
        let distances = Array2::from_shape_fn((base.len(), tag.len()), |(b, t)| {
            base[b].delta_r(&tag[t])
        });

        let mut candidates: Vec<(f64, usize, usize)> = distances
            .indexed_iter()
            .filter(|&((b, t), &dr)| {
                dr <= self.max_delta_r && !base[b].is_sentinel() && !tag[t].is_sentinel()
            })
            .map(|((b, t), &dr)| (dr, b, t))
            .collect();
        candidates.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

        let mut base_claimed = bitvec![u8, Lsb0; 0; base.len()];
        let mut tag_claimed = bitvec![u8, Lsb0; 0; tag.len()];
        let mut record = MatchRecord {
            tag_to_base: vec![None; tag.len()],
            base_to_tag: vec![None; base.len()],
            delta_r: vec![None; tag.len()],
        };

        for (dr, b, t) in candidates {
            if base_claimed[b] || tag_claimed[t] {
                continue;
            }
            base_claimed.set(b, true);
            tag_claimed.set(t, true);
            record.tag_to_base[t] = Some(b);
            record.base_to_tag[b] = Some(t);
            record.delta_r[t] = Some(dr);
        }

        log::debug!(
            "Matched {} of {} tag jets against {} base jets (max dR {})",
            record.n_matched(),
            tag.len(),
            base.len(),
            self.max_delta_r
        );
        record
    }

    /// Matches `base` onto `tag` and returns `base` in tag order.
    pub fn match_and_reorder(
        &self,
        base: &JetCollection,
        tag: &JetCollection,
    ) -> Result<(JetCollection, MatchRecord), HiJetError> {
        let record = self.match_jets(base.jets(), tag.jets());
        let reordered = reordered_to_tag(&record, base)?;
        Ok((reordered, record))
    }
}

/// Rebuilds `base` so that position i holds the base jet matched to tag jet i.
///
/// Unmatched positions hold the sentinel jet (zero four-momentum) with zero
/// attributes, so the output always has the tag collection's length. Every
/// attribute of `base` is permuted along with the jets.
pub fn reordered_to_tag(record: &MatchRecord, base: &JetCollection) -> Result<JetCollection, HiJetError> {
    if record.base_to_tag.len() != base.len() {
        return Err(HiJetError::InternalError(format!(
            "match record built for {} base jets, collection has {}",
            record.base_to_tag.len(),
            base.len()
        )));
    }
    base.gather(&record.tag_to_base)
}
