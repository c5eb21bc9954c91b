// In: src/collection/mod.rs

//! `JetCollection`: an ordered jet sequence plus named, index-aligned attributes.
//!
//! The invariant is simple and enforced at every entry point: each attribute
//! sequence has exactly as many entries as there are jets. Reordering (as the
//! matcher does) goes through [`JetCollection::gather`], which rewrites the jets
//! and every attribute in lockstep.

use std::collections::BTreeMap;

use crate::error::HiJetError;
use crate::types::Jet;

pub mod export;

//==================================================================================
// 1. Attribute Values
//==================================================================================

/// A named per-jet attribute: a sequence of scalars or of jets.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Scalar(Vec<f64>),
    Integer(Vec<i64>),
    Jet(Vec<Jet>),
}

impl Attribute {
    pub fn len(&self) -> usize {
        match self {
            Attribute::Scalar(v) => v.len(),
            Attribute::Integer(v) => v.len(),
            Attribute::Jet(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Picks entries by index; `None` yields the zero/default value.
    fn gather(&self, picks: &[Option<usize>]) -> Attribute {
        match self {
            Attribute::Scalar(v) => {
                Attribute::Scalar(picks.iter().map(|p| p.map_or(0.0, |i| v[i])).collect())
            }
            Attribute::Integer(v) => {
                Attribute::Integer(picks.iter().map(|p| p.map_or(0, |i| v[i])).collect())
            }
            Attribute::Jet(v) => Attribute::Jet(
                picks
                    .iter()
                    .map(|p| p.map_or_else(Jet::sentinel, |i| v[i].clone()))
                    .collect(),
            ),
        }
    }
}

impl From<Vec<f64>> for Attribute {
    fn from(values: Vec<f64>) -> Self {
        Attribute::Scalar(values)
    }
}

impl From<Vec<i64>> for Attribute {
    fn from(values: Vec<i64>) -> Self {
        Attribute::Integer(values)
    }
}

impl From<Vec<usize>> for Attribute {
    fn from(values: Vec<usize>) -> Self {
        Attribute::Integer(values.into_iter().map(|v| v as i64).collect())
    }
}

impl From<Vec<Jet>> for Attribute {
    fn from(values: Vec<Jet>) -> Self {
        Attribute::Jet(values)
    }
}

//==================================================================================
// 2. The Collection
//==================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JetCollection {
    jets: Vec<Jet>,
    attributes: BTreeMap<String, Attribute>,
}

impl JetCollection {
    pub fn new(jets: Vec<Jet>) -> Self {
        Self {
            jets,
            attributes: BTreeMap::new(),
        }
    }

    pub fn jets(&self) -> &[Jet] {
        &self.jets
    }

    pub fn into_jets(self) -> Vec<Jet> {
        self.jets
    }

    pub fn len(&self) -> usize {
        self.jets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Jet> {
        self.jets.get(index)
    }

    /// Attaches `values` under `name`.
    ///
    /// # Errors
    /// `AttributeLengthMismatch` if the length differs from the jet count,
    /// `DuplicateAttribute` if `name` is already attached.
    pub fn add_attribute(
        &mut self,
        name: impl Into<String>,
        values: impl Into<Attribute>,
    ) -> Result<(), HiJetError> {
        let name = name.into();
        let values = values.into();
        if values.len() != self.jets.len() {
            return Err(HiJetError::AttributeLengthMismatch {
                name,
                expected: self.jets.len(),
                actual: values.len(),
            });
        }
        if self.attributes.contains_key(&name) {
            return Err(HiJetError::DuplicateAttribute(name));
        }
        self.attributes.insert(name, values);
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Attribute names in sorted order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn scalar(&self, name: &str) -> Result<&[f64], HiJetError> {
        match self.attributes.get(name) {
            Some(Attribute::Scalar(v)) => Ok(v),
            _ => Err(HiJetError::UnknownAttribute(name.to_string())),
        }
    }

    pub fn integer(&self, name: &str) -> Result<&[i64], HiJetError> {
        match self.attributes.get(name) {
            Some(Attribute::Integer(v)) => Ok(v),
            _ => Err(HiJetError::UnknownAttribute(name.to_string())),
        }
    }

    pub fn jet_attribute(&self, name: &str) -> Result<&[Jet], HiJetError> {
        match self.attributes.get(name) {
            Some(Attribute::Jet(v)) => Ok(v),
            _ => Err(HiJetError::UnknownAttribute(name.to_string())),
        }
    }

    /// Builds a new collection whose entry `k` is entry `picks[k]` of this one,
    /// or the sentinel jet with zeroed attributes when `picks[k]` is `None`.
    ///
    /// # Errors
    /// `InternalError` if any pick is out of range.
    pub fn gather(&self, picks: &[Option<usize>]) -> Result<JetCollection, HiJetError> {
        if let Some(bad) = picks.iter().flatten().find(|&&i| i >= self.jets.len()) {
            return Err(HiJetError::InternalError(format!(
                "gather index {} out of range for collection of {} jets",
                bad,
                self.jets.len()
            )));
        }
        let jets = picks
            .iter()
            .map(|p| p.map_or_else(Jet::sentinel, |i| self.jets[i].clone()))
            .collect();
        let attributes = self
            .attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.gather(picks)))
            .collect();
        Ok(JetCollection { jets, attributes })
    }
}

impl From<Vec<Jet>> for JetCollection {
    fn from(jets: Vec<Jet>) -> Self {
        JetCollection::new(jets)
    }
}
