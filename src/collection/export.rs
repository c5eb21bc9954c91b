//! Columnar export of jet collections for the output writer.
//!
//! Every collection becomes one Arrow `RecordBatch` with one row per jet:
//! kinematics first (`<name>Pt`, `<name>Eta`, `<name>Phi`, `<name>M`,
//! `<name>Area`), then the attributes in name order. Jet-valued attributes
//! expand into their own four kinematic columns.

use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use super::{Attribute, JetCollection};
use crate::error::HiJetError;
use crate::types::{Jet, Particle};

fn float_column(name: String, values: Vec<f64>) -> (Field, ArrayRef) {
    (
        Field::new(name, DataType::Float64, false),
        Arc::new(Float64Array::from(values)) as ArrayRef,
    )
}

fn kinematic_columns(prefix: &str, jets: &[Jet], with_area: bool) -> Vec<(Field, ArrayRef)> {
    let mut columns = vec![
        float_column(format!("{prefix}Pt"), jets.iter().map(Jet::pt).collect()),
        float_column(
            format!("{prefix}Eta"),
            jets.iter().map(|j| j.momentum.pseudorapidity()).collect(),
        ),
        float_column(format!("{prefix}Phi"), jets.iter().map(Jet::phi).collect()),
        float_column(format!("{prefix}M"), jets.iter().map(Jet::m).collect()),
    ];
    if with_area {
        columns.push(float_column(
            format!("{prefix}Area"),
            jets.iter().map(|j| j.area).collect(),
        ));
    }
    columns
}

impl JetCollection {
    /// Builds the writer-facing batch for this collection under `name`.
    pub fn to_record_batch(&self, name: &str) -> Result<RecordBatch, HiJetError> {
        let mut columns = kinematic_columns(name, self.jets(), true);

        for (attr_name, attr) in self.attributes() {
            match attr {
                Attribute::Scalar(v) => columns.push(float_column(attr_name.to_string(), v.clone())),
                Attribute::Integer(v) => columns.push((
                    Field::new(attr_name, DataType::Int64, false),
                    Arc::new(Int64Array::from(v.clone())) as ArrayRef,
                )),
                Attribute::Jet(v) => columns.extend(kinematic_columns(attr_name, v, false)),
            }
        }

        to_batch(columns)
    }
}

/// One row per particle: `<name>Pt`, `<name>Eta`, `<name>Phi`, `<name>M`.
pub(crate) fn particle_record_batch(name: &str, particles: &[Particle]) -> Result<RecordBatch, HiJetError> {
    let momenta: Vec<_> = particles.iter().map(|p| p.momentum).collect();
    to_batch(vec![
        float_column(format!("{name}Pt"), momenta.iter().map(|p| p.pt()).collect()),
        float_column(format!("{name}Eta"), momenta.iter().map(|p| p.pseudorapidity()).collect()),
        float_column(format!("{name}Phi"), momenta.iter().map(|p| p.phi()).collect()),
        float_column(format!("{name}M"), momenta.iter().map(|p| p.m()).collect()),
    ])
}

/// A single-row batch of named event-level scalars.
pub(crate) fn scalar_record_batch(values: &[(&str, f64)]) -> Result<RecordBatch, HiJetError> {
    to_batch(
        values
            .iter()
            .map(|(name, value)| float_column(name.to_string(), vec![*value]))
            .collect(),
    )
}

fn to_batch(columns: Vec<(Field, ArrayRef)>) -> Result<RecordBatch, HiJetError> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Origin, Particle};
    use arrow::array::Array;

    #[test]
    fn test_batch_has_kinematics_and_attributes() {
        let jets = vec![
            Jet::from_constituents(vec![Particle::massless(40.0, 0.5, 1.0, Origin::Signal)], 0.48),
            Jet::sentinel(),
        ];
        let mut c = JetCollection::new(jets);
        c.add_attribute("widthSig", vec![0.2, 0.0]).unwrap();
        c.add_attribute("ndropSigSDBeta00Z01", vec![1i64, 0]).unwrap();

        let batch = c.to_record_batch("sigJet").unwrap();
        assert_eq!(batch.num_rows(), 2);
        let names: Vec<String> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(
            names,
            vec![
                "sigJetPt",
                "sigJetEta",
                "sigJetPhi",
                "sigJetM",
                "sigJetArea",
                "ndropSigSDBeta00Z01",
                "widthSig"
            ]
        );

        let pt = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!((pt.value(0) - 40.0).abs() < 1e-9);
        assert_eq!(pt.value(1), 0.0);
        assert_eq!(pt.null_count(), 0);
    }

    #[test]
    fn test_empty_collection_exports_zero_rows() {
        let c = JetCollection::new(vec![]);
        let batch = c.to_record_batch("csJet").unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 5);
    }

    #[test]
    fn test_jet_attribute_expands_to_columns() {
        let jets = vec![Jet::from_constituents(
            vec![Particle::massless(40.0, 0.5, 1.0, Origin::Signal)],
            0.48,
        )];
        let mut c = JetCollection::new(jets.clone());
        c.add_attribute("partner", jets).unwrap();
        let batch = c.to_record_batch("rawJet").unwrap();
        assert_eq!(batch.num_columns(), 9);
        assert!(batch.schema().field_with_name("partnerPt").is_ok());
        assert!(batch.schema().field_with_name("partnerArea").is_err());
    }
}
