//! Model-applier aggregation.
//!
//! Reduces labeled outputs into one unconditional total row followed by
//! one row per distinct label. Impressions count activity entries; reach
//! counts distinct virtual person ids.

use crate::{
    error::{GenError, GenResult},
    event::LabelerInput,
    labeler::{Labeler, LabelerOutput, LabelerOutputList, PersonLabelAttributes},
    types::VirtualPersonId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
    /// `None` on the total row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<PersonLabelAttributes>,
    pub impressions: u64,
    pub reach: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregatedReport {
    pub rows: Vec<ReportRow>,
}

impl AggregatedReport {
    /// The unconditional row, always first.
    pub fn total(&self) -> Option<&ReportRow> {
        self.rows.first()
    }

    pub fn label_rows(&self) -> &[ReportRow] {
        self.rows.get(1..).unwrap_or_default()
    }

    pub fn row_for(&self, label: &PersonLabelAttributes) -> Option<&ReportRow> {
        self.label_rows()
            .iter()
            .find(|row| row.attrs.as_ref() == Some(label))
    }
}

/// Running count and distinct ids for one group.
#[derive(Debug, Default)]
struct AggregatedRow {
    count: u64,
    virtual_person_ids: HashSet<VirtualPersonId>,
}

impl AggregatedRow {
    fn add(&mut self, virtual_person_id: VirtualPersonId) {
        self.count += 1;
        self.virtual_person_ids.insert(virtual_person_id);
    }

    fn into_row(self, attrs: Option<PersonLabelAttributes>) -> ReportRow {
        ReportRow {
            attrs,
            impressions: self.count,
            reach: self.virtual_person_ids.len() as u64,
        }
    }
}

/// Aggregate every activity of every output.
///
/// Label rows are grouped by structural equality and emitted in label order.
pub fn aggregate_output<'a, I>(outputs: I) -> AggregatedReport
where
    I: IntoIterator<Item = &'a LabelerOutput>,
{
    let mut total = AggregatedRow::default();
    let mut label_rows: BTreeMap<PersonLabelAttributes, AggregatedRow> = BTreeMap::new();

    for output in outputs {
        for person in &output.people {
            if let Some(label) = person.label {
                label_rows
                    .entry(label)
                    .or_default()
                    .add(person.virtual_person_id);
            }
            total.add(person.virtual_person_id);
        }
    }

    let mut rows = Vec::with_capacity(label_rows.len() + 1);
    rows.push(total.into_row(None));
    rows.extend(
        label_rows
            .into_iter()
            .map(|(label, acc)| acc.into_row(Some(label))),
    );
    log::info!(
        "aggregated {} impressions into {} label rows",
        rows[0].impressions,
        rows.len() - 1
    );
    AggregatedReport { rows }
}

/// Label every input in order. The first failure aborts the pass.
pub fn apply_labeler<L: Labeler + ?Sized>(
    labeler: &L,
    inputs: &[LabelerInput],
) -> GenResult<LabelerOutputList> {
    let outputs = inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            labeler.label(input).map_err(|e| GenError::Collaborator {
                index,
                reason: format!("{e:#}"),
            })
        })
        .collect::<GenResult<Vec<_>>>()?;
    Ok(LabelerOutputList { outputs })
}
