use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::data::loader::Record;
use crate::foundation::core::{EntityId, Year};

/// One year's records, ranked descending by `metric` and truncated.
///
/// Position in `records` is the target rank; every record has a numeric `metric` and a
/// unique entity id.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Frame {
    pub year: Year,
    pub metric: String,
    pub records: Vec<Record>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.records.iter().map(|r| &r.entity_id)
    }

    pub fn rank_of(&self, id: &EntityId) -> Option<usize> {
        self.records.iter().position(|r| &r.entity_id == id)
    }

    /// Ranking metric of the record at `rank`.
    pub fn value_at(&self, rank: usize) -> Option<f64> {
        self.records.get(rank)?.metric(&self.metric)
    }

    /// Largest ranking value (the first record's, by construction).
    pub fn max_value(&self) -> Option<f64> {
        self.value_at(0)
    }

    /// This frame with only the first record per id, plus the ids of the dropped repeats.
    ///
    /// Borrows when the ids are already unique, which is always the case for frames from
    /// [`FrameBuilder::build`].
    pub fn dedup(&self) -> (Cow<'_, Frame>, Vec<EntityId>) {
        let mut seen = BTreeSet::<&EntityId>::new();
        if self.ids().all(|id| seen.insert(id)) {
            return (Cow::Borrowed(self), Vec::new());
        }

        seen.clear();
        let mut dropped = Vec::new();
        let mut records = Vec::with_capacity(self.records.len());
        for rec in &self.records {
            if seen.insert(&rec.entity_id) {
                records.push(rec.clone());
            } else {
                dropped.push(rec.entity_id.clone());
            }
        }
        let frame = Frame {
            year: self.year,
            metric: self.metric.clone(),
            records,
        };
        (Cow::Owned(frame), dropped)
    }
}

/// Records excluded while building a frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum FrameIssue {
    /// The ranking metric, or a required one, is absent or non-numeric.
    MissingMetric { entity_id: EntityId },
    /// A later record reused an id already present in the frame.
    DuplicateIdentity { entity_id: EntityId },
}

/// Ranks raw year slices into [`Frame`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuilder {
    pub metric: String,
    pub top_n: Option<usize>,
    /// Extra metrics a record must carry to be placed (e.g. the scatter y metric).
    pub required: Vec<String>,
}

impl FrameBuilder {
    pub fn new(metric: impl Into<String>, top_n: Option<usize>) -> Self {
        Self {
            metric: metric.into(),
            top_n,
            required: Vec::new(),
        }
    }

    pub fn requiring(mut self, metric: impl Into<String>) -> Self {
        self.required.push(metric.into());
        self
    }

    /// Missing metrics are dropped before sorting and only the first record per id is kept,
    /// so the comparator only ever sees finite values and the frame has unique ids.
    pub fn build(&self, year: Year, records: &[Record]) -> (Frame, Vec<FrameIssue>) {
        let mut issues = Vec::new();
        let mut seen = BTreeSet::<&EntityId>::new();
        let mut ranked = Vec::<(f64, &Record)>::with_capacity(records.len());

        for rec in records {
            let Some(v) = rec
                .metric(&self.metric)
                .filter(|_| self.required.iter().all(|m| rec.metric(m).is_some()))
            else {
                issues.push(FrameIssue::MissingMetric {
                    entity_id: rec.entity_id.clone(),
                });
                continue;
            };
            if !seen.insert(&rec.entity_id) {
                issues.push(FrameIssue::DuplicateIdentity {
                    entity_id: rec.entity_id.clone(),
                });
                continue;
            }
            ranked.push((v, rec));
        }

        ranked.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.entity_id.cmp(&b.1.entity_id))
        });
        if let Some(n) = self.top_n {
            ranked.truncate(n);
        }

        for issue in &issues {
            if let FrameIssue::DuplicateIdentity { entity_id } = issue {
                tracing::warn!(%year, %entity_id, "duplicate entity in frame, keeping first");
            }
        }

        let frame = Frame {
            year,
            metric: self.metric.clone(),
            records: ranked.into_iter().map(|(_, r)| r.clone()).collect(),
        };
        (frame, issues)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/frame.rs"]
mod tests;
