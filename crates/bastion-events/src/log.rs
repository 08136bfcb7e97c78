//! Change log accumulation and decoding.
//!
//! A [`ChangeLogBuilder`] collects records while a command executes. When
//! the command finishes, [`ChangeLogBuilder::finalize`] drains the builder
//! into an ordered [`ChangeList`] handed back to the caller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DecodeError;
use crate::record::ChangeRecord;

// ---------------------------------------------------------------------------
// ChangeList
// ---------------------------------------------------------------------------

/// An ordered, finalized list of change records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeList(Vec<ChangeRecord>);

impl ChangeList {
    /// The records in emission order.
    pub fn records(&self) -> &[ChangeRecord] {
        &self.0
    }

    /// Number of records.
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list holds no records.
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the records in emission order.
    pub fn iter(&self) -> core::slice::Iter<'_, ChangeRecord> {
        self.0.iter()
    }

    /// Kind names in emission order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.0.iter().map(ChangeRecord::kind).collect()
    }

    /// Number of records of the given kind.
    pub fn count_kind(&self, kind: &str) -> usize {
        self.0.iter().filter(|r| r.kind() == kind).count()
    }

    /// Consume the list and return the underlying records.
    pub fn into_inner(self) -> Vec<ChangeRecord> {
        self.0
    }
}

impl From<Vec<ChangeRecord>> for ChangeList {
    fn from(records: Vec<ChangeRecord>) -> Self {
        Self(records)
    }
}

impl IntoIterator for ChangeList {
    type Item = ChangeRecord;
    type IntoIter = std::vec::IntoIter<ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeList {
    type Item = &'a ChangeRecord;
    type IntoIter = core::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// ChangeLogBuilder
// ---------------------------------------------------------------------------

/// Append-only accumulator of change records for one command or tick.
#[derive(Debug, Default)]
pub struct ChangeLogBuilder {
    records: Vec<ChangeRecord>,
}

impl ChangeLogBuilder {
    /// Create an empty builder.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append one record.
    pub fn push(&mut self, record: impl Into<ChangeRecord>) {
        self.records.push(record.into());
    }

    /// Append every record of an already finalized list.
    pub fn append(&mut self, list: ChangeList) {
        self.records.extend(list);
    }

    /// Number of records accumulated so far.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded yet.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record pushed after the first `len`. Used to discard the
    /// partial output of a command that failed mid-execution.
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Drain the builder into a finalized list, leaving it empty.
    pub fn finalize(&mut self) -> ChangeList {
        ChangeList(std::mem::take(&mut self.records))
    }
}

// ---------------------------------------------------------------------------
// Lenient decoding
// ---------------------------------------------------------------------------

/// Result of decoding a change list that may contain unknown kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedChanges {
    /// Records of known kinds, in their original order.
    pub list: ChangeList,
    /// Kind names that were skipped because this version does not know them.
    pub skipped: Vec<String>,
}

/// Decode a JSON array of change records, ignoring kinds this version does
/// not know.
///
/// Records of a known kind that fail to decode are still an error: only the
/// kind name decides whether a record may be skipped.
pub fn decode_lenient(json: &str) -> Result<DecodedChanges, DecodeError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut decoded = DecodedChanges::default();
    let mut records = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let kind = value
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .ok_or(DecodeError::MissingKind { index })?
            .to_owned();

        if !ChangeRecord::KINDS.contains(&kind.as_str()) {
            debug!(index, kind = %kind, "Skipping unknown change record kind");
            decoded.skipped.push(kind);
            continue;
        }

        let record: ChangeRecord = serde_json::from_value(value)
            .map_err(|source| DecodeError::Malformed { index, kind, source })?;
        records.push(record);
    }

    decoded.list = ChangeList(records);
    Ok(decoded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{ArmyId, Hex, PlayerId, ResourceType};

    use super::*;
    use crate::record::{ArmyArrivedChange, ArmyDisbandedChange, ResourcesSpentChange};

    #[test]
    fn finalize_drains_in_order() {
        let mut builder = ChangeLogBuilder::new();
        builder.push(ResourcesSpentChange {
            player: PlayerId::new(),
            amounts: [(ResourceType::Wood, 50)].into_iter().collect(),
        });
        builder.push(ArmyDisbandedChange { army: ArmyId::new() });

        let list = builder.finalize();
        assert_eq!(list.kinds(), vec!["ResourcesSpent", "ArmyDisbanded"]);
        assert!(builder.is_empty());
        assert!(builder.finalize().is_empty());
    }

    #[test]
    fn append_keeps_existing_records_first() {
        let mut first = ChangeLogBuilder::new();
        first.push(ArmyDisbandedChange { army: ArmyId::new() });
        let mut second = ChangeLogBuilder::new();
        second.push(ArmyArrivedChange {
            army: ArmyId::new(),
            position: Hex::new(1, 1),
        });
        second.append(first.finalize());

        assert_eq!(second.finalize().kinds(), vec!["ArmyArrived", "ArmyDisbanded"]);
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let army = ArmyId::new();
        let json = format!(
            r#"[{{"kind":"DragonSummoned","dragon":"red"}},{{"kind":"ArmyDisbanded","army":"{army}"}}]"#
        );

        let decoded = decode_lenient(&json).unwrap();
        assert_eq!(decoded.list.len(), 1);
        assert_eq!(decoded.skipped, vec!["DragonSummoned".to_owned()]);
        assert_eq!(decoded.list.count_kind("ArmyDisbanded"), 1);
    }

    #[test]
    fn malformed_known_kind_is_an_error() {
        let json = r#"[{"kind":"ArmyDisbanded","army":42}]"#;
        let err = decode_lenient(json).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { index: 0, .. }));
    }

    #[test]
    fn missing_kind_is_an_error() {
        let err = decode_lenient(r#"[{"army":"x"}]"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingKind { index: 0 }));
    }

    #[test]
    fn finalized_list_round_trips_through_lenient_decoding() {
        let mut builder = ChangeLogBuilder::new();
        builder.push(ArmyArrivedChange {
            army: ArmyId::new(),
            position: Hex::new(3, -2),
        });
        let list = builder.finalize();
        let json = serde_json::to_string(&list).unwrap();

        let decoded = decode_lenient(&json).unwrap();
        assert_eq!(decoded.list, list);
        assert!(decoded.skipped.is_empty());
    }
}
