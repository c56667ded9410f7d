//! Nomenclature Ingestion
//!
//! Bill-of-materials lines arrive with a free-text position label. The label
//! is classified once, here, into a tagged [`Position`]; the geometry passes
//! never look at the text again.

use crate::error::ChassisError;
use crate::geometry::Zone;
use crate::store::records::NomenclatureRecord;
use crate::types::RecordId;
use tracing::warn;

/// Role and edge implied by a position label such as `BAY_TRANSOM_TOP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Position {
    TopTransom,
    BottomTransom,
    LeftMullion,
    RightMullion,
    /// Filler bar stacked beside the left edge mullion.
    LeftFiller,
    /// Filler bar stacked beside the right edge mullion.
    RightFiller,
    Other(String),
}

impl Position {
    /// Labels follow `<ZONE>_<KIND>_<EDGE>`; only the kind/edge suffix matters.
    pub fn classify(label: &str) -> Position {
        let normalized = normalize_label(label);
        const SUFFIXES: [(&str, Position); 6] = [
            ("TRANSOM_TOP", Position::TopTransom),
            ("TRANSOM_BOTTOM", Position::BottomTransom),
            ("MULLION_LEFT", Position::LeftMullion),
            ("MULLION_RIGHT", Position::RightMullion),
            ("FILLER_LEFT", Position::LeftFiller),
            ("FILLER_RIGHT", Position::RightFiller),
        ];
        SUFFIXES
            .into_iter()
            .find(|(suffix, _)| normalized.ends_with(*suffix))
            .map(|(_, position)| position)
            .unwrap_or_else(|| Position::Other(normalized))
    }

    pub fn is_transom(&self) -> bool {
        matches!(self, Position::TopTransom | Position::BottomTransom)
    }

    pub fn is_mullion(&self) -> bool {
        matches!(self, Position::LeftMullion | Position::RightMullion)
    }

    pub fn is_filler(&self) -> bool {
        matches!(self, Position::LeftFiller | Position::RightFiller)
    }
}

/// Upper-cased, trimmed label used for matching and thickness lookups.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// A nomenclature line ready for the frame pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLine {
    pub id: RecordId,
    pub label: String,
    pub position: Position,
    pub zone: Zone,
    pub cut_rule: Option<String>,
    pub quantity: u32,
    pub material: RecordId,
}

impl FrameLine {
    /// Strict ingestion: an unknown zone label or a missing material is a
    /// data-integrity problem for this line only.
    pub fn from_record(id: RecordId, record: &NomenclatureRecord) -> Result<Self, ChassisError> {
        let zone = Zone::parse(&record.zone).ok_or_else(|| {
            ChassisError::DataIntegrity(format!(
                "nomenclature line {}: unknown zone label '{}'",
                id, record.zone
            ))
        })?;
        let material = record.material_id.clone().ok_or_else(|| {
            ChassisError::DataIntegrity(format!(
                "nomenclature line {}: no material reference",
                id
            ))
        })?;
        let label = normalize_label(&record.position);
        Ok(FrameLine {
            position: Position::classify(&label),
            label,
            zone,
            cut_rule: record.cut_rule.clone(),
            quantity: record.quantity,
            material,
            id,
        })
    }
}

/// Ingest every line, skipping empty quantities and lines that fail strict
/// ingestion. Returns the usable lines and the number skipped.
pub fn ingest_lines(records: Vec<(RecordId, NomenclatureRecord)>) -> (Vec<FrameLine>, usize) {
    let mut lines = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for (id, record) in records {
        if record.quantity == 0 {
            continue;
        }
        match FrameLine::from_record(id, &record) {
            Ok(line) => lines.push(line),
            Err(err) => {
                warn!(error = %err, "Skipping nomenclature line");
                skipped += 1;
            }
        }
    }
    (lines, skipped)
}
