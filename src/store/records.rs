//! Typed record shapes exchanged with the record store.

use crate::error::StorageError;
use crate::generation::intermediate::MemberKind;
use crate::geometry::{Orientation, Zone};
use crate::piece::{Role, Side, Source};
use crate::store::{EntityKind, Fields};
use crate::types::{CellKey, RecordId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed view over one entity kind.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;
}

pub fn encode<T: Entity>(entity: &T) -> Result<Fields, StorageError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StorageError::Serialization {
            kind: T::KIND,
            message: "record did not serialize to an object".to_string(),
        }),
        Err(e) => Err(StorageError::Serialization {
            kind: T::KIND,
            message: e.to_string(),
        }),
    }
}

pub fn decode<T: Entity>(fields: Fields) -> Result<T, StorageError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| StorageError::Serialization {
        kind: T::KIND,
        message: e.to_string(),
    })
}

fn default_quantity() -> u32 {
    1
}

/// Bay dimensions and references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BayRecord {
    pub model_id: Option<RecordId>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(default)]
    pub fixed_left_width: Option<f64>,
    #[serde(default)]
    pub fixed_right_width: Option<f64>,
    #[serde(default)]
    pub passage_width: Option<f64>,
    #[serde(default)]
    pub passage_height: Option<f64>,
    #[serde(default)]
    pub mullions_through: bool,
    #[serde(default)]
    pub bead_material_id: Option<RecordId>,
}

impl Entity for BayRecord {
    const KIND: EntityKind = EntityKind::Bay;
}

/// Bay model: whether a passage-height transom is mandatory, and its material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BayModelRecord {
    #[serde(default)]
    pub has_imposte: bool,
    #[serde(default)]
    pub imposte_material_id: Option<RecordId>,
}

impl Entity for BayModelRecord {
    const KIND: EntityKind = EntityKind::BayModel;
}

/// One bill-of-materials line of a bay model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NomenclatureRecord {
    pub model_id: RecordId,
    pub position: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub cut_rule: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub material_id: Option<RecordId>,
    #[serde(default)]
    pub formula: Option<String>,
}

impl Entity for NomenclatureRecord {
    const KIND: EntityKind = EntityKind::NomenclatureLine;
}

/// User-placed mullion or transom, in zone-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub bay_id: RecordId,
    pub kind: MemberKind,
    #[serde(default)]
    pub zone: String,
    pub position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<RecordId>,
}

impl Entity for MemberRecord {
    const KIND: EntityKind = EntityKind::Member;
}

/// Profile product with its two face thicknesses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    #[serde(default)]
    pub interior_thickness: f64,
    #[serde(default)]
    pub exterior_thickness: f64,
}

impl Entity for MaterialRecord {
    const KIND: EntityKind = EntityKind::MaterialProduct;
}

/// Flat stored form of a generated piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceRecord {
    pub bay_id: RecordId,
    pub role: Role,
    pub zone: Zone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_key: Option<CellKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<RecordId>,
    pub source: Source,
    #[serde(default)]
    pub reinforced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nomenclature_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_rule: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_length: Option<u32>,
}

impl Entity for PieceRecord {
    const KIND: EntityKind = EntityKind::GeneratedPiece;
}
