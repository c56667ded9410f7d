//! Imposte injection.
//!
//! A bay model may require a transom at passage height across the whole
//! bay. The plan is computed against the bay's existing members so that
//! repeated runs update the same member instead of stacking duplicates.

use crate::error::ChassisError;
use crate::generation::intermediate::MemberKind;
use crate::geometry::{approx_eq, FrameContext, Zone};
use crate::store::records::{BayModelRecord, MemberRecord};
use crate::types::RecordId;

/// What the injection step has to write.
#[derive(Debug, Clone, PartialEq)]
pub enum ImposteAction {
    Insert(MemberRecord),
    Update { id: RecordId, record: MemberRecord },
}

/// Plan the imposte transom for `bay_id`.
///
/// Returns `Ok(None)` when the model has no imposte. Missing imposte
/// material or passage height is a configuration error for this step only.
pub fn plan_imposte(
    ctx: &FrameContext,
    model: &BayModelRecord,
    bay_id: &RecordId,
    existing: &[(RecordId, MemberRecord)],
) -> Result<Option<ImposteAction>, ChassisError> {
    if !model.has_imposte {
        return Ok(None);
    }
    let material = model.imposte_material_id.clone().ok_or_else(|| {
        ChassisError::ConfigError(
            "Bay model requires an imposte but has no imposte material".to_string(),
        )
    })?;
    let height = ctx.passage_height.ok_or_else(|| {
        ChassisError::ConfigError("Bay requires an imposte but has no passage height".to_string())
    })?;
    if !(ctx.bay_width > 0.0) {
        return Err(ChassisError::ConfigError(
            "Bay width is required to place the imposte".to_string(),
        ));
    }

    let candidate = MemberRecord {
        bay_id: bay_id.clone(),
        kind: MemberKind::Transom,
        zone: Zone::Bay.label().to_string(),
        position: height,
        run_start: Some(0.0),
        run_end: Some(ctx.bay_width),
        material_id: Some(material),
    };

    let matching = existing.iter().find(|(_, member)| {
        member.kind == MemberKind::Transom
            && Zone::from_label(&member.zone) == Zone::Bay
            && approx_eq(member.position, height, ctx.tolerance)
    });

    Ok(Some(match matching {
        Some((id, _)) => ImposteAction::Update {
            id: id.clone(),
            record: candidate,
        },
        None => ImposteAction::Insert(candidate),
    }))
}
