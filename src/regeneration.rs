//! Bay Regeneration
//!
//! Orchestrates one bay: validate inputs, confirm, reset the bay's generated
//! pieces, run the generation passes in order with the store writes between
//! them, then compute cut lengths. Each pass's writes are issued in chunks;
//! a failed write aborts the pass and leaves earlier writes in place, so the
//! recovery path is another reset and regeneration.

use crate::config::BaycutConfig;
use crate::confirm::ConfirmationGate;
use crate::cutting::{CutLengthEngine, EngineSettings, Thickness, ThicknessCache, ThicknessSource};
use crate::error::{ChassisError, StorageError};
use crate::formula::{context_variables, Formula, VariableEnv};
use crate::generation::transom::transom_heights;
use crate::generation::{
    generate_cells, generate_frame, materialize_members, plan_imposte, segment_transoms,
    ImposteAction, Member,
};
use crate::geometry::FrameContext;
use crate::nomenclature::{ingest_lines, normalize_label};
use crate::piece::GeneratedPiece;
use crate::store::batch::{create_all, delete_matching, update_all};
use crate::store::records::{
    encode, BayModelRecord, BayRecord, MemberRecord, NomenclatureRecord, PieceRecord,
};
use crate::store::{
    fetch, fetch_all, insert, EntityKind, Fields, Filter, RecordStore, SledRecordStore,
};
use crate::types::RecordId;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A bay and its model, with the derived frame context.
#[derive(Debug, Clone)]
pub struct BayInputs {
    pub bay_id: RecordId,
    pub bay: BayRecord,
    pub model_id: RecordId,
    pub model: BayModelRecord,
    pub context: FrameContext,
}

/// Result of the imposte injection step.
#[derive(Debug, Clone, PartialEq)]
pub enum ImposteOutcome {
    NotRequired,
    Inserted(RecordId),
    Updated(RecordId),
    /// Configuration was incomplete; the rest of the regeneration went on.
    Failed(String),
}

/// A piece whose formula could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaFailure {
    pub piece_id: RecordId,
    pub nomenclature_id: RecordId,
    pub message: String,
}

/// Summary of one length computation.
#[derive(Debug, Clone)]
pub struct LengthReport {
    pub bay_id: RecordId,
    /// Lengths set by the neighbour-resolution engine
    pub by_engine: usize,
    /// Lengths set by a nomenclature formula
    pub by_formula: usize,
    /// Pieces left without a length
    pub unresolved: usize,
    pub formula_failures: Vec<FormulaFailure>,
    pub duration_ms: u64,
}

/// Summary of one regeneration.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub bay_id: RecordId,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Pieces removed by the reset
    pub deleted_pieces: usize,
    pub frame_pieces: usize,
    pub top_transom_segments: usize,
    /// Nomenclature lines skipped for data-integrity problems
    pub skipped_lines: usize,
    pub imposte: ImposteOutcome,
    pub mullion_pieces: usize,
    pub transom_pieces: usize,
    pub bead_pieces: usize,
    pub cells: usize,
    pub warnings: Vec<String>,
    pub lengths: LengthReport,
}

impl GenerationReport {
    pub fn total_pieces(&self) -> usize {
        self.frame_pieces + self.mullion_pieces + self.transom_pieces + self.bead_pieces
    }
}

/// Runs regeneration and length computation against a record store.
pub struct Regenerator {
    store: Arc<dyn RecordStore>,
    config: BaycutConfig,
}

impl Regenerator {
    pub fn new(store: Arc<dyn RecordStore>, config: BaycutConfig) -> Self {
        Self { store, config }
    }

    /// Regenerator over the sled store named by `config.store`.
    pub fn open(config: BaycutConfig) -> Result<Self, ChassisError> {
        let store = SledRecordStore::from_config(&config.store)?;
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    fn chunk_size(&self) -> usize {
        self.config.store.write_chunk_size
    }

    /// Load the bay and its model and build a validated frame context.
    pub async fn load_inputs(&self, bay_id: &RecordId) -> Result<BayInputs, ChassisError> {
        let bay: BayRecord = fetch(self.store(), bay_id).await?;
        let model_id = bay
            .model_id
            .clone()
            .ok_or_else(|| ChassisError::ConfigError(format!("Bay {} has no model", bay_id)))?;
        let model: BayModelRecord = match fetch(self.store(), &model_id).await {
            Ok(model) => model,
            Err(StorageError::NotFound { .. }) => {
                return Err(ChassisError::ConfigError(format!(
                    "Bay {} refers to missing model {}",
                    bay_id, model_id
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let (width, height) = match (bay.width, bay.height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(ChassisError::ConfigError(format!(
                    "Bay {} is missing its width or height",
                    bay_id
                )))
            }
        };
        let context = FrameContext {
            bay_width: width,
            bay_height: height,
            fixed_left_width: bay.fixed_left_width.unwrap_or(0.0),
            fixed_right_width: bay.fixed_right_width.unwrap_or(0.0),
            passage_width: bay.passage_width.unwrap_or(0.0),
            passage_height: bay.passage_height,
            mullions_through: bay.mullions_through,
            has_imposte: model.has_imposte,
            tolerance: self.config.generation.tolerance,
        };
        context.validate()?;

        Ok(BayInputs {
            bay_id: bay_id.clone(),
            bay,
            model_id,
            model,
            context,
        })
    }

    /// Delete every generated piece of the bay.
    pub async fn reset(&self, bay_id: &RecordId) -> Result<usize, ChassisError> {
        let deleted = delete_matching(
            self.store(),
            EntityKind::GeneratedPiece,
            &Filter::eq("bay_id", bay_id.as_str()),
            self.chunk_size(),
        )
        .await?;
        info!(bay = %bay_id, deleted, "Reset generated pieces");
        Ok(deleted)
    }

    /// Full regeneration of one bay.
    ///
    /// Configuration problems with the bay, its model or its bead material
    /// are reported before the gate is asked, so nothing is mutated. A
    /// declined gate returns [`ChassisError::Cancelled`], also before any
    /// mutation.
    pub async fn regenerate(
        &self,
        bay_id: &RecordId,
        gate: &dyn ConfirmationGate,
    ) -> Result<GenerationReport, ChassisError> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        let inputs = self.load_inputs(bay_id).await?;
        let bead_material = inputs.bay.bead_material_id.clone().ok_or_else(|| {
            ChassisError::ConfigError(format!("Bay {} has no bead material", bay_id))
        })?;

        let prompt = format!(
            "Delete all generated pieces of bay {} and regenerate them?",
            bay_id
        );
        if !gate.confirm(&prompt)? {
            info!(bay = %bay_id, "Regeneration cancelled");
            return Err(ChassisError::Cancelled);
        }

        let deleted_pieces = self.reset(bay_id).await?;
        let ctx = &inputs.context;
        let mut warnings = Vec::new();

        // Frame
        let nomenclature: Vec<(RecordId, NomenclatureRecord)> = fetch_all(
            self.store(),
            &Filter::eq("model_id", inputs.model_id.as_str()),
        )
        .await?;
        let (lines, skipped_lines) = ingest_lines(nomenclature);
        if skipped_lines > 0 {
            warnings.push(format!("{} nomenclature line(s) skipped", skipped_lines));
        }
        let frame = generate_frame(ctx, &lines);
        let frame_pieces = self.write_pieces(bay_id, &frame.pieces).await?;
        info!(
            bay = %bay_id,
            pieces = frame_pieces,
            skipped_lines,
            top_transom_segments = frame.top_transom_segments,
            "Frame pass complete"
        );

        // Imposte
        let imposte = self.inject_imposte(&inputs, &mut warnings).await?;

        // Intermediate members
        let members: Vec<Member> = self
            .load_members(bay_id)
            .await?
            .into_iter()
            .map(|(id, record)| Member::from_record(id, &record))
            .collect();
        let mullions = materialize_members(ctx, &members, &frame.mullions);
        let mullion_pieces = self.write_pieces(bay_id, &mullions.pieces).await?;
        info!(bay = %bay_id, pieces = mullion_pieces, "Intermediate pass complete");

        // Transoms
        let transoms = segment_transoms(ctx, &members, &mullions);
        let transom_pieces = self.write_pieces(bay_id, &transoms).await?;
        info!(bay = %bay_id, pieces = transom_pieces, "Transom pass complete");

        // Glazing
        let glazing = generate_cells(
            ctx,
            &transom_heights(&members),
            &mullions.cross_zone,
            &bead_material,
        );
        let bead_pieces = self.write_pieces(bay_id, &glazing.pieces).await?;
        info!(
            bay = %bay_id,
            pieces = bead_pieces,
            cells = glazing.cells,
            bands = glazing.bands,
            "Glazing pass complete"
        );

        let lengths = self.compute_lengths_for(&inputs).await?;

        let report = GenerationReport {
            bay_id: bay_id.clone(),
            started_at,
            duration_ms: start_time.elapsed().as_millis() as u64,
            deleted_pieces,
            frame_pieces,
            top_transom_segments: frame.top_transom_segments,
            skipped_lines,
            imposte,
            mullion_pieces,
            transom_pieces,
            bead_pieces,
            cells: glazing.cells,
            warnings,
            lengths,
        };
        info!(
            bay = %bay_id,
            pieces = report.total_pieces(),
            duration_ms = report.duration_ms,
            "Regeneration complete"
        );
        Ok(report)
    }

    async fn load_members(
        &self,
        bay_id: &RecordId,
    ) -> Result<Vec<(RecordId, MemberRecord)>, ChassisError> {
        Ok(fetch_all(self.store(), &Filter::eq("bay_id", bay_id.as_str())).await?)
    }

    /// Insert or update the passage-height transom. Configuration problems
    /// only abort this step.
    async fn inject_imposte(
        &self,
        inputs: &BayInputs,
        warnings: &mut Vec<String>,
    ) -> Result<ImposteOutcome, ChassisError> {
        let existing = self.load_members(&inputs.bay_id).await?;
        let action = match plan_imposte(&inputs.context, &inputs.model, &inputs.bay_id, &existing)
        {
            Ok(Some(action)) => action,
            Ok(None) => return Ok(ImposteOutcome::NotRequired),
            Err(ChassisError::ConfigError(message)) => {
                warn!(bay = %inputs.bay_id, error = %message, "Imposte injection skipped");
                warnings.push(format!("Imposte not injected: {}", message));
                return Ok(ImposteOutcome::Failed(message));
            }
            Err(e) => return Err(e),
        };

        let outcome = match action {
            ImposteAction::Insert(record) => {
                ImposteOutcome::Inserted(insert(self.store(), &record).await?)
            }
            ImposteAction::Update { id, record } => {
                self.store()
                    .update(EntityKind::Member, &id, encode(&record)?)
                    .await?;
                ImposteOutcome::Updated(id)
            }
        };
        info!(bay = %inputs.bay_id, outcome = ?outcome, "Imposte injection complete");
        Ok(outcome)
    }

    async fn write_pieces(
        &self,
        bay_id: &RecordId,
        pieces: &[GeneratedPiece],
    ) -> Result<usize, ChassisError> {
        let records = pieces
            .iter()
            .map(|piece| encode(&piece.to_record(bay_id)))
            .collect::<Result<Vec<Fields>, _>>()?;
        let ids = create_all(
            self.store(),
            EntityKind::GeneratedPiece,
            records,
            self.chunk_size(),
        )
        .await?;
        Ok(ids.len())
    }

    /// Compute and store the cut length of every generated piece of the bay.
    /// Repeatable without regenerating geometry.
    pub async fn compute_lengths(&self, bay_id: &RecordId) -> Result<LengthReport, ChassisError> {
        let inputs = self.load_inputs(bay_id).await?;
        self.compute_lengths_for(&inputs).await
    }

    async fn compute_lengths_for(&self, inputs: &BayInputs) -> Result<LengthReport, ChassisError> {
        let start_time = Instant::now();
        let bay_id = &inputs.bay_id;
        let ctx = &inputs.context;

        let records: Vec<(RecordId, PieceRecord)> =
            fetch_all(self.store(), &Filter::eq("bay_id", bay_id.as_str())).await?;
        let (ids, pieces): (Vec<RecordId>, Vec<GeneratedPiece>) = records
            .into_iter()
            .map(|(id, record)| (id, GeneratedPiece::from_record(record)))
            .unzip();

        let materials: BTreeSet<&RecordId> =
            pieces.iter().filter_map(|p| p.material.as_ref()).collect();
        let mut cache = ThicknessCache::new();
        cache.preload(self.store(), materials).await?;
        debug!(bay = %bay_id, materials = cache.len(), "Thickness cache loaded");

        let engine = CutLengthEngine::new(
            ctx,
            EngineSettings::from(&self.config.generation),
            &cache,
        );
        let mut lengths = engine.compute(&pieces);
        let by_engine = lengths.iter().filter(|l| l.is_some()).count();

        // Formula fallback for what the engine does not cover.
        let formulas: HashMap<RecordId, String> = fetch_all::<NomenclatureRecord>(
            self.store(),
            &Filter::eq("model_id", inputs.model_id.as_str()),
        )
        .await?
        .into_iter()
        .filter_map(|(id, line)| line.formula.map(|f| (id, f)))
        .filter(|(_, f)| !f.trim().is_empty())
        .collect();

        let mut label_thickness: HashMap<String, Thickness> = HashMap::new();
        for piece in &pieces {
            if let (Some(label), Some(material)) = (&piece.position_label, &piece.material) {
                if let Some(thickness) = cache.thickness(material) {
                    label_thickness
                        .entry(normalize_label(label))
                        .or_insert(thickness);
                }
            }
        }
        let env = VariableEnv::new(context_variables(ctx), |label: &str| {
            label_thickness.get(label).copied()
        });

        let mut by_formula = 0usize;
        let mut formula_failures = Vec::new();
        for ((id, piece), length) in ids.iter().zip(&pieces).zip(lengths.iter_mut()) {
            if length.is_some() {
                continue;
            }
            let Some(line) = &piece.nomenclature_id else { continue };
            let Some(source) = formulas.get(line) else { continue };
            match Formula::parse(source).and_then(|f| f.cut_length(&env)) {
                Ok(value) => {
                    *length = Some(value);
                    by_formula += 1;
                }
                Err(e) => {
                    let message = ChassisError::from(e).to_string();
                    warn!(piece = %id, formula = %source, error = %message, "Formula evaluation failed");
                    formula_failures.push(FormulaFailure {
                        piece_id: id.clone(),
                        nomenclature_id: line.clone(),
                        message,
                    });
                }
            }
        }

        let updates: Vec<(RecordId, Fields)> = ids
            .iter()
            .zip(&lengths)
            .filter_map(|(id, length)| {
                length.map(|value| {
                    let mut fields = Fields::new();
                    fields.insert("cut_length".to_string(), Value::from(value));
                    (id.clone(), fields)
                })
            })
            .collect();
        update_all(
            self.store(),
            EntityKind::GeneratedPiece,
            updates,
            self.chunk_size(),
        )
        .await?;

        let report = LengthReport {
            bay_id: bay_id.clone(),
            by_engine,
            by_formula,
            unresolved: lengths.iter().filter(|l| l.is_none()).count(),
            formula_failures,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        info!(
            bay = %bay_id,
            by_engine = report.by_engine,
            by_formula = report.by_formula,
            unresolved = report.unresolved,
            failures = report.formula_failures.len(),
            "Cut lengths computed"
        );
        Ok(report)
    }
}
