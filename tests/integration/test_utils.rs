//! Shared test utilities for integration tests
//!
//! Seeds a record store with a reference bay and isolates the config
//! environment for the loader tests.

use baycut::generation::MemberKind;
use baycut::store::records::{
    BayModelRecord, BayRecord, MaterialRecord, MemberRecord, NomenclatureRecord, PieceRecord,
};
use baycut::store::{fetch_all, insert, Filter, RecordStore};
use baycut::types::RecordId;
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ENV_VARS: [&str; 4] = ["HOME", "XDG_CONFIG_HOME", "BAYCUT_ENV", "BAYCUT__STORE__PAGE_SIZE"];

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            ENV_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointing into `test_dir`.
///
/// Holds a global lock for the duration so parallel tests never observe each
/// other's variables; the original environment is restored afterwards.
pub fn with_config_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());
    std::env::remove_var("BAYCUT_ENV");
    std::env::remove_var("BAYCUT__STORE__PAGE_SIZE");

    let result = f();

    env_state.restore();

    result
}

/// Profile products of the reference bay.
#[derive(Debug, Clone)]
pub struct Materials {
    pub frame: RecordId,
    pub mullion: RecordId,
    pub imposte: RecordId,
    pub filler: RecordId,
    pub bead: RecordId,
}

/// Variations on the reference bay.
#[derive(Debug, Clone)]
pub struct FixtureOptions {
    pub mullions_through: bool,
    pub imposte_material: bool,
    /// Adds a bay mullion at x=600 standing on the imposte.
    pub resting_mullion: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            mullions_through: false,
            imposte_material: true,
            resting_mullion: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeededBay {
    pub bay_id: RecordId,
    pub model_id: RecordId,
    pub materials: Materials,
}

async fn material(store: &dyn RecordStore, interior: f64, exterior: f64) -> RecordId {
    insert(
        store,
        &MaterialRecord {
            interior_thickness: interior,
            exterior_thickness: exterior,
        },
    )
    .await
    .unwrap()
}

fn line(
    model_id: &RecordId,
    position: &str,
    zone: &str,
    material: Option<&RecordId>,
    formula: Option<&str>,
    quantity: u32,
) -> NomenclatureRecord {
    NomenclatureRecord {
        model_id: model_id.clone(),
        position: position.to_string(),
        zone: zone.to_string(),
        cut_rule: Some("90/90".to_string()),
        quantity,
        material_id: material.cloned(),
        formula: formula.map(str::to_string),
    }
}

/// A 1200 x 2000 bay split 400 / 400 / 400 with a passage height of 1800.
///
/// Nomenclature: the four outer frame bars, the two fixed-zone mullions on
/// the passage, one passage filler, plus one line with an unknown zone and
/// one with zero quantity.
pub async fn seed_bay(store: &dyn RecordStore, options: &FixtureOptions) -> SeededBay {
    let materials = Materials {
        frame: material(store, 20.0, 40.0).await,
        mullion: material(store, 30.0, 50.0).await,
        imposte: material(store, 24.0, 60.0).await,
        filler: material(store, 12.0, 12.0).await,
        bead: material(store, 8.0, 8.0).await,
    };

    let model_id = insert(
        store,
        &BayModelRecord {
            has_imposte: true,
            imposte_material_id: options
                .imposte_material
                .then(|| materials.imposte.clone()),
        },
    )
    .await
    .unwrap();

    let rail_formula = "BAY_WIDTH";
    let jamb_formula = "BAY_HEIGHT - 2 * INTERIOR_THICKNESS(BAY_TRANSOM_TOP)";
    let post_formula = "PASSAGE_HEIGHT - interior_thickness('bay_transom_bottom')";
    let lines = [
        line(&model_id, "BAY_TRANSOM_TOP", "BAY", Some(&materials.frame), Some(rail_formula), 1),
        line(&model_id, "BAY_TRANSOM_BOTTOM", "BAY", Some(&materials.frame), Some(rail_formula), 1),
        line(&model_id, "BAY_MULLION_LEFT", "BAY", Some(&materials.frame), Some(jamb_formula), 1),
        line(&model_id, "BAY_MULLION_RIGHT", "BAY", Some(&materials.frame), Some(jamb_formula), 1),
        line(
            &model_id,
            "FIXED_LEFT_MULLION_RIGHT",
            "FIXED_LEFT",
            Some(&materials.mullion),
            Some(post_formula),
            1,
        ),
        line(
            &model_id,
            "FIXED_RIGHT_MULLION_LEFT",
            "FIXED_RIGHT",
            Some(&materials.mullion),
            Some(post_formula),
            1,
        ),
        line(&model_id, "PASSAGE_FILLER_LEFT", "PASSAGE", Some(&materials.filler), None, 1),
        line(&model_id, "ATTIC_TRANSOM_TOP", "ATTIC", Some(&materials.frame), None, 1),
        line(&model_id, "BAY_GASKET", "BAY", Some(&materials.frame), None, 0),
    ];
    for record in &lines {
        insert(store, record).await.unwrap();
    }

    let bay_id = insert(
        store,
        &BayRecord {
            model_id: Some(model_id.clone()),
            width: Some(1200.0),
            height: Some(2000.0),
            fixed_left_width: Some(400.0),
            fixed_right_width: Some(400.0),
            passage_width: Some(400.0),
            passage_height: Some(1800.0),
            mullions_through: options.mullions_through,
            bead_material_id: Some(materials.bead.clone()),
        },
    )
    .await
    .unwrap();

    if options.resting_mullion {
        insert(
            store,
            &MemberRecord {
                bay_id: bay_id.clone(),
                kind: MemberKind::Mullion,
                zone: "BAY".to_string(),
                position: 600.0,
                run_start: Some(1800.0),
                run_end: Some(2000.0),
                material_id: Some(materials.mullion.clone()),
            },
        )
        .await
        .unwrap();
    }

    SeededBay {
        bay_id,
        model_id,
        materials,
    }
}

/// Every generated piece of the bay, in store order.
pub async fn pieces_of(store: &dyn RecordStore, bay_id: &RecordId) -> Vec<PieceRecord> {
    fetch_all::<PieceRecord>(store, &Filter::eq("bay_id", bay_id.as_str()))
        .await
        .unwrap()
        .into_iter()
        .map(|(_, piece)| piece)
        .collect()
}

/// Every member record of the bay.
pub async fn members_of(store: &dyn RecordStore, bay_id: &RecordId) -> Vec<(RecordId, MemberRecord)> {
    fetch_all::<MemberRecord>(store, &Filter::eq("bay_id", bay_id.as_str()))
        .await
        .unwrap()
}

/// Pieces carrying `label`.
pub fn labelled<'a>(pieces: &'a [PieceRecord], label: &str) -> Vec<&'a PieceRecord> {
    pieces
        .iter()
        .filter(|p| p.position_label.as_deref() == Some(label))
        .collect()
}
