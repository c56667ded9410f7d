//! Material thickness cache.
//!
//! Read-through cache over material products, created for one generation or
//! length-computation pass and dropped with it. The engine itself only sees
//! the synchronous [`ThicknessSource`] view, so every product it needs is
//! resolved before the engine runs.

use crate::error::StorageError;
use crate::store::records::MaterialRecord;
use crate::store::{fetch, RecordStore};
use crate::types::RecordId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Face thicknesses of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thickness {
    /// Bead-facing face.
    pub interior: f64,
    pub exterior: f64,
}

impl Thickness {
    pub const ZERO: Thickness = Thickness {
        interior: 0.0,
        exterior: 0.0,
    };

    pub fn new(interior: f64, exterior: f64) -> Self {
        Thickness {
            interior,
            exterior,
        }
    }
}

impl From<&MaterialRecord> for Thickness {
    fn from(record: &MaterialRecord) -> Self {
        Thickness::new(record.interior_thickness, record.exterior_thickness)
    }
}

/// Synchronous thickness lookup by material id.
pub trait ThicknessSource {
    fn thickness(&self, material: &RecordId) -> Option<Thickness>;
}

#[derive(Debug, Default)]
pub struct ThicknessCache {
    entries: HashMap<RecordId, Thickness>,
    missing: HashSet<RecordId>,
}

impl ThicknessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-filled from known products.
    pub fn from_products(products: impl IntoIterator<Item = (RecordId, Thickness)>) -> Self {
        Self {
            entries: products.into_iter().collect(),
            missing: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached thickness, loading the product on first use. A product that
    /// does not exist resolves to zero and is only looked up once.
    pub async fn resolve(
        &mut self,
        store: &dyn RecordStore,
        material: &RecordId,
    ) -> Result<Thickness, StorageError> {
        if let Some(thickness) = self.entries.get(material) {
            return Ok(*thickness);
        }
        if self.missing.contains(material) {
            return Ok(Thickness::ZERO);
        }
        match fetch::<MaterialRecord>(store, material).await {
            Ok(record) => {
                let thickness = Thickness::from(&record);
                debug!(material = %material, ?thickness, "Loaded material thickness");
                self.entries.insert(material.clone(), thickness);
                Ok(thickness)
            }
            Err(StorageError::NotFound { .. }) => {
                warn!(material = %material, "Material product not found, using zero thickness");
                self.missing.insert(material.clone());
                Ok(Thickness::ZERO)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve every listed material.
    pub async fn preload<'a>(
        &mut self,
        store: &dyn RecordStore,
        materials: impl IntoIterator<Item = &'a RecordId>,
    ) -> Result<(), StorageError> {
        for material in materials {
            self.resolve(store, material).await?;
        }
        Ok(())
    }
}

impl ThicknessSource for ThicknessCache {
    fn thickness(&self, material: &RecordId) -> Option<Thickness> {
        self.entries.get(material).copied()
    }
}
