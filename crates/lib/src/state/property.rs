//! Property-state data and operations.
//!
//! A property state carries the property's values and an optional
//! definition slot. Unlike the node collections, values are plainly owned:
//! pulling or resetting a session property copies them outright.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::event::{Event, EventKind};
use crate::id::PropertyId;
use crate::name::QName;
use crate::nodetype::PropertyDefinition;
use crate::path::Path;
use crate::state::errors::StateError;
use crate::state::item::{ItemKind, ItemState, Layer, PropertySlot};
use crate::state::status::Status;

/// One property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Name(QName),
    Path(Path),
    Reference(Uuid),
    Binary(Vec<u8>),
}

/// The mutable payload of a property state, guarded by the per-state
/// monitor.
#[derive(Debug, Clone)]
pub(super) struct PropertyData {
    pub(super) id: PropertyId,
    pub(super) values: Vec<PropertyValue>,
    pub(super) definition: Option<Arc<PropertyDefinition>>,
}

impl ItemState {
    /// Creates an unconnected property state. The initial status must be
    /// NEW or EXISTING.
    pub fn new_property(
        layer: Layer,
        initial: Status,
        parent: Option<&Arc<ItemState>>,
        id: PropertyId,
    ) -> crate::Result<Arc<ItemState>> {
        ItemState::build(layer, initial, parent, move || {
            ItemKind::Property(PropertySlot {
                data: Mutex::new(PropertyData {
                    id,
                    values: Vec::new(),
                    definition: None,
                }),
            })
        })
    }

    /// Creates a session property state connected to (and pulled from) its
    /// workspace twin. The initial status must be EXISTING,
    /// EXISTING_MODIFIED or EXISTING_REMOVED.
    ///
    /// # Panics
    ///
    /// Panics when `overlayed` is a node state.
    pub fn overlay_property(
        overlayed: &Arc<ItemState>,
        initial: Status,
        parent: Option<&Arc<ItemState>>,
    ) -> crate::Result<Arc<ItemState>> {
        let seed = overlayed.property_slot().data.lock().unwrap().clone();
        ItemState::build_overlaying(overlayed, initial, parent, move || {
            ItemKind::Property(PropertySlot {
                data: Mutex::new(seed),
            })
        })
    }

    pub(super) fn property_slot(&self) -> &PropertySlot {
        match &self.kind {
            ItemKind::Property(slot) => slot,
            ItemKind::Node(_) => panic!("not a property state"),
        }
    }

    /// Returns the id of this property.
    ///
    /// # Panics
    ///
    /// Panics on a node state, as do all property-only operations below.
    pub fn property_id(&self) -> PropertyId {
        self.property_slot().data.lock().unwrap().id.clone()
    }

    /// Returns the values of this property.
    pub fn values(&self) -> Vec<PropertyValue> {
        self.property_slot().data.lock().unwrap().values.clone()
    }

    /// Returns the first value of this property, if any.
    pub fn value(&self) -> Option<PropertyValue> {
        self.property_slot()
            .data
            .lock()
            .unwrap()
            .values
            .first()
            .cloned()
    }

    /// Replaces the values of this property. Transient-change bookkeeping
    /// is the caller's concern (`mark_modified`).
    pub fn set_values(&self, values: Vec<PropertyValue>) {
        self.property_slot().data.lock().unwrap().values = values;
    }

    /// Returns the definition applicable to this property, if the resolver
    /// has attached one.
    pub fn property_definition(&self) -> Option<Arc<PropertyDefinition>> {
        self.property_slot().data.lock().unwrap().definition.clone()
    }

    /// Attaches the definition applicable to this property.
    pub fn set_property_definition(&self, definition: Arc<PropertyDefinition>) {
        self.property_slot().data.lock().unwrap().definition = Some(definition);
    }

    pub(super) fn refresh_property_external(
        self: &Arc<Self>,
        event: &Event,
    ) -> crate::Result<()> {
        match event.kind() {
            EventKind::PropertyChanged => self.set_status(Status::Modified),
            EventKind::PropertyRemoved => self.set_status(Status::Removed),
            kind => Err(StateError::UnexpectedEvent { kind }.into()),
        }
    }
}
