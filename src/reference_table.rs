//! The reference table and deferred resolvers.
//!
//! Named object types are reserved as placeholders before their properties are
//! computed so that self-referencing and mutually-referencing models terminate.
//! Anything that needs a complete entry while it is still a placeholder is
//! queued as a [`DeferredResolver`] and run after the walk.

use crate::error::{bail_generate, Result};
use crate::metadata::{ObjectDefinition, ReferenceType};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Pending,
    Ready(ReferenceType),
}

/// Ordered name -> definition map with placeholder support.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: IndexMap<String, Slot>,
    /// Entries still waiting on queued inheritance, with the number of bases outstanding
    inheriting: HashMap<String, usize>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_pending(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Slot::Pending))
    }

    /// Ready and not waiting on any queued inheritance.
    pub fn is_complete(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Slot::Ready(_))) && !self.inheriting.contains_key(name)
    }

    /// Records that `name` has one more base whose properties arrive later.
    pub fn await_inheritance(&mut self, name: &str) {
        *self.inheriting.entry(name.to_string()).or_insert(0) += 1;
    }

    fn inheritance_done(&mut self, name: &str) {
        if let Some(outstanding) = self.inheriting.get_mut(name) {
            *outstanding -= 1;
            if *outstanding == 0 {
                self.inheriting.remove(name);
            }
        }
    }

    /// Reserves `name` as a placeholder. Keeps the original position if the
    /// name was already present.
    pub fn reserve(&mut self, name: &str) {
        self.entries
            .entry(name.to_string())
            .or_insert(Slot::Pending);
    }

    /// Fills (or registers) an entry under its `refName`.
    pub fn fill(&mut self, definition: ReferenceType) {
        let name = definition.ref_name().to_string();
        self.entries.insert(name, Slot::Ready(definition));
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceType> {
        match self.entries.get(name) {
            Some(Slot::Ready(definition)) => Some(definition),
            _ => None,
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectDefinition> {
        match self.get(name) {
            Some(ReferenceType::RefObject(object)) => Some(object),
            _ => None,
        }
    }

    fn object_mut(&mut self, name: &str) -> Option<&mut ObjectDefinition> {
        match self.entries.get_mut(name) {
            Some(Slot::Ready(ReferenceType::RefObject(object))) => Some(object),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the table into the document map. A leftover placeholder is an error.
    pub fn finalize(self) -> Result<IndexMap<String, ReferenceType>> {
        let mut map = IndexMap::with_capacity(self.entries.len());
        for (name, slot) in self.entries {
            match slot {
                Slot::Ready(definition) => {
                    map.insert(name, definition);
                }
                Slot::Pending => {
                    bail_generate!("Referenced type '{}' was never resolved", name)
                }
            }
        }
        Ok(map)
    }
}

/// Work that needs a complete table entry, run in FIFO order after the walk.
///
/// A base's own `InheritProperties` is always queued before that of any type
/// extending it, so FIFO order completes bases first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredResolver {
    /// `referrer` pointed at `ref_name` while it was still a placeholder.
    /// References are by name, so there is nothing to patch; running it only
    /// checks that the entry was completed.
    Link { ref_name: String, referrer: String },
    /// `target` extends `base`, which was a placeholder or still inheriting
    InheritProperties { target: String, base: String },
}

impl DeferredResolver {
    pub fn run(&self, table: &mut ReferenceTable) -> Result<()> {
        match self {
            DeferredResolver::Link { ref_name, referrer } => {
                if table.get(ref_name).is_none() {
                    bail_generate!(
                        "Circular reference to '{}' from '{}' could not be resolved",
                        ref_name,
                        referrer
                    );
                }
                debug!("Linked '{}' -> '{}'", referrer, ref_name);
                Ok(())
            }
            DeferredResolver::InheritProperties { target, base } => {
                let Some(base_definition) = table.object(base).cloned() else {
                    bail_generate!(
                        "Base type '{}' of '{}' could not be resolved",
                        base,
                        target
                    );
                };
                let Some(target_definition) = table.object_mut(target) else {
                    bail_generate!("Type '{}' could not be resolved", target);
                };
                merge_inherited(target_definition, &base_definition);
                table.inheritance_done(target);
                debug!("Inherited properties of '{}' into '{}'", base, target);
                Ok(())
            }
        }
    }
}

/// Appends the base's properties that the target does not redeclare.
pub fn merge_inherited(target: &mut ObjectDefinition, base: &ObjectDefinition) {
    for property in &base.properties {
        if !target.properties.iter().any(|p| p.name == property.name) {
            target.properties.push(property.clone());
        }
    }
    if target.additional_properties.is_none() {
        target.additional_properties = base.additional_properties.clone();
    }
}
