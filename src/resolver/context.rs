use crate::error::{GenerateError, Result};
use crate::metadata::ReferenceType;
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

/// Work left for the end of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// A handle was handed out while its type was still being resolved; the
    /// table must hold the type once every controller is built.
    ForwardReference { ref_name: String },
}

/// Per-run state of type resolution.
///
/// Holds the reference table, the names currently being resolved and the
/// deferred checks. A fresh context is created for every generation run, so
/// nothing leaks between runs.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    reference_types: BTreeMap<String, Rc<ReferenceType>>,
    /// Declaration location that produced each reference name
    origins: HashMap<String, String>,
    in_progress: HashSet<String>,
    deferred: Vec<Deferred>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that `ref_name` is not already claimed by another declaration.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::DuplicateReferenceName`] when the name was first
    /// produced by a declaration at a different location.
    pub fn claim(&mut self, ref_name: &str, origin: &str) -> Result<()> {
        match self.origins.get(ref_name) {
            Some(first) if first != origin => Err(GenerateError::DuplicateReferenceName {
                name: ref_name.to_string(),
                first: first.clone(),
                second: origin.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.origins.insert(ref_name.to_string(), origin.to_string());
                Ok(())
            }
        }
    }

    /// A completed reference type.
    pub fn reference(&self, ref_name: &str) -> Option<Rc<ReferenceType>> {
        self.reference_types.get(ref_name).cloned()
    }

    pub fn is_in_progress(&self, ref_name: &str) -> bool {
        self.in_progress.contains(ref_name)
    }

    /// Number of reference types currently being resolved.
    pub fn depth(&self) -> usize {
        self.in_progress.len()
    }

    pub fn begin(&mut self, ref_name: &str) {
        debug!("Resolving reference type {}", ref_name);
        self.in_progress.insert(ref_name.to_string());
    }

    /// Drops the in-progress mark of a resolution that failed.
    pub fn abandon(&mut self, ref_name: &str) {
        self.in_progress.remove(ref_name);
    }

    /// Stores a completed reference type and clears its in-progress mark.
    pub fn complete(&mut self, reference: ReferenceType) -> Rc<ReferenceType> {
        let ref_name = reference.ref_name.clone();
        self.in_progress.remove(&ref_name);
        let reference = Rc::new(reference);
        self.reference_types.insert(ref_name, Rc::clone(&reference));
        reference
    }

    pub fn defer(&mut self, deferred: Deferred) {
        debug!("Deferring {:?}", deferred);
        self.deferred.push(deferred);
    }

    pub fn deferred(&self) -> &[Deferred] {
        &self.deferred
    }

    /// Drains the deferred list in registration order and hands out the
    /// finished reference table.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnfinishedReference`] if a forward reference
    /// points at a type that never completed.
    pub fn finish(mut self) -> Result<BTreeMap<String, ReferenceType>> {
        for deferred in std::mem::take(&mut self.deferred) {
            match deferred {
                Deferred::ForwardReference { ref_name } => {
                    if !self.reference_types.contains_key(&ref_name) {
                        return Err(GenerateError::UnfinishedReference(ref_name));
                    }
                }
            }
        }

        Ok(self
            .reference_types
            .into_iter()
            .map(|(name, reference)| {
                let reference = Rc::try_unwrap(reference).unwrap_or_else(|rc| (*rc).clone());
                (name, reference)
            })
            .collect())
    }
}
