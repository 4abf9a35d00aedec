//! Resolution of one reference field onto the duplicated object graph.
//!
//! Main objects are addressed by their file path, so they map file to file. Sub-objects
//! have no durable identity and are matched in tiers, stopping at the first tier that
//! leaves exactly one candidate:
//! 1. same type and name
//! 2. same `/`-joined name path below the main object
//! 3. same sibling-index chain (tree nodes) or owner chain plus ordinal (attachments)
//!
//! Opaque objects stop after tier 2 with a warning instead of guessing.

use std::collections::HashMap;
use std::rc::Rc;

use super::classify::SelectionScope;
use super::destination::DestinationResolver;
use super::error::DeepCopyError;
use super::types::{CopyPair, RemapWarning, ResolutionTier};
use super::walker::FieldHandle;
use crate::store::{AssetPath, AssetStore, GraphObject, LocalId, ObjectGraph, ObjectKind, ObjectRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Empty field or target outside the selection.
    Skipped,
    Resolved(ObjectRef),
    /// Field keeps its value.
    Unresolved(RemapWarning),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubObjectMatch {
    Unique(LocalId),
    /// Opaque type with several candidates left after the name tiers.
    Ambiguous { candidates: usize },
}

#[derive(Clone)]
enum Loaded {
    Graph(Rc<ObjectGraph>),
    Plain,
    Missing(String),
}

pub struct ReferenceResolver<'a, S: AssetStore + ?Sized> {
    store: &'a S,
    scope: &'a SelectionScope,
    destinations: DestinationResolver<'a>,
    loaded: HashMap<AssetPath, Loaded>,
}

impl<'a, S: AssetStore + ?Sized> ReferenceResolver<'a, S> {
    pub fn new(store: &'a S, scope: &'a SelectionScope, pairs: &'a [CopyPair]) -> Self {
        Self {
            store,
            scope,
            destinations: DestinationResolver::new(scope, pairs),
            loaded: HashMap::new(),
        }
    }

    /// Decides the new value of one field of a file produced by `current`.
    pub fn resolve(&mut self, current: &CopyPair, handle: &FieldHandle<'_>) -> Result<Resolution, DeepCopyError> {
        let Some(target) = handle.current_value() else {
            return Ok(Resolution::Skipped);
        };
        if !self.scope.contains(&target.path) {
            return Ok(Resolution::Skipped);
        }

        let unresolved = |destination: Option<AssetPath>| {
            Resolution::Unresolved(RemapWarning::UnresolvedDestination {
                file: handle.file.clone(),
                field: handle.field.name.clone(),
                target: target.clone(),
                destination,
            })
        };
        let dangling = || {
            Resolution::Unresolved(RemapWarning::DanglingReference {
                file: handle.file.clone(),
                field: handle.field.name.clone(),
                target: target.clone(),
            })
        };

        let Some(destination_path) = self.destinations.resolve(current, &target.path) else {
            return Ok(unresolved(None));
        };

        let destination = match self.load(&destination_path) {
            Loaded::Missing(reason) => {
                log::debug!("No object at {destination_path}: {reason}");
                return Ok(unresolved(Some(destination_path)));
            }
            loaded => loaded,
        };
        let source = match self.load(&target.path) {
            Loaded::Missing(_) => return Ok(dangling()),
            loaded => loaded,
        };

        let (source, destination) = match (source, destination) {
            (Loaded::Graph(source), Loaded::Graph(destination)) => (source, destination),
            (Loaded::Plain, Loaded::Graph(destination)) => {
                return Ok(Resolution::Resolved(ObjectRef {
                    path: destination_path,
                    id: destination.main_id(),
                }));
            }
            (Loaded::Plain, _) => {
                return Ok(Resolution::Resolved(ObjectRef {
                    path: destination_path,
                    id: target.id,
                }));
            }
            _ => return Ok(unresolved(Some(destination_path))),
        };

        let Some(object) = source.get(target.id) else {
            return Ok(dangling());
        };

        if source.is_main(target.id) {
            return Ok(Resolution::Resolved(ObjectRef {
                path: destination_path,
                id: destination.main_id(),
            }));
        }

        match match_sub_object(target, &source, object, &destination)? {
            SubObjectMatch::Unique(id) => Ok(Resolution::Resolved(ObjectRef {
                path: destination_path,
                id,
            })),
            SubObjectMatch::Ambiguous { candidates } => {
                Ok(Resolution::Unresolved(RemapWarning::AmbiguousReferenceType {
                    file: handle.file.clone(),
                    field: handle.field.name.clone(),
                    target: target.clone(),
                    type_name: object.type_name.clone(),
                    candidates,
                }))
            }
        }
    }

    fn load(&mut self, path: &AssetPath) -> Loaded {
        if let Some(loaded) = self.loaded.get(path) {
            return loaded.clone();
        }
        let loaded = match self.store.load_object_graph(path) {
            Ok(Some(graph)) => Loaded::Graph(Rc::new(graph)),
            Ok(None) => Loaded::Plain,
            Err(e) => Loaded::Missing(e.to_string()),
        };
        self.loaded.insert(path.clone(), loaded.clone());
        loaded
    }
}

/// Finds the counterpart of sub-object `object` (of `source`) among the sub-objects
/// of `destination`.
pub fn match_sub_object(
    target: &ObjectRef,
    source: &ObjectGraph,
    object: &GraphObject,
    destination: &ObjectGraph,
) -> Result<SubObjectMatch, DeepCopyError> {
    let diverged = |tier: ResolutionTier, matches: usize| DeepCopyError::StructuralDivergence {
        file: destination.path().clone(),
        target: target.clone(),
        type_name: object.type_name.clone(),
        name: object.name.clone(),
        tier,
        matches,
    };

    let name_matches: Vec<&GraphObject> = destination
        .sub_objects()
        .filter(|candidate| candidate.type_name == object.type_name && candidate.name == object.name)
        .collect();
    match name_matches.len() {
        0 => return Err(diverged(ResolutionTier::Name, 0)),
        1 => return Ok(SubObjectMatch::Unique(name_matches[0].id)),
        _ => {}
    }

    let full_name = source.full_name(object.id);
    let full_name_matches: Vec<&GraphObject> = name_matches
        .into_iter()
        .filter(|candidate| destination.full_name(candidate.id) == full_name)
        .collect();
    match full_name_matches.len() {
        0 => return Err(diverged(ResolutionTier::FullName, 0)),
        1 => return Ok(SubObjectMatch::Unique(full_name_matches[0].id)),
        _ => {}
    }

    if object.kind == ObjectKind::Opaque {
        return Ok(SubObjectMatch::Ambiguous {
            candidates: full_name_matches.len(),
        });
    }

    let signature = source
        .positional_signature(object.id)
        .ok_or_else(|| diverged(ResolutionTier::Position, 0))?;
    let positional: Vec<&GraphObject> = full_name_matches
        .into_iter()
        .filter(|candidate| destination.positional_signature(candidate.id).as_ref() == Some(&signature))
        .collect();
    match positional.as_slice() {
        [only] => Ok(SubObjectMatch::Unique(only.id)),
        others => Err(diverged(ResolutionTier::Position, others.len())),
    }
}
