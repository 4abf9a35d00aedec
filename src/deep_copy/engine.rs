use std::collections::BTreeMap;
use std::sync::Arc;

use super::classify::SelectionScope;
use super::duplicate::duplicate_selection;
use super::error::DeepCopyError;
use super::resolver::{ReferenceResolver, Resolution};
use super::types::{
    CopyPair, DeepCopyOptions, DeepCopyPhase, DeepCopyProgress, DeepCopyReport, RemapPlan, RemapWarning,
    StagedWrite,
};
use super::walker::{destination_files, field_handles, ShallowMatcher};
use crate::logging::LogManager;
use crate::path_validation::validate_asset_path;
use crate::store::{AssetPath, AssetStore, FieldWrite};

pub struct DeepCopyEngine {
    options: DeepCopyOptions,
    shallow: ShallowMatcher,
    log: Arc<LogManager>,
}

fn emit(
    progress: &impl Fn(DeepCopyProgress),
    phase: DeepCopyPhase,
    processed: usize,
    total: usize,
    current: Option<&AssetPath>,
) {
    progress(DeepCopyProgress {
        phase,
        processed: processed as u64,
        total: total as u64,
        current_path: current.map(|p| p.to_string()),
    });
}

impl DeepCopyEngine {
    pub fn new(options: DeepCopyOptions) -> Result<Self, DeepCopyError> {
        let shallow = ShallowMatcher::new(&options.shallow_patterns)?;
        Ok(Self {
            options,
            shallow,
            log: Arc::new(LogManager::default()),
        })
    }

    /// Records into a shared log instead of the engine's own.
    pub fn with_log_manager(mut self, log: Arc<LogManager>) -> Self {
        self.log = log;
        self
    }

    pub fn options(&self) -> &DeepCopyOptions {
        &self.options
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.log
    }

    /// Duplicates `selection` and rewires every in-scope reference inside the copies
    /// onto the copies.
    ///
    /// Copies are made before anything is resolved and stay in the store when the
    /// operation later fails with a structural divergence.
    pub fn run<S: AssetStore + ?Sized>(
        &self,
        store: &mut S,
        selection: &[AssetPath],
        progress: impl Fn(DeepCopyProgress),
    ) -> Result<DeepCopyReport, DeepCopyError> {
        self.check_selection(&*store, selection)?;

        store.refresh()?;

        emit(&progress, DeepCopyPhase::Classifying, 0, selection.len(), None);
        let scope = SelectionScope::classify(&*store, selection);
        self.log.info(
            &format!(
                "Duplicating {} folder(s) and {} file(s)",
                scope.folders().len(),
                scope.files().len()
            ),
            None,
        );

        let total = selection.len();
        let outcome = duplicate_selection(store, selection, |idx, path| {
            emit(&progress, DeepCopyPhase::Duplicating, idx, total, Some(path));
        });
        let mut warnings = Vec::new();
        for failure in outcome.failures {
            self.record_warning(&failure);
            warnings.push(failure);
        }

        emit(&progress, DeepCopyPhase::Resyncing, 0, 0, None);
        store.refresh()?;

        let plan = match self.plan_remap(&*store, &scope, &outcome.pairs, &progress) {
            Ok(plan) => plan,
            Err(e) => {
                let path = match &e {
                    DeepCopyError::StructuralDivergence { file, .. } => Some(file),
                    _ => None,
                };
                self.log.error(&e.to_string(), path);
                return Err(e);
            }
        };

        let rewritten_fields = self.commit(store, &plan, &progress)?;
        warnings.extend(plan.warnings);

        let new_selection = outcome.pairs.iter().map(|p| p.destination.clone()).collect();
        self.log.info(
            &format!(
                "Deep copy finished: {} copies, {} references rewritten, {} warning(s)",
                outcome.pairs.len(),
                rewritten_fields,
                warnings.len()
            ),
            None,
        );

        Ok(DeepCopyReport {
            pairs: outcome.pairs,
            new_selection,
            rewritten_fields,
            walked_files: plan.walked_files,
            warnings,
        })
    }

    fn check_selection<S: AssetStore + ?Sized>(&self, store: &S, selection: &[AssetPath]) -> Result<(), DeepCopyError> {
        if selection.is_empty() {
            return Err(DeepCopyError::SelectionEmpty);
        }
        for path in selection {
            validate_asset_path(path.as_str()).map_err(DeepCopyError::InvalidInput)?;
            if self.options.validate_selection && !store.contains(path) {
                return Err(DeepCopyError::NotInStore(path.clone()));
            }
        }
        Ok(())
    }

    /// Walks every duplicated file and decides the new value of each in-scope
    /// reference. Nothing is written.
    pub fn plan_remap<S: AssetStore + ?Sized>(
        &self,
        store: &S,
        scope: &SelectionScope,
        pairs: &[CopyPair],
        progress: impl Fn(DeepCopyProgress),
    ) -> Result<RemapPlan, DeepCopyError> {
        let mut plan = RemapPlan::default();

        let mut files: Vec<(&CopyPair, AssetPath)> = Vec::new();
        for pair in pairs {
            let is_folder_copy = scope.is_selected_folder(&pair.source);
            match destination_files(store, pair, is_folder_copy) {
                Ok(paths) => files.extend(paths.into_iter().map(|path| (pair, path))),
                Err(e) => self.warn(
                    &mut plan.warnings,
                    RemapWarning::UnloadableFile {
                        path: pair.destination.clone(),
                        reason: e.to_string(),
                    },
                ),
            }
        }

        let mut resolver = ReferenceResolver::new(store, scope, pairs);
        let total = files.len();

        for (idx, (pair, file)) in files.iter().enumerate() {
            emit(&progress, DeepCopyPhase::Remapping, idx, total, Some(file));

            if self.shallow.is_shallow(file) {
                self.warn(&mut plan.warnings, RemapWarning::ShallowCopy { path: file.clone() });
                continue;
            }

            let graph = match store.load_object_graph(file) {
                Ok(Some(graph)) => graph,
                Ok(None) => continue,
                Err(e) => {
                    self.warn(
                        &mut plan.warnings,
                        RemapWarning::UnloadableFile {
                            path: file.clone(),
                            reason: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            if !graph.broken().is_empty() {
                self.log.warn(
                    &format!("Skipped {} broken object(s)", graph.broken().len()),
                    Some(file),
                );
            }

            plan.walked_files += 1;
            for handle in field_handles(&graph) {
                plan.visited_fields += 1;
                match resolver.resolve(pair, &handle)? {
                    Resolution::Skipped => {}
                    Resolution::Resolved(value) => {
                        let Some(previous) = handle.current_value() else {
                            continue;
                        };
                        plan.writes.push(StagedWrite {
                            file: file.clone(),
                            object: handle.object.id,
                            field_index: handle.field_index,
                            field_name: handle.field.name.clone(),
                            previous: previous.clone(),
                            value,
                        });
                    }
                    Resolution::Unresolved(warning) => self.warn(&mut plan.warnings, warning),
                }
            }
        }

        log::debug!(
            "Planned {} write(s) over {} file(s), {} field(s) visited",
            plan.writes.len(),
            plan.walked_files,
            plan.visited_fields
        );
        Ok(plan)
    }

    /// Writes every staged reference back, then persists the store when configured
    /// to. Returns the number of rewritten fields.
    pub fn commit<S: AssetStore + ?Sized>(
        &self,
        store: &mut S,
        plan: &RemapPlan,
        progress: impl Fn(DeepCopyProgress),
    ) -> Result<usize, DeepCopyError> {
        let mut by_file: BTreeMap<&AssetPath, Vec<FieldWrite>> = BTreeMap::new();
        for write in &plan.writes {
            by_file.entry(&write.file).or_default().push(write.to_field_write());
        }

        let total = by_file.len();
        for (idx, (file, writes)) in by_file.into_iter().enumerate() {
            emit(&progress, DeepCopyPhase::Committing, idx, total, Some(file));
            store.write_fields(file, &writes)?;
        }

        if self.options.persist {
            store.persist()?;
        }

        Ok(plan.writes.len())
    }

    fn record_warning(&self, warning: &RemapWarning) {
        self.log.warn(&warning.to_string(), Some(warning.path()));
    }

    fn warn(&self, warnings: &mut Vec<RemapWarning>, warning: RemapWarning) {
        self.record_warning(&warning);
        warnings.push(warning);
    }
}
