use std::ops::{Deref, DerefMut};

use super::types::{CopyPair, RemapWarning};
use crate::store::{AssetPath, AssetStore};

/// Keeps the store in batch mode for its lifetime; the batch is closed on drop,
/// including on early return.
pub struct BatchScope<'a, S: AssetStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: AssetStore + ?Sized> BatchScope<'a, S> {
    pub fn begin(store: &'a mut S) -> Self {
        store.begin_batch();
        Self { store }
    }
}

impl<S: AssetStore + ?Sized> Deref for BatchScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: AssetStore + ?Sized> DerefMut for BatchScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: AssetStore + ?Sized> Drop for BatchScope<'_, S> {
    fn drop(&mut self) {
        self.store.end_batch();
    }
}

#[derive(Debug, Clone, Default)]
pub struct DuplicationOutcome {
    /// One pair per successful copy, in selection order.
    pub pairs: Vec<CopyPair>,
    pub failures: Vec<RemapWarning>,
}

/// Copies every selected path next to itself under a fresh unique name.
///
/// A failing entry is reported and skipped; the rest of the batch still runs.
pub fn duplicate_selection<S: AssetStore + ?Sized>(
    store: &mut S,
    selection: &[AssetPath],
    mut on_item: impl FnMut(usize, &AssetPath),
) -> DuplicationOutcome {
    let mut outcome = DuplicationOutcome::default();
    let mut batch = BatchScope::begin(store);

    for (idx, source) in selection.iter().enumerate() {
        on_item(idx, source);

        let copied = batch
            .generate_unique_path(source)
            .and_then(|destination| batch.copy(source, &destination).map(|_| destination));

        match copied {
            Ok(destination) => {
                log::info!("Duplicated {source} -> {destination}");
                outcome.pairs.push(CopyPair {
                    source: source.clone(),
                    destination,
                });
            }
            Err(e) => {
                log::warn!("Failed to duplicate {source}: {e}");
                outcome.failures.push(RemapWarning::CopyFailed {
                    source: source.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    outcome
}
