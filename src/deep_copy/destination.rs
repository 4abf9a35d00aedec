//! Maps an in-scope reference target onto the path of its copy.
//!
//! Nested selected folders make the answer ambiguous: a target under `A/B` with both
//! `A` and `A/B` selected exists twice in the output. Which copy wins depends on who
//! is asking:
//! - a file inside a copied folder prefers the containing selected folder that is an
//!   ancestor of its own copy root, taking the lexicographically smallest candidate;
//! - a standalone copied file prefers the lexicographically largest containing folder.

use super::classify::SelectionScope;
use super::types::CopyPair;
use crate::store::AssetPath;

pub struct DestinationResolver<'a> {
    scope: &'a SelectionScope,
    pairs: &'a [CopyPair],
}

impl<'a> DestinationResolver<'a> {
    pub fn new(scope: &'a SelectionScope, pairs: &'a [CopyPair]) -> Self {
        Self { scope, pairs }
    }

    /// Recorded copy destination of a selected path, if its copy succeeded.
    pub fn destination_of(&self, source: &AssetPath) -> Option<&'a AssetPath> {
        self.pairs
            .iter()
            .find(|pair| &pair.source == source)
            .map(|pair| &pair.destination)
    }

    /// Destination path for `target`, as seen from a file produced by `current`.
    ///
    /// Returns `None` when `target` is out of scope or the copy it would map onto
    /// was never made.
    pub fn resolve(&self, current: &CopyPair, target: &AssetPath) -> Option<AssetPath> {
        let current_is_folder = self.scope.is_selected_folder(&current.source);

        if current_is_folder && target.is_inside(&current.source) {
            return Some(target.rebase(&current.source, &current.destination));
        }

        let candidates: Vec<&AssetPath> = self.scope.containing_folders(target).collect();

        if current_is_folder && !candidates.is_empty() {
            let enclosing: Vec<&AssetPath> = candidates
                .iter()
                .copied()
                .filter(|folder| current.source.is_inside(folder))
                .collect();
            let pool = if enclosing.is_empty() { &candidates } else { &enclosing };
            let folder = pool.iter().copied().min()?;
            return self.rebase_through(folder, target);
        }

        if self.scope.is_selected_file(target) {
            return self.destination_of(target).cloned();
        }

        let folder = candidates.into_iter().max()?;
        self.rebase_through(folder, target)
    }

    fn rebase_through(&self, folder: &AssetPath, target: &AssetPath) -> Option<AssetPath> {
        let destination = self.destination_of(folder)?;
        Some(target.rebase(folder, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pair(source: &str, destination: &str) -> CopyPair {
        CopyPair {
            source: AssetPath::from(source),
            destination: AssetPath::from(destination),
        }
    }

    fn scope(folders: &[&str], files: &[&str]) -> SelectionScope {
        SelectionScope::from_parts(
            folders.iter().copied().map(AssetPath::from).collect(),
            files.iter().copied().map(AssetPath::from).collect(),
        )
    }

    #[test]
    fn test_direct_containment() {
        let scope = scope(&["A/B"], &[]);
        let pairs = vec![pair("A/B", "A/B 1")];
        let resolver = DestinationResolver::new(&scope, &pairs);

        assert_eq!(
            resolver.resolve(&pairs[0], &AssetPath::from("A/B/x")),
            Some(AssetPath::from("A/B 1/x"))
        );
    }

    #[test]
    fn test_nested_folders_prefer_enclosing_copy() {
        // A and A/B both selected; the copy of A/B references A/B/x through A/B
        // directly, while a file inside the copy of A/B/C (a third selection) that
        // references A/B/x resolves through A, the smallest enclosing folder.
        let scope = scope(&["A", "A/B", "A/B/C"], &[]);
        let pairs = vec![pair("A", "A 1"), pair("A/B", "A/B 1"), pair("A/B/C", "A/B/C 1")];
        let resolver = DestinationResolver::new(&scope, &pairs);
        let target = AssetPath::from("A/B/x");

        assert_eq!(resolver.resolve(&pairs[0], &target), Some(AssetPath::from("A 1/B/x")));
        assert_eq!(resolver.resolve(&pairs[1], &target), Some(AssetPath::from("A/B 1/x")));
        assert_eq!(resolver.resolve(&pairs[2], &target), Some(AssetPath::from("A 1/B/x")));
    }

    #[test]
    fn test_sibling_folder_copy_uses_smallest_candidate() {
        // Referencing file lives in the copy of D, which no candidate encloses.
        let scope = scope(&["A", "A/B", "D"], &[]);
        let pairs = vec![pair("A", "A 1"), pair("A/B", "A/B 1"), pair("D", "D 1")];
        let resolver = DestinationResolver::new(&scope, &pairs);

        assert_eq!(
            resolver.resolve(&pairs[2], &AssetPath::from("A/B/x")),
            Some(AssetPath::from("A 1/B/x"))
        );
    }

    #[test]
    fn test_standalone_file_uses_largest_candidate() {
        let scope = scope(&["A", "A/B"], &["z.asset"]);
        let pairs = vec![pair("A", "A 1"), pair("A/B", "A/B 1"), pair("z.asset", "z 1.asset")];
        let resolver = DestinationResolver::new(&scope, &pairs);

        assert_eq!(
            resolver.resolve(&pairs[2], &AssetPath::from("A/B/x")),
            Some(AssetPath::from("A/B 1/x"))
        );
        assert_eq!(
            resolver.resolve(&pairs[2], &AssetPath::from("A/y")),
            Some(AssetPath::from("A 1/y"))
        );
    }

    #[test]
    fn test_selected_file_maps_to_its_pair() {
        let scope = scope(&[], &["a.asset", "b.asset"]);
        let pairs = vec![pair("a.asset", "a 1.asset"), pair("b.asset", "b 1.asset")];
        let resolver = DestinationResolver::new(&scope, &pairs);

        assert_eq!(
            resolver.resolve(&pairs[0], &AssetPath::from("b.asset")),
            Some(AssetPath::from("b 1.asset"))
        );
    }

    #[test]
    fn test_folder_copy_prefers_folder_rule_over_selected_file() {
        let scope = scope(&["A"], &["A/x.asset"]);
        let pairs = vec![pair("A", "A 1"), pair("A/x.asset", "A/x 1.asset")];
        let resolver = DestinationResolver::new(&scope, &pairs);
        let target = AssetPath::from("A/x.asset");

        assert_eq!(resolver.resolve(&pairs[0], &target), Some(AssetPath::from("A 1/x.asset")));
        assert_eq!(resolver.resolve(&pairs[1], &target), Some(AssetPath::from("A/x 1.asset")));
    }

    #[test]
    fn test_failed_copy_yields_none() {
        let scope = scope(&["A", "B"], &["c.asset"]);
        let pairs = vec![pair("B", "B 1")];
        let resolver = DestinationResolver::new(&scope, &pairs);

        assert_eq!(resolver.resolve(&pairs[0], &AssetPath::from("A/x")), None);
        assert_eq!(resolver.resolve(&pairs[0], &AssetPath::from("c.asset")), None);
        assert_eq!(resolver.resolve(&pairs[0], &AssetPath::from("elsewhere/x")), None);
    }

    fn nested_chain() -> impl Strategy<Value = Vec<String>> {
        // f0, f0/f1, f0/f1/f2, ...
        (2usize..5).prop_map(|depth| {
            (0..depth)
                .map(|level| (0..=level).map(|i| format!("f{i}")).collect::<Vec<_>>().join("/"))
                .collect()
        })
    }

    fn chain_fixture(chain: &[String], extra_folder: &str, extra_file: &str) -> (SelectionScope, Vec<CopyPair>) {
        let mut folders: Vec<AssetPath> = chain.iter().map(|f| AssetPath::new(f.clone())).collect();
        folders.push(AssetPath::from(extra_folder));
        let mut pairs: Vec<CopyPair> = folders
            .iter()
            .map(|f| CopyPair {
                source: f.clone(),
                destination: AssetPath::new(format!("{f} 1")),
            })
            .collect();
        pairs.push(pair(extra_file, "z 1.asset"));
        let scope = SelectionScope::from_parts(folders, vec![AssetPath::from(extra_file)]);
        (scope, pairs)
    }

    proptest! {
        #[test]
        fn prop_chain_copies_keep_targets_inside_themselves(chain in nested_chain(), leaf in "[a-z]{1,4}") {
            let (scope, pairs) = chain_fixture(&chain, "g", "z.asset");
            let resolver = DestinationResolver::new(&scope, &pairs);
            let target = AssetPath::new(chain.last().unwrap().clone()).join(&leaf);
            let suffix = format!("/{}", leaf);

            for current in pairs.iter().filter(|p| chain.contains(&p.source.as_str().to_string())) {
                let resolved = resolver.resolve(current, &target).unwrap();
                prop_assert!(resolved.is_inside(&current.destination));
                prop_assert!(resolved.as_str().ends_with(&suffix));
            }
        }

        #[test]
        fn prop_outside_referrers_split_by_kind(chain in nested_chain(), leaf in "[a-z]{1,4}") {
            let (scope, pairs) = chain_fixture(&chain, "g", "z.asset");
            let resolver = DestinationResolver::new(&scope, &pairs);
            let innermost = AssetPath::new(chain.last().unwrap().clone());
            let target = innermost.join(&leaf);

            // From an unrelated folder copy: the outermost chain folder wins.
            let from_folder = resolver.resolve(&pairs[chain.len()], &target).unwrap();
            prop_assert!(from_folder.is_inside(&AssetPath::from("f0 1")));

            // From a standalone file copy: the innermost chain folder wins.
            let from_file = resolver.resolve(&pairs[chain.len() + 1], &target).unwrap();
            let expected = AssetPath::new(format!("{} 1/{}", innermost, leaf));
            prop_assert_eq!(from_file, expected);
        }
    }
}
