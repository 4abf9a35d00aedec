//! Loaded view of one composite file: the main object, its sub-object tree and the
//! structural identity signatures used to match objects between a file and its copy.

use std::collections::HashMap;

use super::{AssetDocument, AssetPath, FieldRecord, LocalId, ObjectKind, ObjectRecord, StoreError};

#[derive(Debug, Clone)]
pub struct GraphObject {
    pub id: LocalId,
    pub type_name: String,
    pub name: String,
    pub kind: ObjectKind,
    pub parent: Option<LocalId>,
    pub fields: Vec<FieldRecord>,
}

/// Position of an object inside its file's tree, independent of local ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionalSignature {
    /// Sibling index of the node and of each tree-node ancestor, innermost first.
    Node(Vec<usize>),
    /// Owner's node signature (when the owner is a tree node) plus the ordinal among
    /// same-type attachments on that owner.
    Attached {
        owner: Option<Vec<usize>>,
        ordinal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ObjectGraph {
    path: AssetPath,
    main: LocalId,
    objects: Vec<GraphObject>,
    index: HashMap<LocalId, usize>,
    broken: Vec<LocalId>,
}

impl ObjectGraph {
    /// Builds the graph for the file at `path`.
    ///
    /// Records whose parent chain does not reach the main object (dangling parent,
    /// cycle) are left out and listed by [`ObjectGraph::broken`].
    pub fn from_document(path: AssetPath, document: &AssetDocument) -> Result<Self, StoreError> {
        let mut by_id: HashMap<LocalId, &ObjectRecord> = HashMap::with_capacity(document.objects.len());
        for record in &document.objects {
            if by_id.insert(record.id, record).is_some() {
                return Err(StoreError::Parse(format!(
                    "{path}: duplicate object id {}",
                    record.id
                )));
            }
        }

        let main = by_id
            .get(&document.main)
            .ok_or_else(|| StoreError::Parse(format!("{path}: main object {} missing", document.main)))?;
        if main.parent.is_some() {
            return Err(StoreError::Parse(format!("{path}: main object has a parent")));
        }

        let limit = document.objects.len();
        let mut objects = Vec::with_capacity(limit);
        let mut broken = Vec::new();

        for record in &document.objects {
            let mut current = record;
            let mut steps = 0;
            let reaches_main = loop {
                if current.id == document.main {
                    break true;
                }
                steps += 1;
                match current.parent.and_then(|p| by_id.get(&p).copied()) {
                    Some(parent) if steps <= limit => current = parent,
                    _ => break false,
                }
            };

            if reaches_main {
                objects.push(GraphObject {
                    id: record.id,
                    type_name: record.type_name.clone(),
                    name: record.name.clone(),
                    kind: record.kind,
                    parent: record.parent,
                    fields: record.fields.clone(),
                });
            } else {
                log::debug!("{path}: skipping broken object {}", record.id);
                broken.push(record.id);
            }
        }

        let index = objects
            .iter()
            .enumerate()
            .map(|(idx, object)| (object.id, idx))
            .collect();

        Ok(Self {
            path,
            main: document.main,
            objects,
            index,
            broken,
        })
    }

    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    pub fn main_id(&self) -> LocalId {
        self.main
    }

    pub fn is_main(&self, id: LocalId) -> bool {
        self.main == id
    }

    pub fn get(&self, id: LocalId) -> Option<&GraphObject> {
        self.index.get(&id).map(|&idx| &self.objects[idx])
    }

    /// Every object in record order, main object included.
    pub fn objects(&self) -> &[GraphObject] {
        &self.objects
    }

    pub fn sub_objects(&self) -> impl Iterator<Item = &GraphObject> {
        self.objects.iter().filter(move |o| o.id != self.main)
    }

    pub fn broken(&self) -> &[LocalId] {
        &self.broken
    }

    /// `/`-joined names from just below the main object down to the object itself.
    pub fn full_name(&self, id: LocalId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.get(id)?;
        while current.id != self.main {
            names.push(current.name.as_str());
            current = self.get(current.parent?)?;
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// `None` for opaque objects, which have no positional identity.
    pub fn positional_signature(&self, id: LocalId) -> Option<PositionalSignature> {
        let object = self.get(id)?;
        match object.kind {
            ObjectKind::TreeNode => self.node_chain(object).map(PositionalSignature::Node),
            ObjectKind::Attachment => {
                let owner = object.parent.and_then(|p| self.get(p));
                let owner_chain = owner
                    .filter(|o| o.kind == ObjectKind::TreeNode)
                    .and_then(|o| self.node_chain(o));
                let ordinal = self
                    .objects
                    .iter()
                    .filter(|o| {
                        o.kind == ObjectKind::Attachment
                            && o.parent == object.parent
                            && o.type_name == object.type_name
                    })
                    .position(|o| o.id == object.id)?;
                Some(PositionalSignature::Attached {
                    owner: owner_chain,
                    ordinal,
                })
            }
            ObjectKind::Opaque => None,
        }
    }

    fn sibling_index(&self, node: &GraphObject) -> Option<usize> {
        self.objects
            .iter()
            .filter(|o| o.kind == ObjectKind::TreeNode && o.parent == node.parent)
            .position(|o| o.id == node.id)
    }

    fn node_chain(&self, node: &GraphObject) -> Option<Vec<usize>> {
        let mut chain = Vec::new();
        let mut current = node;
        loop {
            chain.push(self.sibling_index(current)?);
            match current.parent.and_then(|p| self.get(p)) {
                Some(parent) if parent.kind == ObjectKind::TreeNode => current = parent,
                _ => break,
            }
        }
        Some(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> ObjectGraph {
        // Root
        // ├─ Body ── Leg (Bone)
        // └─ Arm  ── Leg (Bone), Collider x2 on Arm
        let doc = AssetDocument::new(ObjectRecord::node(1, "GameObject", "Root"))
            .with(ObjectRecord::node(2, "GameObject", "Body").with_parent(1))
            .with(ObjectRecord::node(3, "GameObject", "Arm").with_parent(1))
            .with(ObjectRecord::node(4, "Bone", "Leg").with_parent(2))
            .with(ObjectRecord::node(5, "Bone", "Leg").with_parent(3))
            .with(ObjectRecord::attachment(6, "Collider", "Arm").with_parent(3))
            .with(ObjectRecord::attachment(7, "Collider", "Arm").with_parent(3))
            .with(ObjectRecord::opaque(8, "Mesh", "ArmMesh").with_parent(1));
        ObjectGraph::from_document(AssetPath::from("Assets/Rig.asset"), &doc).unwrap()
    }

    #[test]
    fn test_full_name_excludes_main() {
        let graph = rig();
        assert_eq!(graph.full_name(LocalId(4)).as_deref(), Some("Body/Leg"));
        assert_eq!(graph.full_name(LocalId(5)).as_deref(), Some("Arm/Leg"));
        assert_eq!(graph.full_name(LocalId(1)).as_deref(), Some(""));
    }

    #[test]
    fn test_node_signature_walks_to_root() {
        let graph = rig();
        assert_eq!(
            graph.positional_signature(LocalId(5)),
            Some(PositionalSignature::Node(vec![0, 1, 0]))
        );
        assert_eq!(
            graph.positional_signature(LocalId(2)),
            Some(PositionalSignature::Node(vec![0, 0]))
        );
    }

    #[test]
    fn test_attachment_signature_uses_ordinal() {
        let graph = rig();
        assert_eq!(
            graph.positional_signature(LocalId(7)),
            Some(PositionalSignature::Attached {
                owner: Some(vec![1, 0]),
                ordinal: 1,
            })
        );
        assert_eq!(graph.positional_signature(LocalId(8)), None);
    }

    #[test]
    fn test_sub_objects_exclude_main() {
        let graph = rig();
        assert_eq!(graph.sub_objects().count(), 7);
        assert!(graph.sub_objects().all(|o| o.id != LocalId(1)));
    }

    #[test]
    fn test_broken_objects_are_skipped() {
        let doc = AssetDocument::new(ObjectRecord::node(1, "GameObject", "Root"))
            .with(ObjectRecord::node(2, "GameObject", "Orphan").with_parent(99))
            .with(ObjectRecord::node(3, "GameObject", "Loop").with_parent(4))
            .with(ObjectRecord::node(4, "GameObject", "Loop").with_parent(3));
        let graph = ObjectGraph::from_document(AssetPath::from("a.asset"), &doc).unwrap();

        assert_eq!(graph.objects().len(), 1);
        assert_eq!(graph.broken(), &[LocalId(2), LocalId(3), LocalId(4)]);
    }

    #[test]
    fn test_main_with_parent_is_rejected() {
        let doc = AssetDocument::new(ObjectRecord::node(1, "GameObject", "Root").with_parent(2))
            .with(ObjectRecord::node(2, "GameObject", "Other"));
        assert!(ObjectGraph::from_document(AssetPath::from("a.asset"), &doc).is_err());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let doc = AssetDocument::new(ObjectRecord::node(1, "GameObject", "Root"))
            .with(ObjectRecord::node(1, "GameObject", "Again"));
        assert!(ObjectGraph::from_document(AssetPath::from("a.asset"), &doc).is_err());
    }
}
