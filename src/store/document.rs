use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AssetPath, StoreError};

/// File-local object identifier. Stable inside one file, meaningless across files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value of a reference field: an object somewhere in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub path: AssetPath,
    pub id: LocalId,
}

impl ObjectRef {
    pub fn new(path: impl Into<AssetPath>, id: u64) -> Self {
        Self {
            path: path.into(),
            id: LocalId(id),
        }
    }

    /// Path of the file owning the referenced object.
    pub fn asset_path(&self) -> &AssetPath {
        &self.path
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.id)
    }
}

/// How an object takes part in its file's internal tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Ordered parent/child hierarchy member; siblings have a stable index.
    TreeNode,
    /// Hangs off a tree node without being part of the sibling order.
    Attachment,
    #[default]
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    /// Not shown by normal inspection; still remapped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default)]
    pub value: Option<ObjectRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: LocalId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<LocalId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRecord>,
}

impl ObjectRecord {
    pub fn new(id: u64, type_name: &str, name: &str, kind: ObjectKind) -> Self {
        Self {
            id: LocalId(id),
            type_name: type_name.to_string(),
            name: name.to_string(),
            kind,
            parent: None,
            fields: Vec::new(),
        }
    }

    pub fn node(id: u64, type_name: &str, name: &str) -> Self {
        Self::new(id, type_name, name, ObjectKind::TreeNode)
    }

    pub fn attachment(id: u64, type_name: &str, name: &str) -> Self {
        Self::new(id, type_name, name, ObjectKind::Attachment)
    }

    pub fn opaque(id: u64, type_name: &str, name: &str) -> Self {
        Self::new(id, type_name, name, ObjectKind::Opaque)
    }

    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent = Some(LocalId(parent));
        self
    }

    pub fn with_field(mut self, name: &str, value: Option<ObjectRef>) -> Self {
        self.fields.push(FieldRecord {
            name: name.to_string(),
            hidden: false,
            value,
        });
        self
    }

    pub fn with_hidden_field(mut self, name: &str, value: Option<ObjectRef>) -> Self {
        self.fields.push(FieldRecord {
            name: name.to_string(),
            hidden: true,
            value,
        });
        self
    }
}

/// One staged reference rewrite, addressed by object id and field slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWrite {
    pub object: LocalId,
    pub field_index: usize,
    pub field_name: String,
    pub value: Option<ObjectRef>,
}

/// Content of a composite file: a main object plus its sub-objects.
///
/// Record order is significant: it is the sibling order of tree nodes and the
/// ordinal order of attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDocument {
    pub main: LocalId,
    pub objects: Vec<ObjectRecord>,
}

impl AssetDocument {
    pub fn new(main: ObjectRecord) -> Self {
        Self {
            main: main.id,
            objects: vec![main],
        }
    }

    pub fn with(mut self, record: ObjectRecord) -> Self {
        self.objects.push(record);
        self
    }

    pub fn push(&mut self, record: ObjectRecord) -> &mut Self {
        self.objects.push(record);
        self
    }

    pub fn object(&self, id: LocalId) -> Option<&ObjectRecord> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: LocalId) -> Option<&mut ObjectRecord> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Removes an object record, leaving its children dangling.
    pub fn remove(&mut self, id: LocalId) -> Option<ObjectRecord> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(idx))
    }

    /// Applies field writes in order. Every addressed slot must exist and carry the
    /// expected field name.
    pub fn apply_writes(&mut self, path: &AssetPath, writes: &[FieldWrite]) -> Result<(), StoreError> {
        for write in writes {
            let object = self.object_mut(write.object).ok_or_else(|| {
                StoreError::NotFound(format!("{path}{}", write.object))
            })?;
            let field = object
                .fields
                .get_mut(write.field_index)
                .filter(|f| f.name == write.field_name)
                .ok_or_else(|| {
                    StoreError::NotFound(format!(
                        "{path}{} field '{}'",
                        write.object, write.field_name
                    ))
                })?;
            field.value = write.value.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_writes_updates_field() {
        let path = AssetPath::from("Assets/Hero.asset");
        let mut doc = AssetDocument::new(
            ObjectRecord::node(1, "GameObject", "Hero").with_field("target", None),
        );

        doc.apply_writes(
            &path,
            &[FieldWrite {
                object: LocalId(1),
                field_index: 0,
                field_name: "target".to_string(),
                value: Some(ObjectRef::new("Assets/Other.asset", 7)),
            }],
        )
        .unwrap();

        assert_eq!(
            doc.objects[0].fields[0].value,
            Some(ObjectRef::new("Assets/Other.asset", 7))
        );
    }

    #[test]
    fn test_apply_writes_rejects_mismatched_field_name() {
        let path = AssetPath::from("Assets/Hero.asset");
        let mut doc = AssetDocument::new(
            ObjectRecord::node(1, "GameObject", "Hero").with_field("target", None),
        );

        let result = doc.apply_writes(
            &path,
            &[FieldWrite {
                object: LocalId(1),
                field_index: 0,
                field_name: "other".to_string(),
                value: None,
            }],
        );
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_document_yaml_shape() {
        let yaml = r#"
main: 1
objects:
  - id: 1
    type: GameObject
    name: Hero
    kind: tree_node
  - id: 2
    type: Mesh
    name: Body
    parent: 1
    fields:
      - name: material
        hidden: true
        value: { path: Assets/Mat.asset, id: 1 }
"#;
        let doc: AssetDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.main, LocalId(1));
        assert_eq!(doc.objects[1].kind, ObjectKind::Opaque);
        assert!(doc.objects[1].fields[0].hidden);
        assert_eq!(
            doc.objects[1].fields[0].value,
            Some(ObjectRef::new("Assets/Mat.asset", 1))
        );
    }
}
