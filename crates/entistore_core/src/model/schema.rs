//! Static record schema descriptors and per-instance introspection.
//!
//! # Responsibility
//! - Declare, per record type, which fields are scalars and which are
//!   references, and whether a reference owns its referent.
//! - Enumerate the references held by one stored document.
//!
//! # Invariants
//! - Only reference-kind fields are ever reported; scalar and scalar-list
//!   fields are invisible to graph traversal.
//! - Reported references keep declaration order, then list order.

use serde_json::Value;
use std::fmt::{Debug, Formatter};

/// Lazily resolved schema of a reference target.
///
/// A function pointer lets record types refer to each other (including
/// themselves) without static initialization cycles.
pub type SchemaRef = fn() -> &'static RecordSchema;

/// Lifetime relation between a reference holder and its referent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Deleting the holder deletes the referent unless another owner remains.
    Owned,
    /// Plain association; never followed by cascade deletion.
    Unowned,
}

impl Ownership {
    pub fn is_owned(self) -> bool {
        matches!(self, Self::Owned)
    }
}

/// Declared kind of one record field.
#[derive(Clone, Copy)]
pub enum FieldKind {
    Scalar,
    ScalarList,
    Reference {
        target: SchemaRef,
        ownership: Ownership,
    },
    ReferenceList {
        target: SchemaRef,
        ownership: Ownership,
    },
}

impl FieldKind {
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. } | Self::ReferenceList { .. })
    }

    pub fn ownership(&self) -> Option<Ownership> {
        match self {
            Self::Scalar | Self::ScalarList => None,
            Self::Reference { ownership, .. } | Self::ReferenceList { ownership, .. } => {
                Some(*ownership)
            }
        }
    }

    pub fn target(&self) -> Option<&'static RecordSchema> {
        match self {
            Self::Scalar | Self::ScalarList => None,
            Self::Reference { target, .. } | Self::ReferenceList { target, .. } => Some(target()),
        }
    }
}

impl Debug for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "Scalar"),
            Self::ScalarList => write!(f, "ScalarList"),
            Self::Reference { target, ownership } => f
                .debug_struct("Reference")
                .field("target", &target().type_name)
                .field("ownership", ownership)
                .finish(),
            Self::ReferenceList { target, ownership } => f
                .debug_struct("ReferenceList")
                .field("target", &target().type_name)
                .field("ownership", ownership)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    /// Serialized field name inside the stored document.
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSchema {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
        }
    }

    pub const fn scalar_list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::ScalarList,
        }
    }

    pub const fn owned(name: &'static str, target: SchemaRef) -> Self {
        Self {
            name,
            kind: FieldKind::Reference {
                target,
                ownership: Ownership::Owned,
            },
        }
    }

    pub const fn owned_list(name: &'static str, target: SchemaRef) -> Self {
        Self {
            name,
            kind: FieldKind::ReferenceList {
                target,
                ownership: Ownership::Owned,
            },
        }
    }

    pub const fn unowned(name: &'static str, target: SchemaRef) -> Self {
        Self {
            name,
            kind: FieldKind::Reference {
                target,
                ownership: Ownership::Unowned,
            },
        }
    }

    pub const fn unowned_list(name: &'static str, target: SchemaRef) -> Self {
        Self {
            name,
            kind: FieldKind::ReferenceList {
                target,
                ownership: Ownership::Unowned,
            },
        }
    }
}

/// Statically declared shape of one record type.
#[derive(Debug)]
pub struct RecordSchema {
    /// Storage-wide unique type name.
    pub type_name: &'static str,
    pub fields: &'static [FieldSchema],
}

/// One reference found in a stored document.
#[derive(Debug, Clone)]
pub struct FieldReference {
    pub field: &'static str,
    /// Index within a reference list; always 0 for single references.
    pub position: usize,
    pub target: &'static RecordSchema,
    pub key: String,
    pub ownership: Ownership,
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn reference_fields(&self) -> impl Iterator<Item = &FieldSchema> + '_ {
        self.fields.iter().filter(|field| field.kind.is_reference())
    }

    /// Whether instances of this type can own children at all.
    pub fn has_owned_references(&self) -> bool {
        self.reference_fields()
            .any(|field| field.kind.ownership() == Some(Ownership::Owned))
    }

    pub fn is_same(&self, other: &RecordSchema) -> bool {
        self.type_name == other.type_name
    }

    /// Enumerates every reference held by a stored document of this type.
    ///
    /// Missing or `null` fields hold no reference. Values of an unexpected
    /// JSON shape are skipped.
    pub fn references_in(&self, body: &Value) -> Vec<FieldReference> {
        let mut found = Vec::new();
        for field in self.reference_fields() {
            let (Some(target), Some(ownership)) = (field.kind.target(), field.kind.ownership())
            else {
                continue;
            };
            let keys: Vec<&str> = match (&field.kind, body.get(field.name)) {
                (_, None) | (_, Some(Value::Null)) => Vec::new(),
                (FieldKind::Reference { .. }, Some(Value::String(key))) => vec![key.as_str()],
                (FieldKind::ReferenceList { .. }, Some(Value::Array(items))) => {
                    items.iter().filter_map(Value::as_str).collect()
                }
                _ => Vec::new(),
            };
            found.extend(
                keys.into_iter()
                    .enumerate()
                    .map(|(position, key)| FieldReference {
                        field: field.name,
                        position,
                        target,
                        key: key.to_string(),
                        ownership,
                    }),
            );
        }
        found
    }

    /// Owned children of a stored document, in declaration order.
    pub fn owned_children_in(&self, body: &Value) -> Vec<FieldReference> {
        if !self.has_owned_references() {
            return Vec::new();
        }
        self.references_in(body)
            .into_iter()
            .filter(|reference| reference.ownership.is_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldSchema, Ownership, RecordSchema};
    use serde_json::json;

    static FOLDER: RecordSchema = RecordSchema {
        type_name: "folder",
        fields: &[
            FieldSchema::scalar("title"),
            FieldSchema::scalar_list("labels"),
            FieldSchema::owned("cover", folder_schema),
            FieldSchema::owned_list("children", folder_schema),
            FieldSchema::unowned("shortcut", folder_schema),
        ],
    };

    static LEAF: RecordSchema = RecordSchema {
        type_name: "leaf",
        fields: &[
            FieldSchema::scalar("title"),
            FieldSchema::unowned_list("see_also", folder_schema),
        ],
    };

    fn folder_schema() -> &'static RecordSchema {
        &FOLDER
    }

    #[test]
    fn references_in_skips_scalars_and_reports_list_positions() {
        let body = json!({
            "title": "root",
            "labels": ["a", "b"],
            "cover": "c1",
            "children": ["k1", "k2"],
            "shortcut": "s1"
        });

        let references = FOLDER.references_in(&body);
        let summary: Vec<_> = references
            .iter()
            .map(|item| (item.field, item.position, item.key.as_str(), item.ownership))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("cover", 0, "c1", Ownership::Owned),
                ("children", 0, "k1", Ownership::Owned),
                ("children", 1, "k2", Ownership::Owned),
                ("shortcut", 0, "s1", Ownership::Unowned),
            ]
        );
        assert!(references.iter().all(|item| item.target.is_same(&FOLDER)));
    }

    #[test]
    fn null_and_missing_references_hold_nothing() {
        let body = json!({ "title": "empty", "cover": null });
        assert!(FOLDER.references_in(&body).is_empty());
    }

    #[test]
    fn owned_children_ignore_unowned_references() {
        let body = json!({ "children": ["k1"], "shortcut": "s1" });
        let owned = FOLDER.owned_children_in(&body);
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].key, "k1");
    }

    #[test]
    fn schema_without_owned_fields_reports_no_children() {
        assert!(!LEAF.has_owned_references());
        let body = json!({ "see_also": ["f1"] });
        assert!(LEAF.owned_children_in(&body).is_empty());
        assert_eq!(LEAF.references_in(&body).len(), 1);
    }
}
