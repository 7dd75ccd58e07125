//! Relationships between schemas.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::ReferentialAction;

/// The kind of association between two schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The owner holds the foreign key (`book.author_id -> author.id`).
    BelongsTo,
    /// The foreign schema holds the key, at most one row matches.
    HasOne,
    /// The foreign schema holds the key, many rows match.
    HasMany,
    /// Association through a junction schema.
    ManyToMany,
}

impl RelationKind {
    /// Check if this kind joins two tables directly.
    pub fn is_direct(&self) -> bool {
        !matches!(self, Self::ManyToMany)
    }

    /// Check if this is a "to-many" relation.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BelongsTo => write!(f, "belongs_to"),
            Self::HasOne => write!(f, "has_one"),
            Self::HasMany => write!(f, "has_many"),
            Self::ManyToMany => write!(f, "many_to_many"),
        }
    }
}

/// A declared relationship, keyed by its accessor name on the owning schema.
///
/// Foreign schemas are stored by name and resolved lazily through the
/// registry, because they may not be declared yet when this relationship is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Accessor name, unique within the owning schema.
    pub accessor: SmolStr,
    /// Relationship kind.
    #[serde(rename = "type")]
    pub kind: RelationKind,
    /// Owning schema name (direct kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_schema: Option<SmolStr>,
    /// Column on the owning schema (direct kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_column: Option<SmolStr>,
    /// Foreign schema name (direct kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_schema: Option<SmolStr>,
    /// Column on the foreign schema (direct kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_column: Option<SmolStr>,
    /// Junction relation accessor on the owning schema (many-to-many only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_junction: Option<SmolStr>,
    /// Relation accessor on the junction schema leading to the target (many-to-many only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_foreign: Option<SmolStr>,
    /// On delete action for generated foreign keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
}

impl Relationship {
    fn direct(
        accessor: impl Into<SmolStr>,
        kind: RelationKind,
        self_schema: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        foreign_column: impl Into<SmolStr>,
    ) -> Self {
        Self {
            accessor: accessor.into(),
            kind,
            self_schema: Some(self_schema.into()),
            self_column: Some(self_column.into()),
            foreign_schema: Some(foreign_schema.into()),
            foreign_column: Some(foreign_column.into()),
            relation_junction: None,
            relation_foreign: None,
            on_delete: None,
        }
    }

    /// Create a belongs-to relationship.
    pub fn belongs_to(
        accessor: impl Into<SmolStr>,
        self_schema: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        foreign_column: impl Into<SmolStr>,
    ) -> Self {
        Self::direct(
            accessor,
            RelationKind::BelongsTo,
            self_schema,
            self_column,
            foreign_schema,
            foreign_column,
        )
    }

    /// Create a has-one relationship.
    pub fn has_one(
        accessor: impl Into<SmolStr>,
        self_schema: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        foreign_column: impl Into<SmolStr>,
    ) -> Self {
        Self::direct(
            accessor,
            RelationKind::HasOne,
            self_schema,
            self_column,
            foreign_schema,
            foreign_column,
        )
    }

    /// Create a has-many relationship.
    pub fn has_many(
        accessor: impl Into<SmolStr>,
        self_schema: impl Into<SmolStr>,
        self_column: impl Into<SmolStr>,
        foreign_schema: impl Into<SmolStr>,
        foreign_column: impl Into<SmolStr>,
    ) -> Self {
        Self::direct(
            accessor,
            RelationKind::HasMany,
            self_schema,
            self_column,
            foreign_schema,
            foreign_column,
        )
    }

    /// Create a many-to-many relationship through an existing junction relation.
    pub fn many_to_many(
        accessor: impl Into<SmolStr>,
        junction: impl Into<SmolStr>,
        foreign: impl Into<SmolStr>,
    ) -> Self {
        Self {
            accessor: accessor.into(),
            kind: RelationKind::ManyToMany,
            self_schema: None,
            self_column: None,
            foreign_schema: None,
            foreign_column: None,
            relation_junction: Some(junction.into()),
            relation_foreign: Some(foreign.into()),
            on_delete: None,
        }
    }

    /// Set the on delete action.
    pub fn with_on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Set the on delete action in place.
    pub fn set_on_delete(&mut self, action: ReferentialAction) -> &mut Self {
        self.on_delete = Some(action);
        self
    }

    /// Get the accessor name as a string.
    pub fn accessor(&self) -> &str {
        self.accessor.as_str()
    }

    /// Get the foreign schema name, if this is a direct relationship.
    pub fn foreign_schema(&self) -> Option<&str> {
        self.foreign_schema.as_deref()
    }

    /// Get the self column name, if this is a direct relationship.
    pub fn self_column(&self) -> Option<&str> {
        self.self_column.as_deref()
    }

    /// Get the foreign column name, if this is a direct relationship.
    pub fn foreign_column(&self) -> Option<&str> {
        self.foreign_column.as_deref()
    }
}

/// One join between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStep {
    /// Left-hand table.
    pub left_table: String,
    /// Left-hand column.
    pub left_column: String,
    /// Right-hand table, the one being joined in.
    pub right_table: String,
    /// Right-hand column.
    pub right_column: String,
}

/// Resolved path from an owning schema to the target of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPlan {
    /// Accessor that was resolved.
    pub accessor: String,
    /// Relationship kind.
    pub kind: RelationKind,
    /// Owning schema table.
    pub owner_table: String,
    /// Target schema name.
    pub target_schema: String,
    /// Target table.
    pub target_table: String,
    /// Join steps in order, starting from the owner.
    pub steps: Vec<JoinStep>,
}

impl JoinPlan {
    /// Check if the plan passes through a junction table.
    pub fn has_junction(&self) -> bool {
        self.steps.len() > 1
    }
}
