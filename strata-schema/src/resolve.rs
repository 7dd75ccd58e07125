//! Relationship resolution: reference closures and join plans.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::ast::{JoinPlan, JoinStep, Relationship, Schema};
use crate::context::BuildContext;
use crate::error::{SchemaError, SchemaResult};

impl Schema {
    /// Collect the schemas this one refers to through its relationships,
    /// keyed by canonical declaration name and deduplicated.
    ///
    /// With `recursive`, the references of every found schema are followed
    /// as well. Many-to-many relationships contribute nothing directly;
    /// their junction relationship already does.
    pub fn reference_schemas(
        &self,
        ctx: &BuildContext,
        recursive: bool,
    ) -> SchemaResult<IndexMap<SmolStr, Arc<Schema>>> {
        let mut found: IndexMap<SmolStr, Arc<Schema>> = IndexMap::new();
        let mut queue: VecDeque<Arc<Schema>> = VecDeque::new();

        for schema in direct_references(self, ctx)? {
            if !found.contains_key(&schema.name) {
                found.insert(schema.name.clone(), Arc::clone(&schema));
                queue.push_back(schema);
            }
        }

        while recursive {
            let Some(next) = queue.pop_front() else {
                break;
            };
            for schema in direct_references(&next, ctx)? {
                if !found.contains_key(&schema.name) {
                    found.insert(schema.name.clone(), Arc::clone(&schema));
                    queue.push_back(schema);
                }
            }
        }

        Ok(found)
    }

    /// Resolve a relationship accessor into a join plan.
    pub fn join_plan(&self, ctx: &BuildContext, accessor: &str) -> SchemaResult<JoinPlan> {
        let relations = self.effective_relations(ctx)?;
        let rel = relations.get(accessor).ok_or_else(|| {
            SchemaError::relation_not_defined(self.name.as_str(), accessor, accessor)
        })?;
        rel.resolve_join(self, ctx)
    }
}

impl Relationship {
    /// Resolve this relationship, owned by `owner`, into join steps.
    ///
    /// Direct kinds produce one step. Many-to-many produces two: owner to
    /// junction through the junction relationship, then junction to target
    /// through the junction schema's `relation_foreign` relationship.
    pub fn resolve_join(&self, owner: &Schema, ctx: &BuildContext) -> SchemaResult<JoinPlan> {
        if self.kind.is_direct() {
            let (target, step) = direct_step(owner, self, ctx)?;
            return Ok(JoinPlan {
                accessor: self.accessor.to_string(),
                kind: self.kind,
                owner_table: owner.table.clone(),
                target_schema: target.name.to_string(),
                target_table: target.table.clone(),
                steps: vec![step],
            });
        }

        let junction_accessor = self.relation_junction.as_deref().unwrap_or_default();
        let foreign_accessor = self.relation_foreign.as_deref().unwrap_or_default();

        let owner_relations = owner.effective_relations(ctx)?;
        let junction_rel = owner_relations.get(junction_accessor).ok_or_else(|| {
            SchemaError::relation_not_defined(
                owner.name.as_str(),
                junction_accessor,
                self.accessor.as_str(),
            )
        })?;
        if !junction_rel.kind.is_direct() {
            return Err(SchemaError::invalid_relation(
                owner.name.as_str(),
                self.accessor.as_str(),
                format!("junction relation `{}` must be direct", junction_accessor),
            ));
        }
        let (junction, first) = direct_step(owner, junction_rel, ctx)?;

        let junction_relations = junction.effective_relations(ctx)?;
        let target_rel = junction_relations.get(foreign_accessor).ok_or_else(|| {
            SchemaError::relation_not_defined(
                junction.name.as_str(),
                foreign_accessor,
                self.accessor.as_str(),
            )
        })?;
        if !target_rel.kind.is_direct() {
            return Err(SchemaError::invalid_relation(
                owner.name.as_str(),
                self.accessor.as_str(),
                format!("relation `{}` on `{}` must be direct", foreign_accessor, junction.name),
            ));
        }
        let (target, second) = direct_step(&junction, target_rel, ctx)?;

        Ok(JoinPlan {
            accessor: self.accessor.to_string(),
            kind: self.kind,
            owner_table: owner.table.clone(),
            target_schema: target.name.to_string(),
            target_table: target.table.clone(),
            steps: vec![first, second],
        })
    }
}

fn foreign_of(owner: &Schema, rel: &Relationship, ctx: &BuildContext) -> SchemaResult<Arc<Schema>> {
    let foreign = rel.foreign_schema().ok_or_else(|| {
        SchemaError::invalid_relation(owner.name.as_str(), rel.accessor(), "no foreign schema")
    })?;
    ctx.schema(foreign).map_err(|e| match e {
        SchemaError::UnknownSchema { name } => {
            SchemaError::foreign_schema_not_found(owner.name.as_str(), rel.accessor(), name)
        }
        other => other,
    })
}

fn direct_step(
    owner: &Schema,
    rel: &Relationship,
    ctx: &BuildContext,
) -> SchemaResult<(Arc<Schema>, JoinStep)> {
    let target = foreign_of(owner, rel, ctx)?;
    let step = JoinStep {
        left_table: owner.table.clone(),
        left_column: rel.self_column().unwrap_or_default().to_string(),
        right_table: target.table.clone(),
        right_column: rel.foreign_column().unwrap_or_default().to_string(),
    };
    Ok((target, step))
}

fn direct_references(schema: &Schema, ctx: &BuildContext) -> SchemaResult<Vec<Arc<Schema>>> {
    schema
        .effective_relations(ctx)?
        .values()
        .filter(|rel| rel.foreign_schema().is_some())
        .map(|rel| foreign_of(schema, rel, ctx))
        .collect()
}
