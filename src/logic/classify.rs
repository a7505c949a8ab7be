use crate::adapter::document::{DocRelationDef, DocRelationKind};
use crate::adapter::relational::{AssociationDef, AssociationKind};
use crate::model::{Cardinality, RelationDescriptor};

/// Normalizes a relational association reflection into a paradigm-independent
/// descriptor.
pub fn classify_association(assoc: &AssociationDef) -> RelationDescriptor {
    let (cardinality, foreign_key) = match assoc.kind {
        AssociationKind::BelongsTo => (Cardinality::BelongsTo, assoc.foreign_key.clone()),
        AssociationKind::HasOne => (Cardinality::HasOne, assoc.foreign_key.clone()),
        AssociationKind::HasMany => (Cardinality::HasMany, assoc.foreign_key.clone()),
        // no single key identifies the pair, the join table does
        AssociationKind::HasAndBelongsToMany => (Cardinality::ManyToMany, None),
    };
    RelationDescriptor {
        name: assoc.name.clone(),
        target_class: assoc.class_name.clone(),
        cardinality,
        foreign_key,
        inverse_of: assoc.inverse_of.clone(),
        is_embedded: false,
    }
}

/// Normalizes a document relation. Returns `None` for `embedded_in`: the
/// owning side already yields the edge, and the inverse is not independently
/// expandable.
pub fn classify_document_relation(rel: &DocRelationDef) -> Option<RelationDescriptor> {
    let (cardinality, is_embedded) = match rel.kind {
        DocRelationKind::EmbeddedIn => return None,
        DocRelationKind::BelongsTo => (Cardinality::BelongsTo, false),
        DocRelationKind::HasOne => (Cardinality::HasOne, false),
        DocRelationKind::HasMany => (Cardinality::HasMany, false),
        DocRelationKind::HasAndBelongsToMany => (Cardinality::ManyToMany, false),
        DocRelationKind::EmbedsOne => (Cardinality::EmbedsOne, true),
        DocRelationKind::EmbedsMany => (Cardinality::EmbedsMany, true),
    };
    Some(RelationDescriptor {
        name: rel.name.clone(),
        target_class: rel.class_name.clone(),
        cardinality,
        foreign_key: if is_embedded { None } else { rel.foreign_key.clone() },
        inverse_of: rel.inverse_of.clone(),
        is_embedded,
    })
}
