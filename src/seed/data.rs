//! Demo blog dataset, mirrored across both paradigms so either adapter can
//! be explored out of the box. A real host embeds the library and registers
//! its own mapping layer instead.

use crate::adapter::document::{
    DocRelationDef, DocRelationKind, Document, DocumentModel, DocumentRegistry,
};
use crate::adapter::relational::{
    AssociationDef, AssociationKind, RelationalModel, RelationalRegistry,
};
use crate::adapter::HostMapping;
use crate::model::AttrValue;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

fn assoc(
    name: &str,
    kind: AssociationKind,
    class_name: &str,
    foreign_key: Option<&str>,
    inverse_of: Option<&str>,
    join_table: Option<&str>,
) -> AssociationDef {
    AssociationDef {
        name: name.to_string(),
        kind,
        class_name: class_name.to_string(),
        foreign_key: foreign_key.map(String::from),
        inverse_of: inverse_of.map(String::from),
        join_table: join_table.map(String::from),
    }
}

fn doc_relation(
    name: &str,
    kind: DocRelationKind,
    class_name: &str,
    foreign_key: Option<&str>,
    inverse_of: Option<&str>,
) -> DocRelationDef {
    DocRelationDef {
        name: name.to_string(),
        kind,
        class_name: class_name.to_string(),
        foreign_key: foreign_key.map(String::from),
        inverse_of: inverse_of.map(String::from),
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Relational rendition of the demo blog: authors, posts, comments, profiles,
/// tags through a join table, plus an audit log worth excluding.
pub fn relational_demo() -> RelationalRegistry {
    let mut registry = RelationalRegistry::new();

    registry.register_model(RelationalModel {
        name: "ApplicationRecord".to_string(),
        columns: Vec::new(),
        associations: Vec::new(),
        abstract_class: true,
    });
    registry.register_model(RelationalModel {
        name: "Author".to_string(),
        columns: columns(&["id", "name", "email", "created_at", "updated_at"]),
        associations: vec![
            assoc("posts", AssociationKind::HasMany, "Post", Some("author_id"), Some("author"), None),
            assoc("comments", AssociationKind::HasMany, "Comment", Some("author_id"), Some("author"), None),
            assoc("profile", AssociationKind::HasOne, "Profile", Some("author_id"), Some("author"), None),
        ],
        abstract_class: false,
    });
    registry.register_model(RelationalModel {
        name: "Post".to_string(),
        columns: columns(&["id", "title", "body", "published", "author_id", "created_at", "updated_at"]),
        associations: vec![
            assoc("author", AssociationKind::BelongsTo, "Author", Some("author_id"), Some("posts"), None),
            assoc("comments", AssociationKind::HasMany, "Comment", Some("post_id"), Some("post"), None),
            assoc("tags", AssociationKind::HasAndBelongsToMany, "Tag", None, Some("posts"), Some("posts_tags")),
        ],
        abstract_class: false,
    });
    registry.register_model(RelationalModel {
        name: "Comment".to_string(),
        columns: columns(&["id", "body", "post_id", "author_id", "created_at", "updated_at"]),
        associations: vec![
            assoc("post", AssociationKind::BelongsTo, "Post", Some("post_id"), Some("comments"), None),
            assoc("author", AssociationKind::BelongsTo, "Author", Some("author_id"), Some("comments"), None),
        ],
        abstract_class: false,
    });
    registry.register_model(RelationalModel {
        name: "Profile".to_string(),
        columns: columns(&["id", "bio", "website", "author_id", "created_at", "updated_at"]),
        associations: vec![assoc(
            "author",
            AssociationKind::BelongsTo,
            "Author",
            Some("author_id"),
            Some("profile"),
            None,
        )],
        abstract_class: false,
    });
    registry.register_model(RelationalModel {
        name: "Tag".to_string(),
        columns: columns(&["id", "name", "created_at", "updated_at"]),
        associations: vec![assoc(
            "posts",
            AssociationKind::HasAndBelongsToMany,
            "Post",
            None,
            Some("tags"),
            Some("posts_tags"),
        )],
        abstract_class: false,
    });
    registry.register_model(RelationalModel {
        name: "AuditLog".to_string(),
        columns: columns(&["id", "action", "actor", "created_at"]),
        associations: Vec::new(),
        abstract_class: false,
    });

    let t0 = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
    let ada = registry.insert(
        "Author",
        BTreeMap::from([
            ("name".to_string(), AttrValue::from("Ada Lovelace")),
            ("email".to_string(), AttrValue::from("ada@example.org")),
            ("created_at".to_string(), AttrValue::Time(t0)),
        ]),
    );
    let grace = registry.insert(
        "Author",
        BTreeMap::from([
            ("name".to_string(), AttrValue::from("Grace Hopper")),
            ("email".to_string(), AttrValue::from("grace@example.org")),
            ("created_at".to_string(), AttrValue::Time(t0)),
        ]),
    );

    registry.insert(
        "Profile",
        BTreeMap::from([
            ("bio".to_string(), AttrValue::from("Wrote the first program.")),
            ("website".to_string(), AttrValue::from("https://ada.example.org")),
            ("author_id".to_string(), AttrValue::from(ada.clone())),
        ]),
    );

    let mut posts = Vec::new();
    for (title, author_id, published) in [
        ("Notes on the Analytical Engine", &ada, true),
        ("On Diagrams and Loops", &ada, true),
        ("Poetical Science", &ada, false),
        ("Nanoseconds, Visualized", &grace, true),
    ] {
        posts.push(registry.insert(
            "Post",
            BTreeMap::from([
                ("title".to_string(), AttrValue::from(title)),
                ("body".to_string(), AttrValue::from("…")),
                ("published".to_string(), AttrValue::from(published)),
                ("author_id".to_string(), AttrValue::from(author_id.clone())),
                ("created_at".to_string(), AttrValue::Time(t0)),
            ]),
        ));
    }

    for (body, post_id, author_id) in [
        ("Fascinating throughout.", &posts[0], &grace),
        ("The loop diagram convinced me.", &posts[1], &grace),
        ("Looking forward to part two.", &posts[0], &ada),
    ] {
        registry.insert(
            "Comment",
            BTreeMap::from([
                ("body".to_string(), AttrValue::from(body)),
                ("post_id".to_string(), AttrValue::from(post_id.clone())),
                ("author_id".to_string(), AttrValue::from(author_id.clone())),
            ]),
        );
    }

    let history = registry.insert(
        "Tag",
        BTreeMap::from([("name".to_string(), AttrValue::from("history"))]),
    );
    let computing = registry.insert(
        "Tag",
        BTreeMap::from([("name".to_string(), AttrValue::from("computing"))]),
    );
    registry.join("posts_tags", ("Post", posts[0].as_str()), ("Tag", history.as_str()));
    registry.join("posts_tags", ("Post", posts[0].as_str()), ("Tag", computing.as_str()));
    registry.join("posts_tags", ("Post", posts[3].as_str()), ("Tag", computing.as_str()));

    registry.insert(
        "AuditLog",
        BTreeMap::from([
            ("action".to_string(), AttrValue::from("login")),
            ("actor".to_string(), AttrValue::from("ada")),
        ]),
    );

    registry
}

/// Document rendition of the same blog: referenced posts plus embedded
/// awards, contact cards, and comments.
pub fn document_demo() -> DocumentRegistry {
    let mut registry = DocumentRegistry::new();

    registry.register_model(DocumentModel {
        name: "Author".to_string(),
        fields: columns(&["_id", "name", "email", "created_at"]),
        relations: vec![
            doc_relation("posts", DocRelationKind::HasMany, "Post", Some("author_id"), Some("author")),
            doc_relation("awards", DocRelationKind::EmbedsMany, "Award", None, Some("author")),
            doc_relation("contact", DocRelationKind::EmbedsOne, "Contact", None, Some("author")),
        ],
        embedded: false,
    });
    registry.register_model(DocumentModel {
        name: "Post".to_string(),
        fields: columns(&["_id", "title", "body", "author_id", "tag_ids", "created_at"]),
        relations: vec![
            doc_relation("author", DocRelationKind::BelongsTo, "Author", Some("author_id"), Some("posts")),
            doc_relation("comments", DocRelationKind::EmbedsMany, "Comment", None, Some("post")),
            doc_relation("tags", DocRelationKind::HasAndBelongsToMany, "Tag", Some("tag_ids"), Some("posts")),
        ],
        embedded: false,
    });
    registry.register_model(DocumentModel {
        name: "Tag".to_string(),
        fields: columns(&["_id", "name", "post_ids"]),
        relations: vec![doc_relation(
            "posts",
            DocRelationKind::HasAndBelongsToMany,
            "Post",
            Some("post_ids"),
            Some("tags"),
        )],
        embedded: false,
    });
    registry.register_model(DocumentModel {
        name: "Award".to_string(),
        fields: columns(&["_id", "title", "year"]),
        relations: vec![doc_relation("author", DocRelationKind::EmbeddedIn, "Author", None, Some("awards"))],
        embedded: true,
    });
    registry.register_model(DocumentModel {
        name: "Contact".to_string(),
        fields: columns(&["_id", "city", "timezone"]),
        relations: vec![doc_relation("author", DocRelationKind::EmbeddedIn, "Author", None, Some("contact"))],
        embedded: true,
    });
    registry.register_model(DocumentModel {
        name: "Comment".to_string(),
        fields: columns(&["_id", "body", "author_name"]),
        relations: vec![doc_relation("post", DocRelationKind::EmbeddedIn, "Post", None, Some("comments"))],
        embedded: true,
    });

    let t0 = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
    let author = Document::new(BTreeMap::from([
        ("name".to_string(), AttrValue::from("Ada Lovelace")),
        ("email".to_string(), AttrValue::from("ada@example.org")),
        ("created_at".to_string(), AttrValue::Time(t0)),
    ]))
    .embed(
        "awards",
        vec![
            Document::new(BTreeMap::from([
                ("title".to_string(), AttrValue::from("First Programmer")),
                ("year".to_string(), AttrValue::Int(1843)),
            ])),
            Document::new(BTreeMap::from([
                ("title".to_string(), AttrValue::from("Countess of Computing")),
                ("year".to_string(), AttrValue::Int(1838)),
            ])),
        ],
    )
    .embed(
        "contact",
        vec![Document::new(BTreeMap::from([
            ("city".to_string(), AttrValue::from("London")),
            ("timezone".to_string(), AttrValue::from("Europe/London")),
        ]))],
    );
    let author_id = registry.insert("Author", author);

    let tag = Document::new(BTreeMap::from([(
        "name".to_string(),
        AttrValue::from("computing"),
    )]));
    let tag_id = tag.id.clone();

    let mut post_ids = Vec::new();
    for title in ["Notes on the Analytical Engine", "Poetical Science"] {
        let post = Document::new(BTreeMap::from([
            ("title".to_string(), AttrValue::from(title)),
            ("body".to_string(), AttrValue::from("…")),
            ("author_id".to_string(), AttrValue::from(author_id.clone())),
            (
                "tag_ids".to_string(),
                AttrValue::Array(vec![AttrValue::from(tag_id.clone())]),
            ),
            ("created_at".to_string(), AttrValue::Time(t0)),
        ]))
        .embed(
            "comments",
            vec![Document::new(BTreeMap::from([
                ("body".to_string(), AttrValue::from("Fascinating throughout.")),
                ("author_name".to_string(), AttrValue::from("Grace")),
            ]))],
        );
        post_ids.push(registry.insert("Post", post));
    }

    let mut tag = tag;
    tag.values.insert(
        "post_ids".to_string(),
        AttrValue::Array(post_ids.iter().cloned().map(AttrValue::from).collect()),
    );
    registry.insert("Tag", tag);

    registry
}

/// Builds the demo host for the binary. The paradigm name mirrors what a
/// real host's detection would find at startup.
pub fn demo_host(paradigm: &str) -> anyhow::Result<HostMapping> {
    match paradigm {
        "relational" => Ok(HostMapping::relational(relational_demo())),
        "document" => Ok(HostMapping::document(document_demo())),
        other => anyhow::bail!("unknown demo paradigm '{}' (expected 'relational' or 'document')", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{detect, Paradigm};

    #[test]
    fn both_demo_hosts_detect_their_paradigm() {
        let adapter = detect(demo_host("relational").unwrap()).unwrap();
        assert_eq!(adapter.paradigm(), Paradigm::Relational);
        assert!(adapter.model_names().contains(&"Author".to_string()));

        let adapter = detect(demo_host("document").unwrap()).unwrap();
        assert_eq!(adapter.paradigm(), Paradigm::Document);
        assert!(!adapter.model_names().contains(&"Award".to_string()));

        assert!(demo_host("graph").is_err());
    }
}
