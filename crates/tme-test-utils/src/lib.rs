//! Testing utilities for TME workspace
//!
//! Shared threat-model fixtures, builders and assertions.

#![allow(missing_docs)]

use serde_json::{json, Map, Value};
use tme_document::{yaml, DocPath, Document, Node};

/// Small but complete threat model touching every reference location
pub const SAMPLE_MODEL: &str = "\
title: Sample model
tags_available:
  - web
  - storage
data_assets:
  customer-data: &customer-data
    id: da-1
    confidentiality: confidential
  session-token:
    <<: *customer-data
    id: da-2
  audit-log:
    id: da-3
    confidentiality: internal
technical_assets:
  web-server:
    id: ta-1
    tags: [web]
    data_assets_processed: [da-1, da-2]
    data_assets_stored: [da-3]
    communication_links:
      to-db:
        target: ta-2
        data_assets_sent: [da-1, da-2]
        data_assets_received: [da-3]
  database:
    id: ta-2
    tags: [storage]
    data_assets_stored: [da-1, da-3]
communication_links:
  web-to-db:
    target: ta-2
    data_assets_sent: [da-2, da-3]
trust_boundaries:
  dmz:
    id: tb-1
    technical_assets_inside: [ta-1]
    trust_boundaries_nested: [tb-2]
  internal:
    id: tb-2
    technical_assets_inside: [ta-2]
shared_runtimes:
  cluster:
    id: sr-1
    technical_assets_running: [ta-1, ta-2]
risk_tracking:
  sql-injection@ta-2:
    status: mitigated
  missing-authentication@ta-1@ta-2:
    status: accepted
";

pub fn sample_document() -> Document {
    parse_model(SAMPLE_MODEL)
}

pub fn parse_model(text: &str) -> Document {
    yaml::parse(text).unwrap()
}

pub fn serialize(doc: &Document) -> String {
    yaml::to_string(doc).unwrap()
}

pub fn path(text: &str) -> DocPath {
    text.parse().unwrap()
}

/// String items of the sequence at `path`; empty when missing
pub fn ids_at(doc: &Document, at: &str) -> Vec<String> {
    doc.get(&path(at))
        .and_then(Node::as_seq)
        .map(|seq| {
            seq.items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn str_at(doc: &Document, at: &str) -> Option<String> {
    doc.get(&path(at)).and_then(Node::as_str).map(str::to_string)
}

/// Every string anywhere in the document equal to `value`, with its path
pub fn occurrences(doc: &Document, value: &str) -> Vec<DocPath> {
    let mut found = Vec::new();
    doc.walk(&mut |at, _, node| {
        if node.as_str() == Some(value) {
            found.push(at.clone());
        }
    });
    found
}

/// Builder for models assembled in code
#[derive(Debug, Default)]
pub struct ModelBuilder {
    sections: Map<String, Value>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn section(&mut self, name: &str) -> &mut Map<String, Value> {
        self.sections
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .unwrap()
    }

    #[must_use]
    pub fn technical_asset(mut self, key: &str, id: &str, processed: &[&str]) -> Self {
        self.section("technical_assets").insert(
            key.to_string(),
            json!({"id": id, "data_assets_processed": processed}),
        );
        self
    }

    #[must_use]
    pub fn data_asset(mut self, key: &str, id: &str) -> Self {
        self.section("data_assets")
            .insert(key.to_string(), json!({"id": id}));
        self
    }

    #[must_use]
    pub fn link(mut self, owner: &str, key: &str, target: &str, sent: &[&str]) -> Self {
        let asset = self
            .section("technical_assets")
            .entry(owner.to_string())
            .or_insert_with(|| json!({}));
        if let Value::Object(asset) = asset {
            let links = asset
                .entry("communication_links".to_string())
                .or_insert_with(|| json!({}));
            if let Value::Object(links) = links {
                links.insert(
                    key.to_string(),
                    json!({"target": target, "data_assets_sent": sent}),
                );
            }
        }
        self
    }

    #[must_use]
    pub fn trust_boundary(mut self, key: &str, id: &str, inside: &[&str]) -> Self {
        self.section("trust_boundaries").insert(
            key.to_string(),
            json!({"id": id, "technical_assets_inside": inside}),
        );
        self
    }

    pub fn build(self) -> Document {
        Document::from(Node::from_json(&Value::Object(self.sections)))
    }
}

/// Assert that no string in the document equals `id`
pub fn assert_no_references(doc: &Document, id: &str) {
    let found = occurrences(doc, id);
    assert!(found.is_empty(), "'{id}' still referenced at {found:?}");
}
