//! Event-stream writer
//!
//! Turns a [`Node`] tree into emitter events. Keys and anchor names are
//! checked here, with the path of the offending node, before the emitter
//! sees anything.

use libyaml_safer::{Emitter, Encoding, Event, MappingStyle, ScalarStyle, SequenceStyle};

use crate::document::Document;
use crate::error::SerializeError;
use crate::node::{Node, Scalar};
use crate::path::{DocPath, Segment};
use crate::yaml::scalar::{format_scalar, is_valid_anchor, needs_double_quotes};

/// Emit a document as block-style YAML
pub(crate) fn write(doc: &Document, indent: usize) -> Result<String, SerializeError> {
    let mut events = Vec::new();
    let root = doc.root();
    events.push(Event::stream_start(Encoding::Utf8));
    // an anchored root needs the explicit `---` to carry it
    events.push(Event::document_start(None, &[], root.anchor().is_none()));
    collect(root, &mut DocPath::root(), &mut events)?;
    events.push(Event::document_end(true));
    events.push(Event::stream_end());

    let mut out = Vec::new();
    {
        let mut emitter = Emitter::new();
        emitter.set_output_string(&mut out);
        emitter.set_indent(i32::try_from(indent.clamp(2, 8)).unwrap_or(2));
        emitter.set_width(-1);
        emitter.set_unicode(true);
        for event in events {
            emitter
                .emit(event)
                .map_err(|err| SerializeError::Emit(err.to_string()))?;
        }
    }
    String::from_utf8(out).map_err(|err| SerializeError::Emit(err.to_string()))
}

fn collect(node: &Node, path: &mut DocPath, events: &mut Vec<Event>) -> Result<(), SerializeError> {
    let anchor = node.anchor();
    if let Some(name) = anchor {
        check_anchor(name, path)?;
    }
    match node {
        Node::Scalar(scalar) => events.push(scalar_event(anchor, &scalar.value)),
        Node::Alias(alias) => {
            check_anchor(&alias.source, path)?;
            events.push(Event::alias(&alias.source));
        }
        Node::Seq(seq) => {
            events.push(Event::sequence_start(anchor, None, true, SequenceStyle::Block));
            for (i, item) in seq.items.iter().enumerate() {
                path.push(Segment::Index(i));
                collect(item, path, events)?;
                path.pop();
            }
            events.push(Event::sequence_end());
        }
        Node::Map(map) => {
            events.push(Event::mapping_start(anchor, None, true, MappingStyle::Block));
            for pair in &map.items {
                let Node::Scalar(key) = &pair.key else {
                    return Err(SerializeError::UnsupportedKey(path.clone()));
                };
                if let Some(name) = key.anchor.as_deref() {
                    check_anchor(name, path)?;
                }
                events.push(scalar_event(key.anchor.as_deref(), &key.value));

                let segment = pair.key_text().map(|k| Segment::Key(k.into_owned()));
                let pushed = segment.is_some();
                if let Some(segment) = segment {
                    path.push(segment);
                }
                collect(&pair.value, path, events)?;
                if pushed {
                    path.pop();
                }
            }
            events.push(Event::mapping_end());
        }
    }
    Ok(())
}

/// Strings go plain when they read back unchanged, other scalars always do
fn scalar_event(anchor: Option<&str>, value: &Scalar) -> Event {
    match value {
        Scalar::Str(text) if needs_double_quotes(text) => {
            Event::scalar(anchor, None, text, false, true, ScalarStyle::DoubleQuoted)
        }
        Scalar::Str(text) => Event::scalar(anchor, None, text, true, true, ScalarStyle::Any),
        other => Event::scalar(anchor, None, &format_scalar(other), true, false, ScalarStyle::Plain),
    }
}

fn check_anchor(name: &str, path: &DocPath) -> Result<(), SerializeError> {
    if is_valid_anchor(name) {
        Ok(())
    } else {
        Err(SerializeError::InvalidAnchorName {
            path: path.clone(),
            name: name.to_string(),
        })
    }
}
