//! Event-stream reader
//!
//! Folds the parser's events into a [`Node`] tree. Anchors stay on the
//! nodes that declare them and aliases stay as [`Node::Alias`], so nothing
//! is expanded on the way in.

use std::collections::HashSet;

use libyaml_safer::{Event, EventData, Mark, Parser, ScalarStyle};

use crate::error::{ParseError, ParseErrorKind};
use crate::node::{MapNode, Node, Pair, Scalar, SeqNode};
use crate::yaml::scalar::resolve_plain;

type ParseResult<T> = Result<T, ParseError>;

pub(crate) struct Reader<'r> {
    parser: Parser<'r>,
    anchors: HashSet<String>,
}

impl<'r> Reader<'r> {
    pub(crate) fn new(input: &'r mut &[u8]) -> Self {
        let mut parser = Parser::new();
        parser.set_input_string(input);
        Self {
            parser,
            anchors: HashSet::new(),
        }
    }

    /// Read the whole stream as at most one document
    ///
    /// An empty stream reads as a null root.
    pub(crate) fn read_document(mut self) -> ParseResult<Node> {
        let start = self.next_event()?;
        if !matches!(start.data, EventData::StreamStart { .. }) {
            return Err(unexpected(&start));
        }

        let event = self.next_event()?;
        let root = match event.data {
            EventData::StreamEnd => return Ok(Node::null()),
            EventData::DocumentStart { .. } => {
                let content = self.next_event()?;
                self.read_node(content)?
            }
            _ => return Err(unexpected(&event)),
        };

        let end = self.next_event()?;
        if !matches!(end.data, EventData::DocumentEnd { .. }) {
            return Err(unexpected(&end));
        }
        let next = self.next_event()?;
        match next.data {
            EventData::StreamEnd => Ok(root),
            EventData::DocumentStart { .. } => Err(ParseError::new(
                line_of(next.start_mark),
                ParseErrorKind::MultipleDocuments,
            )),
            _ => Err(unexpected(&next)),
        }
    }

    fn next_event(&mut self) -> ParseResult<Event> {
        self.parser.parse().map_err(|err| {
            let line = err.problem_mark().map_or(1, line_of);
            let message = match err.context() {
                Some(context) => format!("{}, {}", err.problem(), context),
                None => err.problem().to_string(),
            };
            ParseError::new(line, ParseErrorKind::Syntax(message))
        })
    }

    fn read_node(&mut self, event: Event) -> ParseResult<Node> {
        let line = line_of(event.start_mark);
        match event.data {
            EventData::Alias { anchor } => {
                if !self.anchors.contains(&anchor) {
                    return Err(ParseError::new(line, ParseErrorKind::UndefinedAlias(anchor)));
                }
                Ok(Node::alias(anchor))
            }
            EventData::Scalar {
                anchor,
                tag,
                value,
                style,
                ..
            } => {
                reject_tag(tag, line)?;
                let scalar = if style == ScalarStyle::Plain {
                    resolve_plain(&value)
                } else {
                    Scalar::Str(value)
                };
                Ok(self.anchored(Node::scalar(scalar), anchor))
            }
            EventData::SequenceStart { anchor, tag, .. } => {
                reject_tag(tag, line)?;
                self.declare(anchor.as_deref());
                let mut seq = SeqNode::new();
                loop {
                    let item = self.next_event()?;
                    if matches!(item.data, EventData::SequenceEnd) {
                        break;
                    }
                    seq.push(self.read_node(item)?);
                }
                Ok(self.anchored(Node::Seq(seq), anchor))
            }
            EventData::MappingStart { anchor, tag, .. } => {
                reject_tag(tag, line)?;
                self.declare(anchor.as_deref());
                let map = self.read_entries()?;
                Ok(self.anchored(Node::Map(map), anchor))
            }
            _ => Err(unexpected(&event)),
        }
    }

    fn read_entries(&mut self) -> ParseResult<MapNode> {
        let mut map = MapNode::new();
        loop {
            let event = self.next_event()?;
            let line = line_of(event.start_mark);
            if matches!(event.data, EventData::MappingEnd) {
                return Ok(map);
            }
            if !matches!(event.data, EventData::Scalar { .. }) {
                return Err(ParseError::new(line, ParseErrorKind::ComplexKey));
            }

            let key = self.read_node(event)?;
            if let Some(text) = key.as_scalar().map(|k| k.key_text().into_owned()) {
                if map.contains_key(&text) {
                    return Err(ParseError::new(line, ParseErrorKind::DuplicateKey(text)));
                }
            }
            let value = self.next_event()?;
            let value = self.read_node(value)?;
            map.items.push(Pair { key, value });
        }
    }

    /// Collections declare their anchor before their children are read
    fn declare(&mut self, anchor: Option<&str>) {
        if let Some(name) = anchor {
            self.anchors.insert(name.to_string());
        }
    }

    fn anchored(&mut self, mut node: Node, anchor: Option<String>) -> Node {
        if let Some(name) = anchor {
            self.anchors.insert(name.clone());
            node.set_anchor(Some(name));
        }
        node
    }
}

fn reject_tag(tag: Option<String>, line: usize) -> ParseResult<()> {
    match tag {
        Some(tag) => Err(ParseError::new(line, ParseErrorKind::UnsupportedTag(tag))),
        None => Ok(()),
    }
}

fn unexpected(event: &Event) -> ParseError {
    ParseError::new(
        line_of(event.start_mark),
        ParseErrorKind::Syntax(format!("unexpected {:?}", event.data)),
    )
}

/// 1-based line of a parser mark
fn line_of(mark: Mark) -> usize {
    usize::try_from(mark.line).map_or(usize::MAX, |line| line.saturating_add(1))
}
