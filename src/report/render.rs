//! Mustache rendering of the intermediate document
//!
//! Supports interpolation (`{{x}}`, `{{{x}}}`, `{{& x}}`), sections
//! (`{{#x}}...{{/x}}`), inverted sections (`{{^x}}...{{/x}}`), comments,
//! dotted names and the implicit iterator `{{.}}`. Partials and delimiter
//! changes are rejected.
//!
//! Values are emitted verbatim. All three interpolation forms behave the same:
//! content is LaTeX-escaped before it gets here, so any further escaping would
//! corrupt it.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const TRIPLE_CLOSE: &str = "}}}";

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Variable(String),
    Section {
        name: String,
        inverted: bool,
        children: Vec<Node>,
    },
}

#[derive(Debug, PartialEq)]
enum Tag<'a> {
    Variable(&'a str),
    Open { name: &'a str, inverted: bool },
    Close(&'a str),
    Comment,
}

impl Tag<'_> {
    /// Tags that swallow their whole line when nothing else is on it
    fn can_stand_alone(&self) -> bool {
        !matches!(self, Tag::Variable(_))
    }
}

/// An open section while parsing
struct Frame {
    name: String,
    inverted: bool,
    nodes: Vec<Node>,
}

/// A parsed Mustache template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source
    pub fn parse(source: &str) -> Result<Self> {
        let mut stack = vec![Frame {
            name: String::new(),
            inverted: false,
            nodes: Vec::new(),
        }];
        let mut text = String::new();
        let mut text_starts_line = true;
        let mut rest = source;

        while let Some(start) = rest.find(OPEN) {
            let offset = source.len() - rest.len() + start;
            text.push_str(&rest[..start]);
            let (tag, mut after) = read_tag(&rest[start + OPEN.len()..], offset)?;

            let mut standalone = false;
            if tag.can_stand_alone() {
                if let (Some(line_start), Some(remaining)) = (
                    standalone_line_start(&text, text_starts_line),
                    standalone_line_end(after),
                ) {
                    text.truncate(line_start);
                    after = remaining;
                    standalone = true;
                }
            }
            text_starts_line = standalone;

            if !text.is_empty() {
                current(&mut stack).push(Node::Text(std::mem::take(&mut text)));
            }

            match tag {
                Tag::Variable(name) => current(&mut stack).push(Node::Variable(name.to_string())),
                Tag::Open { name, inverted } => stack.push(Frame {
                    name: name.to_string(),
                    inverted,
                    nodes: Vec::new(),
                }),
                Tag::Close(name) => {
                    if stack.len() == 1 {
                        return Err(Error::Template(format!(
                            "unexpected {{{{/{}}}}} at byte {}",
                            name, offset
                        )));
                    }
                    let frame = stack.pop().ok_or_else(|| {
                        Error::Template("section stack underflow".to_string())
                    })?;
                    if frame.name != name {
                        return Err(Error::Template(format!(
                            "section {} closed by {{{{/{}}}}} at byte {}",
                            frame.name, name, offset
                        )));
                    }
                    current(&mut stack).push(Node::Section {
                        name: frame.name,
                        inverted: frame.inverted,
                        children: frame.nodes,
                    });
                }
                Tag::Comment => {}
            }

            rest = after;
        }

        text.push_str(rest);
        if !text.is_empty() {
            current(&mut stack).push(Node::Text(text));
        }

        if stack.len() > 1 {
            let unclosed: Vec<&str> = stack[1..].iter().map(|f| f.name.as_str()).collect();
            return Err(Error::Template(format!(
                "unclosed section: {}",
                unclosed.join(", ")
            )));
        }

        let nodes = stack.pop().map(|f| f.nodes).unwrap_or_default();
        Ok(Template { nodes })
    }

    /// Render against a JSON context
    pub fn render(&self, data: &Value) -> String {
        let mut out = String::new();
        let mut stack = vec![data];
        render_nodes(&self.nodes, &mut stack, &mut out);
        out
    }
}

fn current(stack: &mut [Frame]) -> &mut Vec<Node> {
    // The root frame is never popped
    let last = stack.len() - 1;
    &mut stack[last].nodes
}

/// Read one tag whose opening `{{` has been consumed
///
/// Returns the tag and the source following it.
fn read_tag(input: &str, offset: usize) -> Result<(Tag<'_>, &str)> {
    let unclosed = || Error::Template(format!("unclosed tag at byte {}", offset));

    if let Some(inner) = input.strip_prefix('{') {
        let end = inner.find(TRIPLE_CLOSE).ok_or_else(unclosed)?;
        let name = tag_name(&inner[..end], offset)?;
        return Ok((Tag::Variable(name), &inner[end + TRIPLE_CLOSE.len()..]));
    }

    let end = input.find(CLOSE).ok_or_else(unclosed)?;
    let body = &input[..end];
    let after = &input[end + CLOSE.len()..];

    let tag = match body.chars().next() {
        Some('!') => Tag::Comment,
        Some('#') => Tag::Open {
            name: tag_name(&body[1..], offset)?,
            inverted: false,
        },
        Some('^') => Tag::Open {
            name: tag_name(&body[1..], offset)?,
            inverted: true,
        },
        Some('/') => Tag::Close(tag_name(&body[1..], offset)?),
        Some('&') => Tag::Variable(tag_name(&body[1..], offset)?),
        Some('>') => {
            return Err(Error::Template(format!(
                "partials are not supported (byte {})",
                offset
            )))
        }
        Some('=') => {
            return Err(Error::Template(format!(
                "delimiter changes are not supported (byte {})",
                offset
            )))
        }
        _ => Tag::Variable(tag_name(body, offset)?),
    };
    Ok((tag, after))
}

fn tag_name(raw: &str, offset: usize) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::Template(format!("empty tag at byte {}", offset)));
    }
    Ok(name)
}

/// Where the current line begins in `text`, if only blanks precede the tag
fn standalone_line_start(text: &str, text_starts_line: bool) -> Option<usize> {
    let line_start = match text.rfind('\n') {
        Some(i) => i + 1,
        None if text_starts_line => 0,
        None => return None,
    };
    text[line_start..]
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(line_start)
}

/// Source after the end of the current line, if only blanks follow the tag
fn standalone_line_end(after: &str) -> Option<&str> {
    let (line, remaining) = match after.find('\n') {
        Some(i) => (&after[..i], &after[i + 1..]),
        None => (after, ""),
    };
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.chars().all(|c| c == ' ' || c == '\t').then_some(remaining)
}

fn render_nodes<'a>(nodes: &[Node], stack: &mut Vec<&'a Value>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(name) => {
                if let Some(value) = lookup(name, stack) {
                    write_value(value, out);
                }
            }
            Node::Section {
                name,
                inverted,
                children,
            } => {
                let value = lookup(name, stack).filter(|v| is_truthy(v));
                match (value, *inverted) {
                    (None, true) => render_nodes(children, stack, out),
                    (Some(Value::Array(items)), false) => {
                        for item in items {
                            stack.push(item);
                            render_nodes(children, stack, out);
                            stack.pop();
                        }
                    }
                    (Some(value), false) => {
                        stack.push(value);
                        render_nodes(children, stack, out);
                        stack.pop();
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Resolve a (possibly dotted) name against the context stack
fn lookup<'a>(name: &str, stack: &[&'a Value]) -> Option<&'a Value> {
    if name == "." {
        return stack.last().copied();
    }

    let mut parts = name.split('.');
    let first = parts.next()?;
    let mut value = stack.iter().rev().find_map(|&frame| frame.get(first))?;
    for part in parts {
        value = value.get(part)?;
    }
    Some(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

/// Render a template string against JSON data
pub fn render_template(source: &str, data: &Value) -> Result<String> {
    Ok(Template::parse(source)?.render(data))
}

/// Render `mustache_path` with the JSON in `json_path`, writing `output_path`
pub fn render_file(mustache_path: &Path, json_path: &Path, output_path: &Path) -> Result<()> {
    let source = fs::read_to_string(mustache_path)?;
    let data: Value = serde_json::from_str(&fs::read_to_string(json_path)?)?;

    let rendered = render_template(&source, &data)?;
    fs::write(output_path, &rendered)?;

    debug!(
        template = %mustache_path.display(),
        output = %output_path.display(),
        bytes = rendered.len(),
        "rendered template"
    );
    Ok(())
}
