//! Placeholder and section expansion over a tokenized part.

use biddoc_shared::{BidDocError, Result};
use serde_json::Value;

use crate::EngineOptions;
use crate::xml::{Tag, Token, enclosing, escape, tokenize};

/// Markup closing the current run text, emitting a break, and reopening it.
const LINE_BREAK: &str = r#"</w:t><w:br/><w:t xml:space="preserve">"#;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Raw(String),
    Value(String),
    Section {
        name: String,
        inverted: bool,
        body: Vec<Node>,
    },
}

/// Half-open token range repeated by a section.
#[derive(Debug)]
struct Span {
    name: String,
    inverted: bool,
    start: usize,
    end: usize,
}

/// Render one XML part against `root`.
pub(crate) fn render_part(xml: &str, root: &Value, options: EngineOptions) -> Result<String> {
    let tokens = tokenize(xml)?;
    let mut skip = vec![false; tokens.len()];

    let mut spans = pair_sections(&tokens)?
        .into_iter()
        .map(|(open, close)| locate(&tokens, open, close, options, &mut skip))
        .collect::<Vec<_>>();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let nodes = build_nodes(&tokens, &spans, &skip, 0, tokens.len())?;

    let mut out = String::with_capacity(xml.len());
    let mut scopes = vec![root];
    render_nodes(&nodes, &mut scopes, options, &mut out)?;
    Ok(out)
}

/// Match every `{#x}` / `{^x}` with its `{/x}`.
fn pair_sections(tokens: &[Token]) -> Result<Vec<(usize, usize)>> {
    let mut stack: Vec<(&str, usize)> = Vec::new();
    let mut pairs = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Tag(Tag::Open(name) | Tag::Inverted(name)) => stack.push((name.as_str(), i)),
            Token::Tag(Tag::Close(name)) => match stack.pop() {
                Some((open, start)) if open == name.as_str() => pairs.push((start, i)),
                Some((open, _)) => {
                    return Err(BidDocError::render(format!(
                        "unmatched loop: {{#{open}}} closed by {{/{name}}}"
                    )));
                }
                None => {
                    return Err(BidDocError::render(format!("unopened loop {{/{name}}}")));
                }
            },
            _ => {}
        }
    }
    if let Some((name, _)) = stack.pop() {
        return Err(BidDocError::render(format!("unclosed loop {{#{name}}}")));
    }
    Ok(pairs)
}

/// Decide how far a section reaches.
///
/// Tags in different cells repeat whole table rows. With paragraph loops
/// enabled, tags that each stand alone in their own paragraph repeat the
/// paragraphs between them and the tag paragraphs are dropped. Anything
/// else repeats exactly the markup between the tags; across paragraphs
/// each copy closes the current paragraph and reopens the next, so text
/// before `{#x}` and after `{/x}` appears once.
fn locate(
    tokens: &[Token],
    open: usize,
    close: usize,
    options: EngineOptions,
    skip: &mut [bool],
) -> Span {
    skip[open] = true;
    skip[close] = true;
    let (name, inverted) = match &tokens[open] {
        Token::Tag(Tag::Inverted(name)) => (name.clone(), true),
        Token::Tag(Tag::Open(name) | Tag::Value(name) | Tag::Close(name)) => (name.clone(), false),
        _ => (String::new(), false),
    };

    let rows = (
        enclosing(tokens, open, "w:tr"),
        enclosing(tokens, close, "w:tr"),
    );
    let cells = (
        enclosing(tokens, open, "w:tc"),
        enclosing(tokens, close, "w:tc"),
    );
    if let (Some(first), Some(last)) = rows {
        if cells.0 != cells.1 {
            return Span {
                name,
                inverted,
                start: first.0,
                end: last.1 + 1,
            };
        }
    }

    match (
        enclosing(tokens, open, "w:p"),
        enclosing(tokens, close, "w:p"),
    ) {
        (Some(first), Some(last))
            if first != last
                && options.paragraph_loop
                && alone(tokens, first, open)
                && alone(tokens, last, close) =>
        {
            skip[first.0..=first.1].fill(true);
            skip[last.0..=last.1].fill(true);
            Span {
                name,
                inverted,
                start: first.0,
                end: last.1 + 1,
            }
        }
        _ => Span {
            name,
            inverted,
            start: open,
            end: close + 1,
        },
    }
}

/// Whether the tag at `tag` is the only content of paragraph `range`.
fn alone(tokens: &[Token], range: (usize, usize), tag: usize) -> bool {
    tokens[range.0..=range.1]
        .iter()
        .enumerate()
        .all(|(offset, token)| match token {
            Token::Tag(_) => range.0 + offset == tag,
            Token::Text(text) => text.trim().is_empty(),
            Token::Markup(_) => true,
        })
}

/// Build the node tree for tokens `[start, end)`; `spans` are the sections
/// inside that range, sorted outermost first.
fn build_nodes(
    tokens: &[Token],
    spans: &[Span],
    skip: &[bool],
    start: usize,
    end: usize,
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut idx = start;
    let mut k = 0;

    while idx < end {
        if let Some(span) = spans.get(k).filter(|s| s.start == idx) {
            let mut inner = k + 1;
            while let Some(next) = spans.get(inner).filter(|s| s.start < span.end) {
                if next.end > span.end {
                    return Err(BidDocError::render(format!(
                        "loops {{#{}}} and {{#{}}} overlap",
                        span.name, next.name
                    )));
                }
                inner += 1;
            }
            let body = build_nodes(tokens, &spans[k + 1..inner], skip, span.start, span.end)?;
            nodes.push(Node::Section {
                name: span.name.clone(),
                inverted: span.inverted,
                body,
            });
            idx = span.end;
            k = inner;
            continue;
        }

        if !skip[idx] {
            match &tokens[idx] {
                Token::Markup(s) | Token::Text(s) => match nodes.last_mut() {
                    Some(Node::Raw(raw)) => raw.push_str(s),
                    _ => nodes.push(Node::Raw(s.clone())),
                },
                Token::Tag(Tag::Value(name)) => nodes.push(Node::Value(name.clone())),
                Token::Tag(_) => {}
            }
        }
        idx += 1;
    }
    Ok(nodes)
}

fn lookup<'v>(scopes: &[&'v Value], name: &str) -> Option<&'v Value> {
    if name == "." {
        return scopes.last().copied();
    }
    let mut parts = name.split('.');
    let first = parts.next()?;
    let mut value = scopes.iter().rev().copied().find_map(|scope| scope.get(first))?;
    for part in parts {
        value = value.get(part)?;
    }
    Some(value)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn push_text(text: &str, options: EngineOptions, out: &mut String) {
    let escaped = escape(&text.replace('\r', ""));
    if options.linebreaks {
        out.push_str(&escaped.replace('\n', LINE_BREAK));
    } else {
        out.push_str(&escaped);
    }
}

fn render_nodes<'v>(
    nodes: &[Node],
    scopes: &mut Vec<&'v Value>,
    options: EngineOptions,
    out: &mut String,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Raw(xml) => out.push_str(xml),
            Node::Value(name) => {
                let value = lookup(scopes, name).ok_or_else(|| {
                    BidDocError::render(format!("unresolved placeholder {{{name}}}"))
                })?;
                let text = scalar_text(value).ok_or_else(|| {
                    BidDocError::render(format!("placeholder {{{name}}} is not a scalar value"))
                })?;
                push_text(&text, options, out);
            }
            Node::Section {
                name,
                inverted,
                body,
            } => {
                let value = lookup(scopes, name).ok_or_else(|| {
                    BidDocError::render(format!("unresolved loop {{#{name}}}"))
                })?;
                if *inverted {
                    if !truthy(value) {
                        render_nodes(body, scopes, options, out)?;
                    }
                    continue;
                }
                match value {
                    Value::Array(items) => {
                        for item in items {
                            scopes.push(item);
                            render_nodes(body, scopes, options, out)?;
                            scopes.pop();
                        }
                    }
                    Value::Object(_) => {
                        scopes.push(value);
                        render_nodes(body, scopes, options, out)?;
                        scopes.pop();
                    }
                    other if truthy(other) => render_nodes(body, scopes, options, out)?,
                    _ => {}
                }
            }
        }
    }
    Ok(())
}
