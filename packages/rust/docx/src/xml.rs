//! WordprocessingML tokenizer.
//!
//! A part is split into markup and run text (`<w:t>` content). Placeholders
//! that Word split across several runs are merged into the first run before
//! the text is cut into [`Token`]s.

use biddoc_shared::{BidDocError, Result};

/// Opening tag written for every run text element, so leading and trailing
/// spaces survive substitution.
const PRESERVED_TEXT_OPEN: &str = r#"<w:t xml:space="preserve">"#;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    Markup(String),
    Text(String),
}

impl Piece {
    fn content_mut(&mut self) -> &mut String {
        match self {
            Self::Markup(s) | Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tag {
    /// `{name}`
    Value(String),
    /// `{#name}`
    Open(String),
    /// `{^name}`
    Inverted(String),
    /// `{/name}`
    Close(String),
}

impl Tag {
    fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (sigil, name) = match trimmed.chars().next() {
            Some(c @ ('#' | '^' | '/')) => (Some(c), trimmed[1..].trim()),
            _ => (None, trimmed),
        };
        if name.is_empty() {
            return Err(BidDocError::render(format!("empty tag {{{raw}}}")));
        }
        let name = name.to_string();
        Ok(match sigil {
            Some('#') => Self::Open(name),
            Some('^') => Self::Inverted(name),
            Some(_) => Self::Close(name),
            None => Self::Value(name),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Markup(String),
    Text(String),
    Tag(Tag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element<'a> {
    Open(&'a str),
    Close(&'a str),
    Empty(&'a str),
}

/// Classify a single `<...>` markup string. Declarations, comments and
/// processing instructions yield `None`.
pub(crate) fn element(markup: &str) -> Option<Element<'_>> {
    let inner = markup.strip_prefix('<')?.strip_suffix('>')?;
    if inner.starts_with('?') || inner.starts_with('!') {
        return None;
    }
    if let Some(name) = inner.strip_prefix('/') {
        return Some(Element::Close(name.trim()));
    }
    let name = inner
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .filter(|n| !n.is_empty())?;
    if inner.ends_with('/') {
        Some(Element::Empty(name))
    } else {
        Some(Element::Open(name))
    }
}

pub(crate) fn token_element(token: &Token) -> Option<Element<'_>> {
    match token {
        Token::Markup(m) => element(m),
        _ => None,
    }
}

/// Split a part into markup and run text.
pub(crate) fn split_pieces(xml: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut in_text = false;
    let mut rest = xml;

    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let end = rest
                    .find('>')
                    .ok_or_else(|| BidDocError::template("unterminated XML markup"))?;
                let markup = &rest[..=end];
                match element(markup) {
                    Some(Element::Open("w:t")) => {
                        in_text = true;
                        pieces.push(Piece::Markup(PRESERVED_TEXT_OPEN.into()));
                    }
                    Some(Element::Close("w:t")) => {
                        in_text = false;
                        pieces.push(Piece::Markup(markup.into()));
                    }
                    _ => pieces.push(Piece::Markup(markup.into())),
                }
                rest = &rest[end + 1..];
            }
            next => {
                let end = next.unwrap_or(rest.len());
                let chars = rest[..end].to_string();
                pieces.push(if in_text {
                    Piece::Text(chars)
                } else {
                    Piece::Markup(chars)
                });
                rest = &rest[end..];
            }
        }
    }
    Ok(pieces)
}

/// Move every placeholder that spans several run texts into the run where
/// it starts.
fn merge_split_tags(pieces: &mut [Piece]) -> Result<()> {
    let texts: Vec<usize> = pieces
        .iter()
        .enumerate()
        .filter_map(|(i, p)| matches!(p, Piece::Text(_)).then_some(i))
        .collect();

    for (n, &i) in texts.iter().enumerate() {
        let mut pos = 0;
        loop {
            let current = pieces[i].content_mut();
            let Some(open) = current[pos..].find('{').map(|o| pos + o) else {
                break;
            };
            if let Some(close) = current[open..].find('}') {
                pos = open + close + 1;
                continue;
            }

            let fragment = current[open..].to_string();
            let mut closed = false;
            for &j in &texts[n + 1..] {
                let next = std::mem::take(pieces[j].content_mut());
                match next.find('}') {
                    Some(c) => {
                        pieces[i].content_mut().push_str(&next[..=c]);
                        *pieces[j].content_mut() = next[c + 1..].to_string();
                        closed = true;
                        break;
                    }
                    None => pieces[i].content_mut().push_str(&next),
                }
            }
            if !closed {
                return Err(BidDocError::render(format!("unclosed tag {fragment}")));
            }
            pos = open;
        }
    }
    Ok(())
}

fn split_tags(text: &str, tokens: &mut Vec<Token>) -> Result<()> {
    let mut rest = text;
    while !rest.is_empty() {
        match (rest.find('{'), rest.find('}')) {
            (None, None) => {
                tokens.push(Token::Text(rest.to_string()));
                break;
            }
            (Some(o), None) => {
                return Err(BidDocError::render(format!("unclosed tag {}", &rest[o..])));
            }
            (None, Some(c)) => {
                return Err(BidDocError::render(format!("unopened tag {}", &rest[..=c])));
            }
            (Some(o), Some(c)) if c < o => {
                return Err(BidDocError::render(format!("unopened tag {}", &rest[..=c])));
            }
            (Some(o), Some(c)) => {
                if o > 0 {
                    tokens.push(Token::Text(rest[..o].to_string()));
                }
                tokens.push(Token::Tag(Tag::parse(&rest[o + 1..c])?));
                rest = &rest[c + 1..];
            }
        }
    }
    Ok(())
}

/// Tokenize a part, merging split placeholders first.
pub(crate) fn tokenize(xml: &str) -> Result<Vec<Token>> {
    let mut pieces = split_pieces(xml)?;
    merge_split_tags(&mut pieces)?;

    let mut tokens = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Markup(m) => tokens.push(Token::Markup(m)),
            Piece::Text(t) => split_tags(&t, &mut tokens)?,
        }
    }
    Ok(tokens)
}

/// Inclusive token range of the innermost `name` element around `idx`.
pub(crate) fn enclosing(tokens: &[Token], idx: usize, name: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut start = None;
    for i in (0..idx).rev() {
        match token_element(&tokens[i]) {
            Some(Element::Close(n)) if n == name => depth += 1,
            Some(Element::Open(n)) if n == name => {
                if depth == 0 {
                    start = Some(i);
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    let start = start?;

    depth = 0;
    for (i, token) in tokens.iter().enumerate().skip(idx + 1) {
        match token_element(token) {
            Some(Element::Open(n)) if n == name => depth += 1,
            Some(Element::Close(n)) if n == name => {
                if depth == 0 {
                    return Some((start, i));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
