//! Placeholder templates.
//!
//! Grammar, independent of any target language:
//!
//! - `{ident}` with `ident = [A-Za-z_][A-Za-z0-9_]*` is a placeholder;
//! - `{{` and `}}` are a literal `{` and `}`;
//! - any other brace is literal text, so target code such as
//!   `fn main() {` needs no escaping.
//!
//! Templates are parsed once when a backend is loaded and rendered many
//! times. Substitution is purely textual.

use crate::error::{ConvertError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

/// Named values supplied to a render. Lookup is linear; a render never has
/// more than a handful of bindings.
#[derive(Clone, Debug, Default)]
pub struct Bindings<'a> {
    values: Vec<(&'a str, String)>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Bindings { values: Vec::new() }
    }

    pub fn with(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &'a str, value: impl Into<String>) {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Template {
    pub fn parse(name: &str, text: &str) -> Self {
        let mut segments = Vec::new();
        let mut text_buf = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text_buf.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text_buf.push('}');
                }
                '{' => {
                    let rest = &text[i + 1..];
                    let ident_len = rest
                        .char_indices()
                        .find(|&(j, ch)| {
                            if j == 0 {
                                !is_ident_start(ch)
                            } else {
                                !is_ident_char(ch)
                            }
                        })
                        .map(|(j, _)| j)
                        .unwrap_or(rest.len());
                    if ident_len > 0 && rest[ident_len..].starts_with('}') {
                        if !text_buf.is_empty() {
                            segments.push(Segment::Text(std::mem::take(&mut text_buf)));
                        }
                        segments.push(Segment::Placeholder(rest[..ident_len].to_string()));
                        // skip ident and closing brace
                        for _ in 0..=ident_len {
                            chars.next();
                        }
                    } else {
                        text_buf.push('{');
                    }
                }
                _ => text_buf.push(c),
            }
        }
        if !text_buf.is_empty() {
            segments.push(Segment::Text(text_buf));
        }
        Template {
            name: name.to_string(),
            segments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if let Segment::Placeholder(p) = seg {
                if !out.contains(&p.as_str()) {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Fail on the first placeholder outside `vocabulary`.
    pub fn check(&self, vocabulary: &[&str]) -> Result<()> {
        for p in self.placeholders() {
            if !vocabulary.contains(&p) {
                return Err(ConvertError::UnresolvedPlaceholder {
                    template: self.name.clone(),
                    placeholder: p.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn render(&self, bindings: &Bindings) -> Result<String> {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Text(t) => out.push_str(t),
                Segment::Placeholder(p) => match bindings.get(p) {
                    Some(v) => out.push_str(v),
                    None => {
                        return Err(ConvertError::UnresolvedPlaceholder {
                            template: self.name.clone(),
                            placeholder: p.clone(),
                        })
                    }
                },
            }
        }
        Ok(out)
    }

    /// Render only the text before the first occurrence of `placeholder`.
    /// `None` when the template does not use it.
    pub fn render_prefix(&self, placeholder: &str, bindings: &Bindings) -> Result<Option<String>> {
        let cut = self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Placeholder(p) if p == placeholder));
        let Some(cut) = cut else {
            return Ok(None);
        };
        let head = Template {
            name: self.name.clone(),
            segments: self.segments[..cut].to_vec(),
        };
        head.render(bindings).map(Some)
    }
}
