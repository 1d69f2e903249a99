// src/pipeline/spec.rs - Parser for textual pipeline specs
//
//   pipeline   := node ( '|' node )*
//   node       := identifier ( identifier '=' quoted )*
//   identifier := [A-Za-z][A-Za-z0-9_]*
//   quoted     := '"' .. '"' | '\'' .. '\''   (backslash escapes the next char)

use crate::error::BuildError;
use indexmap::IndexMap;
use std::fmt;

/// Parsed description of one stage, before it is instantiated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub params: IndexMap<String, String>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        NodeSpec {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in &self.params {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, " {}=\"{}\"", key, escaped)?;
        }
        Ok(())
    }
}

/// Parse a pipeline spec into its node list. Blank input yields no nodes.
pub fn parse_pipeline(spec: &str) -> Result<Vec<NodeSpec>, BuildError> {
    if spec.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut parser = SpecParser::new(spec);
    let mut nodes = vec![parser.node()?];

    loop {
        parser.skip_whitespace();
        match parser.peek() {
            None => break,
            Some('|') => {
                parser.bump();
                nodes.push(parser.node()?);
            }
            Some(ch) => return Err(parser.error(format!("unexpected character '{}'", ch))),
        }
    }

    Ok(nodes)
}

struct SpecParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SpecParser<'a> {
    fn new(input: &'a str) -> Self {
        SpecParser { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: String) -> BuildError {
        BuildError::SyntaxError {
            position: self.pos,
            message,
        }
    }

    fn node(&mut self) -> Result<NodeSpec, BuildError> {
        self.skip_whitespace();
        let name = self.identifier("stage name")?;
        let mut node = NodeSpec::new(name);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(ch) if ch.is_ascii_alphabetic() => {
                    let key = self.identifier("parameter name")?;
                    self.skip_whitespace();
                    if self.peek() != Some('=') {
                        return Err(self.error(format!("expected '=' after parameter '{}'", key)));
                    }
                    self.bump();
                    self.skip_whitespace();
                    let value = self.quoted()?;
                    node.params.insert(key, value);
                }
                _ => break,
            }
        }

        Ok(node)
    }

    fn identifier(&mut self, what: &str) -> Result<String, BuildError> {
        let start = self.pos;
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.bump();
            }
            Some(ch) => return Err(self.error(format!("expected {}, found '{}'", what, ch))),
            None => return Err(self.error(format!("expected {}, found end of input", what))),
        }
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn quoted(&mut self) -> Result<String, BuildError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(ch @ ('"' | '\'')) => ch,
            Some(ch) => return Err(self.error(format!("expected quoted value, found '{}'", ch))),
            None => return Err(self.error("expected quoted value, found end of input".to_string())),
        };
        self.bump();

        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                Some(ch) if ch == quote => return Ok(value),
                Some(ch) => value.push(ch),
                None => break,
            }
        }

        Err(BuildError::SyntaxError {
            position: start,
            message: "unterminated quoted value".to_string(),
        })
    }
}
