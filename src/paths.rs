//! The two addressing schemes carried through a walk.
//!
//! [`LogicalPath`] is index-free and schema-relative (`name.given`); it is
//! what schema lookups and labels use. [`DocumentPointer`] is an RFC 6901
//! pointer into the raw document (`/entry/0/resource/name/1/given/0`).
//! Array indices are only ever pushed onto the pointer.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// Path of the record root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PointerToken {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocumentPointer {
    tokens: Vec<PointerToken>,
}

impl DocumentPointer {
    /// Pointer to the whole document (`""`).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, name: &str) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(PointerToken::Key(name.to_string()));
        Self { tokens }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(PointerToken::Index(index));
        Self { tokens }
    }

    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    pub fn index_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, PointerToken::Index(_)))
            .count()
    }
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for DocumentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                PointerToken::Key(key) => write!(f, "/{}", escape_token(key))?,
                PointerToken::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}
