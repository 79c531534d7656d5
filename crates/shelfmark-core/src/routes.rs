//! Named route table.
//!
//! Maps symbolic route names to path templates such as `/catalog/book/{id}`
//! and reverses a name plus arguments back into a concrete path. Reversing is
//! pure string interpolation; nothing here performs I/O.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

pub const INDEX: &str = "index";
pub const BOOKS: &str = "books";
pub const BOOK_DETAIL: &str = "book-detail";
pub const AUTHORS: &str = "authors";
pub const AUTHOR_DETAIL: &str = "author-detail";
pub const MY_BORROWED: &str = "my-borrowed";
pub const ALL_BORROWED: &str = "all-borrowed";
pub const RENEW_BOOK_LIBRARIAN: &str = "renew-book-librarian";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template where `{name}` marks a parameter.
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                Error::InvalidData(format!("unclosed '{{' in route template: {template}"))
            })?;
            let name = &after[..close];
            if name.is_empty() || name.contains('{') {
                return Err(Error::InvalidData(format!(
                    "bad parameter in route template: {template}"
                )));
            }
            segments.push(Segment::Param(name.to_string()));
            rest = &after[close + 1..];
        }

        if rest.contains('}') {
            return Err(Error::InvalidData(format!(
                "unmatched '}}' in route template: {template}"
            )));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of parameters the template expects.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Param(_)))
            .count()
    }

    /// Fill parameters positionally. Returns `None` on an argument count mismatch.
    fn render<A: fmt::Display>(&self, args: &[A]) -> Option<String> {
        if args.len() != self.arity() {
            return None;
        }
        let mut args = args.iter();
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(_) => out.push_str(&args.next()?.to_string()),
            }
        }
        Some(out)
    }
}

/// Registry of route name to path template.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, PathTemplate>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog's routes, mounted under `prefix` (e.g. `/catalog`).
    #[must_use]
    pub fn catalog(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let mut table = Self::new();
        for (name, path) in [
            (INDEX, "/"),
            (BOOKS, "/books/"),
            (BOOK_DETAIL, "/book/{id}"),
            (AUTHORS, "/authors/"),
            (AUTHOR_DETAIL, "/author/{id}"),
            (MY_BORROWED, "/mybooks/"),
            (ALL_BORROWED, "/borrowed/"),
            (RENEW_BOOK_LIBRARIAN, "/book/{id}/renew/"),
        ] {
            let template = PathTemplate::parse(&format!("{prefix}{path}"));
            // Prefixes containing braces are rejected; keep the route table usable.
            match template {
                Ok(template) => {
                    table.routes.insert(name.to_string(), template);
                }
                Err(err) => log::warn!("Skipping route {}: {}", name, err),
            }
        }
        table
    }

    /// Register (or replace) a named route.
    pub fn register(&mut self, name: impl Into<String>, template: &str) -> Result<()> {
        let template = PathTemplate::parse(template)?;
        self.routes.insert(name.into(), template);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PathTemplate> {
        self.routes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Build the path for `name`, filling its parameters from `args` in order.
    pub fn reverse<A: fmt::Display>(&self, name: &str, args: &[A]) -> Result<String> {
        self.routes
            .get(name)
            .and_then(|template| template.render(args))
            .ok_or_else(|| Error::NoReverseMatch {
                name: name.to_string(),
            })
    }
}
