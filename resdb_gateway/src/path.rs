//! Lookup of nested values in untyped JSON documents.

use serde_json::Value;
use std::fmt;

/// One step into a document: an object key or an array index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'p> {
    Key(&'p str),
    Index(usize),
}

impl fmt::Display for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(k) => write!(f, "{}", k),
            Step::Index(i) => write!(f, "{}", i),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    /// The dotted prefix of the path that could not be resolved
    Missing(String),
}

impl<'a> Lookup<'a> {
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::Missing(_) => None,
        }
    }
}

/// Walk `path` from `root`. JSON `null` counts as absent.
pub fn lookup<'a>(root: &'a Value, path: &[Step<'_>]) -> Lookup<'a> {
    let mut current = root;
    for (depth, step) in path.iter().enumerate() {
        let next = match (step, current) {
            (Step::Key(k), Value::Object(map)) => map.get(*k),
            (Step::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        };
        match next {
            Some(v) if !v.is_null() => current = v,
            _ => return Lookup::Missing(dotted(&path[..=depth])),
        }
    }
    Lookup::Found(current)
}

pub fn dotted(path: &[Step<'_>]) -> String {
    path.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
