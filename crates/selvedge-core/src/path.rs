//! Path addressing over JSON documents
//!
//! A [`Path`] is a non-empty sequence of string segments. Each segment is a
//! literal key, a numeric index (when the container at that level is an
//! array), or the wildcard `*` which matches every key or index at its level.
//!
//! # Example
//!
//! ```rust
//! use selvedge_core::path::{self, Path};
//! use serde_json::json;
//!
//! let mut doc = json!({});
//! let p = Path::new(["parent", "child"]).unwrap();
//! path::set(&mut doc, &p, json!(1)).unwrap();
//! assert_eq!(path::get(&doc, &p).unwrap(), &json!(1));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result, type_name};

/// Segment that matches every key or index at its level
pub const WILDCARD: &str = "*";

/// A single segment of a [`Path`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object key, or array index when the segment is numeric
    Key(String),
    /// Matches all children
    Wildcard,
}

impl Segment {
    fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(k) => k.parse().ok(),
            Segment::Wildcard => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        if s == WILDCARD {
            Segment::Wildcard
        } else {
            Segment::Key(s.to_string())
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// A non-empty path into a JSON document
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Path(Vec<Segment>);

impl Path {
    /// Build a path from its segments.
    ///
    /// Fails with [`Error::ConfigInvalid`] when no segments are given.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<Segment> = segments
            .into_iter()
            .map(|s| Segment::from(s.as_ref()))
            .collect();
        if segments.is_empty() {
            return Err(Error::config("path", "path must contain at least one segment"));
        }
        Ok(Self(segments))
    }

    /// Segments of this path
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any segment is a wildcard
    pub fn has_wildcard(&self) -> bool {
        self.0.iter().any(|s| *s == Segment::Wildcard)
    }
}

impl TryFrom<Vec<String>> for Path {
    type Error = Error;

    fn try_from(segments: Vec<String>) -> Result<Self> {
        Path::new(segments)
    }
}

impl From<Path> for Vec<String> {
    fn from(path: Path) -> Self {
        path.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

/// Lazy depth-first iterator over every value matched by a path
pub struct Matches<'a, 'p> {
    segments: &'p [Segment],
    stack: Vec<(&'a Value, usize)>,
}

impl<'a> Iterator for Matches<'a, '_> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((value, depth)) = self.stack.pop() {
            let Some(segment) = self.segments.get(depth) else {
                return Some(value);
            };
            let depth = depth + 1;
            // Children are pushed in reverse so they pop in container order.
            match (segment, value) {
                (Segment::Wildcard, Value::Object(map)) => {
                    self.stack.extend(map.values().rev().map(|v| (v, depth)));
                }
                (Segment::Wildcard, Value::Array(items)) => {
                    self.stack.extend(items.iter().rev().map(|v| (v, depth)));
                }
                (Segment::Key(key), Value::Object(map)) => {
                    if let Some(child) = map.get(key) {
                        self.stack.push((child, depth));
                    }
                }
                (seg @ Segment::Key(_), Value::Array(items)) => {
                    if let Some(child) = seg.as_index().and_then(|i| items.get(i)) {
                        self.stack.push((child, depth));
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Every value matched by `path`, in container iteration order
pub fn values<'a, 'p>(document: &'a Value, path: &'p Path) -> Matches<'a, 'p> {
    Matches {
        segments: path.segments(),
        stack: vec![(document, 0)],
    }
}

/// First value matched by `path`
pub fn get<'a>(document: &'a Value, path: &Path) -> Result<&'a Value> {
    values(document, path)
        .next()
        .ok_or_else(|| Error::PathNotFound {
            path: path.to_string(),
        })
}

/// Set the value at `path`, creating missing intermediate objects.
///
/// Existing values at the leaf are overwritten. A `null` intermediate is
/// replaced with an empty object; any other scalar in the way is an error.
pub fn set(document: &mut Value, path: &Path, value: Value) -> Result<()> {
    if path.has_wildcard() {
        return Err(Error::config(
            "path",
            format!("cannot set through wildcard path '{}'", path),
        ));
    }

    let (leaf, parents) = path
        .segments()
        .split_last()
        .ok_or_else(|| Error::config("path", "path must contain at least one segment"))?;

    let mut current = document;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(Default::default());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Default::default())),
            Value::Array(items) => {
                let len = items.len();
                segment
                    .as_index()
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| Error::PathNotFound {
                        path: format!("{} (index '{}' of array with {} items)", path, segment, len),
                    })?
            }
            other => {
                return Err(Error::TypeMismatch {
                    value: other.to_string(),
                    expected: "object",
                    found: type_name(other),
                });
            }
        };
    }

    if current.is_null() {
        *current = Value::Object(Default::default());
    }
    match current {
        Value::Object(map) => {
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::Array(items) => match leaf.as_index() {
            Some(i) if i < items.len() => {
                items[i] = value;
                Ok(())
            }
            Some(i) if i == items.len() => {
                items.push(value);
                Ok(())
            }
            _ => Err(Error::PathNotFound {
                path: path.to_string(),
            }),
        },
        other => Err(Error::TypeMismatch {
            value: other.to_string(),
            expected: "object",
            found: type_name(other),
        }),
    }
}

/// Delete every value matched by `path`.
///
/// Returns how many values were removed. An absent path is a no-op.
pub fn delete(document: &mut Value, path: &Path) -> usize {
    delete_at(document, path.segments())
}

fn delete_at(current: &mut Value, segments: &[Segment]) -> usize {
    let Some((segment, rest)) = segments.split_first() else {
        return 0;
    };

    if rest.is_empty() {
        return match (segment, current) {
            (Segment::Wildcard, Value::Object(map)) => {
                let n = map.len();
                map.clear();
                n
            }
            (Segment::Wildcard, Value::Array(items)) => {
                let n = items.len();
                items.clear();
                n
            }
            (Segment::Key(key), Value::Object(map)) => usize::from(map.remove(key).is_some()),
            (seg @ Segment::Key(_), Value::Array(items)) => match seg.as_index() {
                Some(i) if i < items.len() => {
                    items.remove(i);
                    1
                }
                _ => 0,
            },
            _ => 0,
        };
    }

    match (segment, current) {
        (Segment::Wildcard, Value::Object(map)) => {
            map.values_mut().map(|child| delete_at(child, rest)).sum()
        }
        (Segment::Wildcard, Value::Array(items)) => {
            items.iter_mut().map(|child| delete_at(child, rest)).sum()
        }
        (Segment::Key(key), Value::Object(map)) => map
            .get_mut(key)
            .map(|child| delete_at(child, rest))
            .unwrap_or(0),
        (seg @ Segment::Key(_), Value::Array(items)) => seg
            .as_index()
            .and_then(|i| items.get_mut(i))
            .map(|child| delete_at(child, rest))
            .unwrap_or(0),
        _ => 0,
    }
}
