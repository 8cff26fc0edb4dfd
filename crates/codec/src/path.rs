//! Field paths attached to decode failures.

use std::sync::Arc;

/// One step of a path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(Arc<str>),
    Index(usize),
}

impl Segment {
    pub fn key(name: &str) -> Self {
        Self::Key(Arc::from(name))
    }
}

impl core::fmt::Display for Segment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct Node {
    segment: Segment,
    rest: Path,
}

/// Ordered sequence of segments, outermost first.
///
/// Paths are persistent cons lists: combinators prepend their own segment while a
/// failure propagates outward, and the tail is shared rather than copied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    head: Option<Arc<Node>>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.head.is_none()
    }

    /// Returns a new path with `segment` in front of `self`.
    pub fn prepend(&self, segment: Segment) -> Self {
        Self {
            head: Some(Arc::new(Node {
                segment,
                rest: self.clone(),
            })),
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// Innermost segment (the offending field itself).
    pub fn last(&self) -> Option<&Segment> {
        self.iter().last()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.is_root()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let segments: Vec<Segment> = iter.into_iter().collect();
        segments
            .into_iter()
            .rev()
            .fold(Path::root(), |path, segment| path.prepend(segment))
    }
}

impl core::fmt::Display for Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (idx, segment) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

pub struct Iter<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Segment;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.rest.head.as_deref();
        Some(&node.segment)
    }
}
