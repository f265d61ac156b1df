//! Building blocks shared by every AST node: identities, formatting and
//! delimited lists.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a tree node.
///
/// Every node gets a fresh id when it is created; ids survive copy-on-write
/// rebuilds of ancestors, so they address a node across tree versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whitespace and comments, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Space(String);

impl Space {
    pub fn new(text: impl Into<String>) -> Self {
        Space(text.into())
    }

    pub fn empty() -> Self {
        Space(String::new())
    }

    /// A single blank.
    pub fn single() -> Self {
        Space(" ".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_newline(&self) -> bool {
        self.0.contains('\n')
    }

    /// The indentation of the line this space ends on, if it contains a line
    /// break.
    pub fn indent(&self) -> Option<&str> {
        let (_, last) = self.0.rsplit_once('\n')?;
        Some(last)
    }

    /// Everything up to and including the last line break.
    pub fn before_last_line(&self) -> &str {
        match self.0.rfind('\n') {
            Some(i) => &self.0[..=i],
            None => "",
        }
    }

    /// Replace the indentation of the last line with `indent`.
    ///
    /// Spaces without a line break are returned unchanged.
    pub fn with_indent(&self, indent: &str) -> Space {
        if self.has_newline() {
            Space(format!("{}{}", self.before_last_line(), indent))
        } else {
            self.clone()
        }
    }

    /// Re-indent every line break inside this space: lines that started with
    /// `from` now start with `to`.
    pub fn reindent(&self, from: &str, to: &str) -> Space {
        if !self.has_newline() || from == to {
            return self.clone();
        }
        let mut out = String::with_capacity(self.0.len());
        let mut lines = self.0.split('\n');
        if let Some(first) = lines.next() {
            out.push_str(first);
        }
        for line in lines {
            out.push('\n');
            match line.strip_prefix(from) {
                Some(rest) => {
                    out.push_str(to);
                    out.push_str(rest);
                }
                None => out.push_str(line),
            }
        }
        Space(out)
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Space {
    fn from(s: &str) -> Self {
        Space(s.to_string())
    }
}

/// An identifier occurrence with its leading whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub prefix: Space,
    pub text: String,
}

impl Name {
    pub fn new(prefix: Space, text: impl Into<String>) -> Self {
        Self {
            prefix,
            text: text.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// An element followed by the whitespace that precedes its separator.
#[derive(Debug, Clone, PartialEq)]
pub struct Padded<T> {
    pub elem: T,
    /// Whitespace before the following `,` (or closing delimiter for the last
    /// element).
    pub after: Space,
}

impl<T> Padded<T> {
    pub fn new(elem: T) -> Self {
        Self {
            elem,
            after: Space::empty(),
        }
    }
}

/// A delimited, comma-separated list such as `(a, b)` or `<K, V>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Container<T> {
    /// Whitespace before the opening delimiter.
    pub before: Space,
    pub elems: Vec<Padded<T>>,
    /// Whitespace before the closing delimiter when the list is empty.
    pub close: Space,
}

impl<T> Container<T> {
    pub fn new(elems: Vec<T>) -> Self {
        Self {
            before: Space::empty(),
            elems: elems.into_iter().map(Padded::new).collect(),
            close: Space::empty(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elems.iter().map(|p| &p.elem)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elems.get(index).map(|p| &p.elem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn space_indentation() {
        let space = Space::new("\n    ");
        assert_eq!(space.indent(), Some("    "));
        assert_eq!(Space::single().indent(), None);
        assert_eq!(space.with_indent("\t").as_str(), "\n\t");
    }

    #[test]
    fn space_reindent() {
        let space = Space::new(" // note\n        ");
        assert_eq!(space.reindent("        ", "    ").as_str(), " // note\n    ");
        assert_eq!(Space::single().reindent("", "  "), Space::single());
    }

    #[test]
    fn container_accessors() {
        let c = Container::new(vec![1, 2, 3]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(1), Some(&2));
        assert_eq!(c.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(Container::<i32>::empty().is_empty());
    }
}
