//! Container-rooted hierarchical paths (spec §3, §4.1).
//!
//! A [`Path`] is `(container, [element...])`: immutable, ordered, with `/`
//! as the logical separator. The first element is the `container` — the
//! unit that maps onto a backend namespace (bucket, container, collection,
//! directory, topic).

use std::fmt;

/// A container-rooted hierarchical path.
///
/// `PathElements.length >= 1`: a `Path` always has at least a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    elements: Vec<String>,
}

impl Path {
    /// Build a path from a container and its child elements.
    ///
    /// # Panics
    ///
    /// Panics if `container` is empty — a path with no elements violates
    /// the `PathElements.length >= 1` invariant and indicates a caller bug,
    /// not a recoverable condition.
    pub fn new(container: impl Into<String>, elements: impl IntoIterator<Item = String>) -> Self {
        let container = container.into();
        assert!(!container.is_empty(), "path container must not be empty");
        let mut v = Vec::with_capacity(1 + elements.into_iter().size_hint().0);
        v.push(container);
        v.extend(elements);
        Path { elements: v }
    }

    /// Build a path with no child elements, i.e. the container itself.
    pub fn root(container: impl Into<String>) -> Self {
        Self::new(container, std::iter::empty())
    }

    /// The container (first element).
    pub fn container(&self) -> &str {
        &self.elements[0]
    }

    /// All elements, container included, in order.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Elements after the container (the "key" portion on the backend).
    pub fn key_elements(&self) -> &[String] {
        &self.elements[1..]
    }

    /// The parent path, or `None` if this path is just the container.
    pub fn parent(&self) -> Option<Path> {
        if self.elements.len() <= 1 {
            None
        } else {
            Some(Path {
                elements: self.elements[..self.elements.len() - 1].to_vec(),
            })
        }
    }

    /// The final path element (the file or directory's own name).
    pub fn name(&self) -> &str {
        self.elements.last().expect("path always has >= 1 element")
    }

    /// Whether this path denotes a directory.
    ///
    /// The path model itself cannot distinguish files from directories —
    /// that's determined by backend state (§4.3 `directoryExists`). This
    /// helper is here for callers that already know the answer (e.g. after
    /// a `visitChildren` listing) and want a readable spelling of intent.
    pub fn is_container_root(&self) -> bool {
        self.elements.len() == 1
    }

    /// The fully qualified name: elements joined by `/`.
    ///
    /// Two paths compare equal by full qualified name; callers that need
    /// backend-specific lowercase normalization should normalize before
    /// comparing (not all backends require it — see `validate`).
    pub fn full_qualified_name(&self) -> String {
        self.elements.join("/")
    }

    /// The key portion (everything after the container) joined by `/`.
    ///
    /// This is the string the blob codec (C2) builds backend keys from.
    pub fn key_path(&self) -> String {
        self.key_elements().join("/")
    }

    /// Build a child path by appending one element.
    pub fn child(&self, element: impl Into<String>) -> Path {
        let mut elements = self.elements.clone();
        elements.push(element.into());
        Path { elements }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_qualified_name())
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.full_qualified_name().cmp(&other.full_qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_and_elements() {
        let p = Path::new("bkt", vec!["d1".to_string(), "f1.txt".to_string()]);
        assert_eq!(p.container(), "bkt");
        assert_eq!(p.elements(), &["bkt", "d1", "f1.txt"]);
        assert_eq!(p.key_elements(), &["d1", "f1.txt"]);
        assert_eq!(p.key_path(), "d1/f1.txt");
        assert_eq!(p.full_qualified_name(), "bkt/d1/f1.txt");
    }

    #[test]
    fn parent_of_root_is_none() {
        let p = Path::root("bkt");
        assert!(p.parent().is_none());
        assert!(p.is_container_root());
    }

    #[test]
    fn parent_strips_last_element() {
        let p = Path::new("bkt", vec!["d1".to_string(), "f1.txt".to_string()]);
        let parent = p.parent().unwrap();
        assert_eq!(parent.full_qualified_name(), "bkt/d1");
        assert_eq!(parent.name(), "d1");
    }

    #[test]
    fn child_appends_element() {
        let p = Path::root("bkt").child("d1").child("f1.txt");
        assert_eq!(p.full_qualified_name(), "bkt/d1/f1.txt");
    }

    #[test]
    fn ordering_is_by_full_qualified_name() {
        let a = Path::new("bkt", vec!["a".to_string()]);
        let b = Path::new("bkt", vec!["b".to_string()]);
        assert!(a < b);
    }

    #[test]
    #[should_panic(expected = "container must not be empty")]
    fn empty_container_panics() {
        let _ = Path::new("", Vec::<String>::new());
    }
}
