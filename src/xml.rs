//! Namespace-aware manifest tree navigation.
//!
//! Manifests mix two XML vocabularies: the MPD 2011 schema for the
//! presentation structure and the SCTE-35 2013 schema for ad signaling inside
//! event streams. [`Namespace`] names them once and [`ElementExt`] adds
//! "find element by local name within namespace" queries to
//! [`roxmltree::Node`], so the walker never concatenates namespace strings.
//!
//! Elements without a namespace are accepted as MPD elements, since some
//! packagers omit the default namespace declaration. SCTE-35 elements must
//! be qualified.

use std::str::FromStr;

use roxmltree::Node;

use crate::error::MediaStructError;

/// An XML vocabulary used in manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `urn:mpeg:dash:schema:mpd:2011`
    Mpd,
    /// `urn:scte:scte35:2013:xml`
    Scte35,
}

impl Namespace {
    /// The namespace URI.
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Mpd => "urn:mpeg:dash:schema:mpd:2011",
            Namespace::Scte35 => "urn:scte:scte35:2013:xml",
        }
    }

    fn contains(self, namespace: Option<&str>) -> bool {
        match (self, namespace) {
            (_, Some(uri)) => uri == self.uri(),
            (Namespace::Mpd, None) => true,
            (Namespace::Scte35, None) => false,
        }
    }
}

/// Typed queries over manifest elements.
pub trait ElementExt<'a, 'input: 'a>: Sized {
    /// Whether this node is an element called `name` in `namespace`.
    fn has_name(self, namespace: Namespace, name: &str) -> bool;

    /// Direct child elements called `name` in `namespace`.
    fn children_in(self, namespace: Namespace, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>>;

    /// First direct child element called `name` in `namespace`.
    fn child_in(self, namespace: Namespace, name: &'static str) -> Option<Node<'a, 'input>> {
        self.children_in(namespace, name).next()
    }

    /// Descendant elements (excluding this node) called `name` in
    /// `namespace`, in document order.
    fn descendants_in(self, namespace: Namespace, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>>;

    /// First descendant element called `name` in `namespace`.
    fn descendant_in(self, namespace: Namespace, name: &'static str) -> Option<Node<'a, 'input>> {
        self.descendants_in(namespace, name).next()
    }

    /// An attribute value, trimmed. Empty values count as absent.
    fn attr(self, name: &str) -> Option<&'a str>;

    /// An attribute parsed as `T`. Absent is `Ok(None)`; a present value
    /// that does not parse is a [`MediaStructError::MalformedManifest`].
    fn parse_attr<T: FromStr>(self, name: &str) -> Result<Option<T>, MediaStructError>;

    /// The trimmed text of this element, if non-empty.
    fn trimmed_text(self) -> Option<&'a str>;
}

impl<'a, 'input: 'a> ElementExt<'a, 'input> for Node<'a, 'input> {
    fn has_name(self, namespace: Namespace, name: &str) -> bool {
        self.is_element() && self.tag_name().name() == name && namespace.contains(self.tag_name().namespace())
    }

    fn children_in(self, namespace: Namespace, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> {
        self.children().filter(move |node| node.has_name(namespace, name))
    }

    fn descendants_in(self, namespace: Namespace, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> {
        self.descendants()
            .skip(1)
            .filter(move |node| node.has_name(namespace, name))
    }

    fn attr(self, name: &str) -> Option<&'a str> {
        self.attribute(name).map(str::trim).filter(|value| !value.is_empty())
    }

    fn parse_attr<T: FromStr>(self, name: &str) -> Result<Option<T>, MediaStructError> {
        match self.attr(name) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| MediaStructError::bad_attribute(self.tag_name().name(), name, value)),
        }
    }

    fn trimmed_text(self) -> Option<&'a str> {
        self.text().map(str::trim).filter(|text| !text.is_empty())
    }
}
