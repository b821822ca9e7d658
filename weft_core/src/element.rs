// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element descriptors.
//!
//! A [`Node`] is the transient, declarative description of desired UI that
//! application code hands to the reconciler: either nothing, a piece of
//! text, a single [`Element`], or a list of nodes. Descriptors are produced
//! fresh on every render and consumed by one reconciliation step; the only
//! one retained is the top-level element memoized on the host root.
//!
//! An [`Element`] is `{ type, props, key }`. Its type is either a host tag
//! (a primitive the host adapter knows how to instantiate, such as
//! `"span"`), a [`Component`] function, or the synthetic text type the
//! reconciler wraps bare strings and numbers in.

use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::hooks::Hooks;

/// Reconciliation key of an element.
pub type Key = Cow<'static, str>;

/// Signature of a component render function.
pub type RenderFn = dyn Fn(&Props, &mut Hooks<'_>) -> Node;

/// Content of a text node.
#[derive(Clone, Debug, PartialEq)]
pub enum TextContent {
    /// A string.
    Str(String),
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
}

impl fmt::Display for TextContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

/// A single attribute value in [`Props`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// A string value.
    Str(String),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Element properties: named attributes plus the `children` descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    attrs: BTreeMap<Cow<'static, str>, PropValue>,
    children: Node,
}

impl Props {
    /// Creates empty props with no children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Props of the synthetic text element wrapping `content`.
    #[must_use]
    pub fn text(content: TextContent) -> Self {
        Self {
            attrs: BTreeMap::new(),
            children: Node::Text(content),
        }
    }

    /// Returns these props with attribute `name` set to `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Returns these props with `children` replaced.
    #[must_use]
    pub fn with_children(mut self, children: impl Into<Node>) -> Self {
        self.children = children.into();
        self
    }

    /// Sets attribute `name`.
    pub fn set(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Returns attribute `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    /// Returns attribute `name` if it is an integer.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.attrs.get(name) {
            Some(PropValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Returns attribute `name` if it is a string.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name) {
            Some(PropValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Iterates over all attributes in name order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Returns the `children` descriptor.
    #[must_use]
    pub fn children(&self) -> &Node {
        &self.children
    }

    /// Returns whether both props carry the same attributes, ignoring
    /// `children`.
    #[must_use]
    pub fn same_attrs(&self, other: &Self) -> bool {
        self.attrs == other.attrs
    }
}

/// A function component.
///
/// Components are compared by identity: two `Component` values are equal
/// only if they were cloned from the same [`Component::new`] call.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    /// Wraps a render function under a display name.
    pub fn new(
        name: &'static str,
        render: impl Fn(&Props, &mut Hooks<'_>) -> Node + 'static,
    ) -> Self {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, props: &Props, hooks: &mut Hooks<'_>) -> Node {
        (self.render)(props, hooks)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// The type of an [`Element`].
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A host primitive identified by tag name.
    Host(Cow<'static, str>),
    /// A function component.
    Component(Component),
    /// Synthetic text; the content lives in the props' children.
    Text,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => f.write_str(tag),
            Self::Component(c) => f.write_str(c.name()),
            Self::Text => f.write_str("#text"),
        }
    }
}

/// A single element descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Host tag, component, or synthetic text.
    pub ty: ElementType,
    /// Properties, including children.
    pub props: Rc<Props>,
    /// Optional reconciliation key.
    pub key: Option<Key>,
}

impl Element {
    /// Creates an element from its parts.
    #[must_use]
    pub fn new(ty: ElementType, props: Props, key: Option<Key>) -> Self {
        Self {
            ty,
            props: Rc::new(props),
            key,
        }
    }

    /// Creates a host element with empty props.
    #[must_use]
    pub fn host(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ElementType::Host(tag.into()), Props::new(), None)
    }

    /// Creates a component element with empty props.
    #[must_use]
    pub fn component(component: &Component) -> Self {
        Self::new(ElementType::Component(component.clone()), Props::new(), None)
    }

    /// Creates the synthetic text element the reconciler uses for bare text.
    #[must_use]
    pub fn text(content: TextContent) -> Self {
        Self::new(ElementType::Text, Props::text(content), None)
    }

    /// Returns this element with its key set.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Returns this element with attribute `name` set.
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props).set(name, value);
        self
    }

    /// Returns this element with its children replaced.
    #[must_use]
    pub fn with_children(mut self, children: impl Into<Node>) -> Self {
        let props = Rc::make_mut(&mut self.props);
        *props = core::mem::take(props).with_children(children);
        self
    }
}

/// Anything a render function may return.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Node {
    /// Renders nothing.
    #[default]
    Empty,
    /// A bare string or number.
    Text(TextContent),
    /// A single element.
    Element(Element),
    /// A list of nodes.
    ///
    /// The reconciler materializes only the first entry.
    Fragment(Vec<Node>),
}

impl Node {
    /// Returns the element if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the text content if this node is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextContent> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<TextContent> for Node {
    fn from(t: TextContent) -> Self {
        Self::Text(t)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Text(TextContent::Str(s.into()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::Text(TextContent::Str(s))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Self::Text(TextContent::Int(n))
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Self::Text(TextContent::Int(n.into()))
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Self::Text(TextContent::Float(n))
    }
}

impl From<Vec<Node>> for Node {
    fn from(list: Vec<Node>) -> Self {
        Self::Fragment(list)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    #[test]
    fn text_content_display_matches_source_value() {
        assert_eq!(TextContent::Str("hi".into()).to_string(), "hi");
        assert_eq!(TextContent::Int(0).to_string(), "0");
        assert_eq!(TextContent::Float(1.5).to_string(), "1.5");
        assert_eq!(TextContent::Float(2.0).to_string(), "2");
    }

    #[test]
    fn element_builders_set_props_and_children() {
        let el = Element::host("span")
            .with_key("k")
            .with_prop("id", "title")
            .with_children("0");
        assert_eq!(el.key.as_deref(), Some("k"));
        assert_eq!(el.props.str("id"), Some("title"));
        assert_eq!(
            el.props.children().as_text(),
            Some(&TextContent::Str("0".into()))
        );
    }

    #[test]
    fn components_compare_by_identity() {
        let a = Component::new("A", |_, _| Node::Empty);
        let b = Component::new("A", |_, _| Node::Empty);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn conversions_into_node() {
        assert_eq!(Node::from(3), Node::Text(TextContent::Int(3)));
        assert_eq!(
            Node::from(vec![Node::from("a")]),
            Node::Fragment(vec![Node::Text(TextContent::Str("a".into()))])
        );
        assert!(Node::from(Element::host("div")).as_element().is_some());
    }
}
