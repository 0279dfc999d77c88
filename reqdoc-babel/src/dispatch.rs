//! Generic dispatch over record field values.
//!
//!     Converters never match on [`FieldValue`] themselves. They implement [`ValueHandler`]
//!     and let [`walk`] drive them:
//!
//!     - Scalar kinds (`Null`, `Reference`, `String`) go to their leaf hook. A hook that returns
//!       `None` declines the value, which then goes to [`ValueHandler::other`].
//!     - `Array` never uses a leaf hook. [`walk`] calls `array_begin`, walks each child in
//!       order, passes each child's result through `list_item` exactly once, then calls
//!       `array_end`. The array's result is the sequence of post-processed children.
//!     - `Other` always goes to [`ValueHandler::other`].
//!
//!     `other` has no default, so every handler has a fallback and no value can go unhandled.
//!
//!     Hooks may write into shared output (a table cell, a string buffer). They are invoked
//!     strictly in walk order: depth first, children left to right. Recursion depth equals the
//!     nesting depth of arrays in a record, which stays small in practice.

use crate::model::{FieldValue, RecordRef};

/// Result of walking one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Walked<A> {
    /// Artifact produced by a leaf or fallback hook
    Leaf(A),
    /// Results of an array's children, in order
    Seq(Vec<Walked<A>>),
}

impl<A> Walked<A> {
    /// Collect all leaf artifacts depth first.
    pub fn into_leaves(self) -> Vec<A> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(self, leaves: &mut Vec<A>) {
        match self {
            Walked::Leaf(artifact) => leaves.push(artifact),
            Walked::Seq(children) => {
                for child in children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    /// Number of direct results: 1 for a leaf, the child count for a sequence.
    pub fn len(&self) -> usize {
        match self {
            Walked::Leaf(_) => 1,
            Walked::Seq(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Walked::Seq(children) if children.is_empty())
    }
}

/// Per-kind hooks driven by [`walk`].
pub trait ValueHandler {
    type Artifact;

    /// Leaf hook for `Null`.
    fn null(&mut self) -> Option<Self::Artifact> {
        None
    }

    /// Leaf hook for `Reference`.
    fn reference(&mut self, _target: &RecordRef) -> Option<Self::Artifact> {
        None
    }

    /// Leaf hook for `String`.
    fn string(&mut self, _text: &str) -> Option<Self::Artifact> {
        None
    }

    /// Called before the children of an array are walked.
    fn array_begin(&mut self, _items: &[FieldValue]) {}

    /// Post-processes the result of each array child, once per child.
    fn list_item(&mut self, _index: usize, walked: Walked<Self::Artifact>) -> Walked<Self::Artifact> {
        walked
    }

    /// Called after every child of an array has been walked and post-processed.
    fn array_end(&mut self, _items: &[FieldValue]) {}

    /// Fallback for `Other` values and for any leaf hook that declined its value.
    fn other(&mut self, value: &FieldValue) -> Self::Artifact;
}

/// Walk `value`, dispatching each node to `handler`.
pub fn walk<H: ValueHandler + ?Sized>(handler: &mut H, value: &FieldValue) -> Walked<H::Artifact> {
    match value {
        FieldValue::Array(items) => {
            handler.array_begin(items);
            let mut results = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let walked = walk(handler, item);
                results.push(handler.list_item(index, walked));
            }
            handler.array_end(items);
            Walked::Seq(results)
        }
        FieldValue::Null => leaf(handler.null(), handler, value),
        FieldValue::Reference(target) => leaf(handler.reference(target), handler, value),
        FieldValue::String(text) => leaf(handler.string(text), handler, value),
        FieldValue::Other(_) => Walked::Leaf(handler.other(value)),
    }
}

fn leaf<H: ValueHandler + ?Sized>(
    handled: Option<H::Artifact>,
    handler: &mut H,
    value: &FieldValue,
) -> Walked<H::Artifact> {
    match handled {
        Some(artifact) => Walked::Leaf(artifact),
        None => Walked::Leaf(handler.other(value)),
    }
}
