//! Tree cursor
//!
//! A [`TreeCursor`] is a position in a tree: a node, a position within it,
//! and an owned cursor one level up. Stored nodes only point downward, so the
//! parent chain is built during descent and lives only as long as the cursor.
//!
//! # Positions
//!
//! | Position | Meaning |
//! |----------|---------|
//! | `Entry(i)` | at entry `i` of the current node |
//! | `BeforeStart` | retreated past the first entry of the tree |
//! | `AfterEnd` | advanced past the last entry, or sought past every key |
//!
//! `BeforeStart` and `AfterEnd` are not errors. They are terminal in their
//! direction (advancing an `AfterEnd` cursor leaves it there) and a seek
//! brings the cursor back into the tree.
//!
//! When a cursor leaves the tree through `advance` or `retreat`, its
//! exhausted ancestors leave with it and keep pointing at the edge nodes.
//! Stepping back in from the edge restores the whole chain.
//!
//! # Cloning
//!
//! `clone()` copies the position state of every level. Nodes are shared
//! (`Arc<Node>`) and never copied, so a clone is cheap and moving it never
//! disturbs the original.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tessera_core::{Error, KeyOrdering, Result};

use crate::context::ReadContext;
use crate::node::{Node, NodeRef};
use crate::store::{fetch_child, NodeStore};

/// Where a cursor sits within its current node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// At the entry with this index
    Entry(usize),
    /// Before the first entry of the tree
    BeforeStart,
    /// After the last entry of the tree
    AfterEnd,
}

/// A position within a tree, with its path back to the root
#[derive(Clone)]
pub struct TreeCursor {
    node: Arc<Node>,
    position: Position,
    parent: Option<Box<TreeCursor>>,
    store: Arc<dyn NodeStore>,
}

impl fmt::Debug for TreeCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeCursor")
            .field("node", &self.node.hash())
            .field("level", &self.node.level())
            .field("position", &self.position)
            .field("parent", &self.parent)
            .finish()
    }
}

impl TreeCursor {
    /// Descend from `root` to the first leaf entry `>= key`
    ///
    /// Internal levels pick the first child whose key is `>= key`, clamped to
    /// the last child. A key greater than every stored key leaves the cursor
    /// `AfterEnd` on the last leaf.
    pub fn seek_to_key(
        ctx: &ReadContext,
        store: Arc<dyn NodeStore>,
        root: Arc<Node>,
        key: &[u8],
        ordering: &dyn KeyOrdering,
    ) -> Result<Self> {
        Self::descend(ctx, store, root, |node| search(node, key, ordering))
    }

    /// Cursor at the first entry of the tree (`AfterEnd` if the tree is empty)
    pub fn at_start(ctx: &ReadContext, store: Arc<dyn NodeStore>, root: Arc<Node>) -> Result<Self> {
        Self::descend(ctx, store, root, |node| {
            if node.is_empty() {
                Position::AfterEnd
            } else {
                Position::Entry(0)
            }
        })
    }

    /// Cursor at the last entry of the tree (`AfterEnd` if the tree is empty)
    pub fn at_end(ctx: &ReadContext, store: Arc<dyn NodeStore>, root: Arc<Node>) -> Result<Self> {
        Self::descend(ctx, store, root, |node| match node.count() {
            0 => Position::AfterEnd,
            n => Position::Entry(n - 1),
        })
    }

    fn descend(
        ctx: &ReadContext,
        store: Arc<dyn NodeStore>,
        root: Arc<Node>,
        place: impl Fn(&Node) -> Position,
    ) -> Result<Self> {
        let position = place(&root);
        let mut cursor = TreeCursor {
            node: root,
            position,
            parent: None,
            store,
        };
        while !cursor.node.is_leaf() {
            cursor.keep_in_bounds()?;
            let child = fetch_child(ctx, cursor.store.as_ref(), &cursor.current_ref()?)?;
            let position = place(&child);
            let store = Arc::clone(&cursor.store);
            cursor = TreeCursor {
                node: child,
                position,
                parent: Some(Box::new(cursor)),
                store,
            };
        }
        Ok(cursor)
    }

    /// Reposition this cursor at the first entry `>= key`
    ///
    /// Only levels whose node does not cover `key` are re-sought, so a seek
    /// within the current leaf fetches nothing. On error the cursor is left
    /// where it was.
    pub fn seek(
        &mut self,
        ctx: &ReadContext,
        key: &[u8],
        ordering: &dyn KeyOrdering,
    ) -> Result<()> {
        if let Some(parent) = self.parent.as_mut() {
            let in_bounds = parent.is_valid()
                && match (self.node.first_key(), self.node.last_key()) {
                    (Some(first), Some(last)) => {
                        ordering.compare(key, first) != Ordering::Less
                            && ordering.compare(key, last) != Ordering::Greater
                    }
                    _ => false,
                };
            if !in_bounds {
                let mut moved = TreeCursor::clone(parent);
                moved.seek(ctx, key, ordering)?;
                moved.keep_in_bounds()?;
                let node = fetch_child(ctx, self.store.as_ref(), &moved.current_ref()?)?;
                **parent = moved;
                self.node = node;
            }
        }
        self.position = search(&self.node, key, ordering);
        Ok(())
    }

    /// Move to the next entry of the tree
    ///
    /// Crossing out of the current node advances the parent and descends into
    /// the new sibling. Past the last entry the cursor becomes `AfterEnd`.
    /// On error the cursor is left where it was.
    pub fn advance(&mut self, ctx: &ReadContext) -> Result<()> {
        match self.position {
            Position::AfterEnd => Ok(()),
            Position::BeforeStart => {
                if let Some(parent) = self.parent.as_mut() {
                    if parent.position == Position::BeforeStart {
                        parent.advance(ctx)?;
                    }
                }
                self.position = if self.node.is_empty() {
                    Position::AfterEnd
                } else {
                    Position::Entry(0)
                };
                Ok(())
            }
            Position::Entry(idx) if idx + 1 < self.node.count() => {
                self.position = Position::Entry(idx + 1);
                Ok(())
            }
            Position::Entry(_) => self.enter_sibling(ctx, Direction::Forward),
        }
    }

    /// Move to the previous entry of the tree
    ///
    /// Symmetric to [`advance`](Self::advance); before the first entry the
    /// cursor becomes `BeforeStart`.
    pub fn retreat(&mut self, ctx: &ReadContext) -> Result<()> {
        match self.position {
            Position::BeforeStart => Ok(()),
            Position::AfterEnd => {
                if let Some(parent) = self.parent.as_mut() {
                    if parent.position == Position::AfterEnd {
                        parent.retreat(ctx)?;
                    }
                }
                self.position = match self.node.count() {
                    0 => Position::BeforeStart,
                    n => Position::Entry(n - 1),
                };
                Ok(())
            }
            Position::Entry(idx) if idx > 0 => {
                self.position = Position::Entry(idx - 1);
                Ok(())
            }
            Position::Entry(_) => self.enter_sibling(ctx, Direction::Backward),
        }
    }

    /// Step the parent chain to the neighbouring node, committing only once
    /// the new node has been fetched
    fn enter_sibling(&mut self, ctx: &ReadContext, direction: Direction) -> Result<()> {
        let Some(parent) = self.parent.as_mut() else {
            self.position = direction.exhausted();
            return Ok(());
        };
        let mut moved = TreeCursor::clone(parent);
        match direction {
            Direction::Forward => moved.advance(ctx)?,
            Direction::Backward => moved.retreat(ctx)?,
        }
        if !moved.is_valid() {
            **parent = moved;
            self.position = direction.exhausted();
            return Ok(());
        }

        let child = fetch_child(ctx, self.store.as_ref(), &moved.current_ref()?)?;
        if child.is_empty() {
            return Err(Error::corruption(format!(
                "non-root node {} has no entries",
                child.hash()
            )));
        }
        **parent = moved;
        self.position = match direction {
            Direction::Forward => Position::Entry(0),
            Direction::Backward => Position::Entry(child.count() - 1),
        };
        self.node = child;
        Ok(())
    }

    /// Clamp an out-of-tree position onto the nearest entry of this node
    fn keep_in_bounds(&mut self) -> Result<()> {
        if self.node.is_empty() {
            return Err(Error::corruption(format!(
                "internal node {} has no children",
                self.node.hash()
            )));
        }
        self.position = match self.position {
            Position::BeforeStart => Position::Entry(0),
            Position::AfterEnd => Position::Entry(self.node.count() - 1),
            entry => entry,
        };
        Ok(())
    }

    /// Whether the cursor is at an entry
    pub fn is_valid(&self) -> bool {
        matches!(self.position, Position::Entry(idx) if idx < self.node.count())
    }

    /// Current position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Current node
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Level of the current node (0 for leaves)
    pub fn level(&self) -> u32 {
        self.node.level()
    }

    /// Cursor one level up, if any
    pub fn parent(&self) -> Option<&TreeCursor> {
        self.parent.as_deref()
    }

    /// Store used to resolve children
    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    fn index(&self) -> Result<usize> {
        match self.position {
            Position::Entry(idx) if idx < self.node.count() => Ok(idx),
            other => Err(Error::InvalidOperation(format!(
                "cursor is not at an entry ({:?})",
                other
            ))),
        }
    }

    /// Key of the current entry
    pub fn current_key(&self) -> Result<&[u8]> {
        let idx = self.index()?;
        self.node
            .key(idx)
            .ok_or_else(|| Error::InvalidOperation(format!("no key at index {}", idx)))
    }

    /// Payload of the current leaf entry
    pub fn current_value(&self) -> Result<&Arc<[u8]>> {
        let idx = self.index()?;
        self.node.value(idx).ok_or_else(|| {
            Error::InvalidOperation("current entry is not a leaf payload".to_string())
        })
    }

    /// Child reference of the current internal entry
    pub fn current_ref(&self) -> Result<NodeRef> {
        let idx = self.index()?;
        self.node.child(idx).ok_or_else(|| {
            Error::InvalidOperation("current entry is not a child reference".to_string())
        })
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn exhausted(self) -> Position {
        match self {
            Direction::Forward => Position::AfterEnd,
            Direction::Backward => Position::BeforeStart,
        }
    }
}

/// First entry of `node` whose key is `>= key`
fn search(node: &Node, key: &[u8], ordering: &dyn KeyOrdering) -> Position {
    let idx = node
        .keys()
        .partition_point(|k| ordering.compare(k, key) == Ordering::Less);
    if idx < node.count() {
        Position::Entry(idx)
    } else {
        Position::AfterEnd
    }
}
