//! Item system - kinds and counted stacks

use serde::{Deserialize, Serialize};

/// Item kind identifier.
///
/// Equality is exact: two kinds merge only when every field matches. The
/// category decides the native per-slot stack limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// A placeable block
    Block(u16),
    /// A generic item with a variant/damage discriminator
    Item(u16, u16),
    /// Items that only stack in small bundles (pearls, signs, eggs)
    Bundle(u16),
    /// Items that never stack
    Unique(u16),
}

impl ItemKind {
    /// Native per-slot stack limit for this kind.
    pub const fn max_stack_size(self) -> u32 {
        match self {
            ItemKind::Block(_) => 64,
            ItemKind::Item(_, _) => 64,
            ItemKind::Bundle(_) => 16,
            ItemKind::Unique(_) => 1,
        }
    }
}

/// A counted stack of one item kind.
///
/// `count` is a logical quantity and may exceed the native per-slot limit
/// inside device internals; protocol boundaries split it back into
/// slot-sized stacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Kind of item
    pub kind: ItemKind,
    /// Quantity in stack
    pub count: u32,
}

impl ItemStack {
    /// Create a new item stack.
    pub fn new(kind: ItemKind, count: u32) -> Self {
        Self { kind, count }
    }

    /// Clone this stack with a different count.
    pub fn with_count(&self, count: u32) -> Self {
        Self {
            kind: self.kind,
            count,
        }
    }

    /// Kind equality ignoring count.
    pub fn matches(&self, other: &ItemStack) -> bool {
        self.kind == other.kind
    }

    /// Native per-slot stack limit for this stack's kind.
    pub fn max_stack_size(&self) -> u32 {
        self.kind.max_stack_size()
    }

    /// Normalize an empty stack to the absent state.
    ///
    /// A zero count means "nothing here" and must never be retained as a
    /// zero-count kind outside device internals.
    pub fn nonzero(self) -> Option<Self> {
        if self.count == 0 {
            None
        } else {
            Some(self)
        }
    }
}
