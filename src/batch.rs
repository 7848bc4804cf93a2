// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The drawing backend's data sink
//!
//! Uploading or drawing vertex lists is out of scope (§1): [`Batch`] is the
//! minimal interface the [vertex builder](crate::vertex) needs to deposit
//! interleaved vertex data grouped by render state. The actual GL/Vulkan/etc
//! upload is the caller's concern.

use crate::font::TextureId;
use std::rc::Rc;

/// A vertex, interleaving position, texture coordinate and color
///
/// `tex_coord` is `[0.0; 3]` for non-textured primitives (backgrounds,
/// underlines).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: (f32, f32),
    pub tex_coord: [f32; 3],
    pub color: [f32; 4],
}

/// Render-state group identity
///
/// Groups form a small DAG shared across layouts (§9): a child group's
/// identity is `(kind, parent)`, so two layouts drawing into the same
/// texture under the same parent group coalesce into one GPU state change.
/// Equality/hash are by *value* of `(kind, Rc::ptr_eq(parent))`, not by the
/// `Rc`'s address, matching §9's "value-based equality" instruction.
#[derive(Clone, Debug)]
pub struct Group {
    pub kind: GroupKind,
    pub parent: Option<Rc<Group>>,
}

/// What a group draws: used to order backgrounds < glyphs < underlines and
/// to separate glyphs by texture owner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Background,
    Glyphs(TextureId),
    Underline,
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && match (&self.parent, &other.parent) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
    }
}
impl Eq for Group {}

impl Group {
    pub fn root() -> Rc<Group> {
        Rc::new(Group {
            kind: GroupKind::Background,
            parent: None,
        })
    }

    pub fn child(self: &Rc<Self>, kind: GroupKind) -> Rc<Group> {
        Rc::new(Group {
            kind,
            parent: Some(self.clone()),
        })
    }

    /// Drawing order: backgrounds first, then glyphs (by texture), then
    /// underlines (§4.6: "dedicated order-0 and order-2 groups; glyphs use
    /// order-1")
    pub fn order(&self) -> u8 {
        match self.kind {
            GroupKind::Background => 0,
            GroupKind::Glyphs(_) => 1,
            GroupKind::Underline => 2,
        }
    }
}

/// A handle to a contiguous run of vertices previously deposited in a
/// [`Batch`], owned by the [`Line`](crate::line::Line) that created it
///
/// Dropping the handle (via [`Batch::delete`]) releases the vertices back to
/// the batch without touching unrelated handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexListId(pub u64);

/// Vertex storage grouped by render state
///
/// Not thread-safe: only the owning caller may mutate a given `Batch` (§5).
#[derive(Default)]
pub struct Batch {
    next_id: u64,
    lists: std::collections::HashMap<VertexListId, (Rc<Group>, Vec<Vertex>)>,
}

impl Batch {
    pub fn new() -> Self {
        Batch::default()
    }

    /// Deposit a vertex list under `group`, returning a handle
    pub fn insert(&mut self, group: Rc<Group>, vertices: Vec<Vertex>) -> VertexListId {
        let id = VertexListId(self.next_id);
        self.next_id += 1;
        self.lists.insert(id, (group, vertices));
        id
    }

    /// Release a previously-inserted vertex list
    pub fn delete(&mut self, id: VertexListId) {
        self.lists.remove(&id);
    }

    /// Number of vertex lists currently live (test/diagnostic use)
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn get(&self, id: VertexListId) -> Option<&(Rc<Group>, Vec<Vertex>)> {
        self.lists.get(&id)
    }

    /// All vertex lists, grouped and ordered for drawing (background, then
    /// glyphs by texture, then underline)
    pub fn draw_order(&self) -> Vec<(VertexListId, &Rc<Group>, &[Vertex])> {
        let mut v: Vec<_> = self
            .lists
            .iter()
            .map(|(id, (g, verts))| (*id, g, verts.as_slice()))
            .collect();
        v.sort_by_key(|(_, g, _)| g.order());
        v
    }
}
