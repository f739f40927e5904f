//! Content-addressed registry of struct and block member lists.
//!
//! Member lists are keyed by their structural identity (name plus the
//! ordered members with their full types), not by where they were declared.
//! Two declarations with the same content share one [`StructId`], which is
//! what lets the per-unit IO and split tables treat "the same conceptual
//! type" as one key.
//!
//! Interface blocks that grow after creation (the implicit `$Global`
//! uniform block) are allocated outside the content map so growing them
//! never aliases another declaration.

use rustc_hash::FxHashMap;

use crate::{Name, Type};

/// Handle to a member list in the [`StructRegistry`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct StructId(u32);

impl StructId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One named member of a struct or block.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Member {
    pub name: Name,
    pub ty: Type,
}

impl Member {
    pub fn new(name: Name, ty: Type) -> Self {
        Member { name, ty }
    }
}

/// An ordered member list; order defines layout and flatten/split order.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct StructDef {
    pub name: Option<Name>,
    pub members: Vec<Member>,
}

impl StructDef {
    pub fn member_index(&self, name: Name) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// Registry of every member list in the unit.
#[derive(Clone, Debug, Default)]
pub struct StructRegistry {
    defs: Vec<StructDef>,
    by_content: FxHashMap<StructDef, StructId>,
    growable: Vec<bool>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, def: StructDef, growable: bool) -> StructId {
        let raw = u32::try_from(self.defs.len())
            .unwrap_or_else(|_| panic!("struct registry exceeded u32::MAX entries"));
        self.defs.push(def);
        self.growable.push(growable);
        StructId(raw)
    }

    /// Intern a member list, returning the existing handle for identical
    /// content.
    pub fn intern(&mut self, def: StructDef) -> StructId {
        if let Some(&id) = self.by_content.get(&def) {
            return id;
        }
        let id = self.push(def.clone(), false);
        self.by_content.insert(def, id);
        id
    }

    /// Allocate a block whose member list may grow later.
    pub fn alloc_growable(&mut self, def: StructDef) -> StructId {
        self.push(def, true)
    }

    /// Append a member to a growable block. Existing members, and any
    /// offsets already committed to them, are untouched.
    pub fn grow(&mut self, id: StructId, member: Member) -> usize {
        assert!(
            self.growable[id.index()],
            "attempted to grow an interned member list"
        );
        let members = &mut self.defs[id.index()].members;
        members.push(member);
        members.len() - 1
    }

    pub fn get(&self, id: StructId) -> &StructDef {
        &self.defs[id.index()]
    }

    pub fn members(&self, id: StructId) -> &[Member] {
        &self.defs[id.index()].members
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Whether `ty` is, or transitively contains, an opaque resource.
    pub fn contains_opaque(&self, ty: &Type) -> bool {
        if ty.is_opaque() {
            return true;
        }
        ty.fields
            .is_some_and(|id| self.members(id).iter().any(|m| self.contains_opaque(&m.ty)))
    }

    /// Whether `ty` is, or transitively contains, an interstage builtin.
    pub fn contains_builtin(&self, ty: &Type) -> bool {
        if ty.qualifier.interstage_builtin().is_some() {
            return true;
        }
        ty.fields
            .is_some_and(|id| self.members(id).iter().any(|m| self.contains_builtin(&m.ty)))
    }

    /// Whether `ty` transitively contains a struct with both builtin and
    /// ordinary members, or only builtins nested below the top level.
    pub fn contains_ordinary(&self, ty: &Type) -> bool {
        match ty.fields {
            Some(id) => self.members(id).iter().any(|m| self.contains_ordinary(&m.ty)),
            None => ty.qualifier.interstage_builtin().is_none(),
        }
    }
}

#[cfg(test)]
mod tests;
