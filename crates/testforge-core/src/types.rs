// Copyright (c) The Testforge Authors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use testforge_bytecode::CodeObjectId;

/// Type info (spec.md §3): an explicit sum type standing in for the host
/// language's runtime type objects (spec.md §9 "Dynamic typing -> tagged sum
/// types"). `Any` is the top type, `None` the bottom for non-optional slots;
/// subtyping is the partial order implemented by [`TypeInfo::is_subtype_of`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeInfo {
    Concrete(String),
    Union(Vec<TypeInfo>),
    Any,
    None,
    Generic { base: String, args: Vec<TypeInfo> },
    Callable { params: Vec<TypeInfo>, ret: Box<TypeInfo> },
}

impl TypeInfo {
    pub fn concrete(name: impl Into<String>) -> Self {
        TypeInfo::Concrete(name.into())
    }

    /// Partial-order subtyping used only for candidate selection during test
    /// synthesis, never enforced at runtime (spec.md §3).
    pub fn is_subtype_of(&self, other: &TypeInfo) -> bool {
        match (self, other) {
            (_, TypeInfo::Any) => true,
            (TypeInfo::None, _) => true,
            (a, b) if a == b => true,
            (TypeInfo::Union(members), b) => members.iter().all(|m| m.is_subtype_of(b)),
            (a, TypeInfo::Union(members)) => members.iter().any(|m| a.is_subtype_of(m)),
            (TypeInfo::Generic { base: ab, args: aargs }, TypeInfo::Generic { base: bb, args: bargs }) => {
                ab == bb
                    && aargs.len() == bargs.len()
                    && aargs.iter().zip(bargs).all(|(x, y)| x.is_subtype_of(y))
            }
            (
                TypeInfo::Callable { params: ap, ret: ar },
                TypeInfo::Callable { params: bp, ret: br },
            ) => {
                ap.len() == bp.len()
                    && bp.iter().zip(ap).all(|(b, a)| b.is_subtype_of(a))
                    && ar.is_subtype_of(br)
            }
            _ => false,
        }
    }

    /// True when a value of `self` is an acceptable substitute for a
    /// parameter declared `other` — the relation the factory actually
    /// consults when looking for a reusable in-scope reference.
    pub fn is_compatible_with(&self, other: &TypeInfo) -> bool {
        self.is_subtype_of(other) || other.is_subtype_of(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallableKind {
    Function,
    Constructor,
    Method,
    FieldRead,
    FieldWrite,
}

/// Callable descriptor (spec.md §3): immutable after cluster construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallableDescriptor {
    pub qualified_name: String,
    pub kind: CallableKind,
    pub params: Vec<(String, TypeInfo)>,
    pub return_type: TypeInfo,
    pub owning_type: Option<TypeInfo>,
    pub visibility: Visibility,
    pub code_object: CodeObjectId,
}

impl CallableDescriptor {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_is_top() {
        assert!(TypeInfo::concrete("int").is_subtype_of(&TypeInfo::Any));
        assert!(!TypeInfo::Any.is_subtype_of(&TypeInfo::concrete("int")));
    }

    #[test]
    fn none_is_bottom() {
        assert!(TypeInfo::None.is_subtype_of(&TypeInfo::concrete("int")));
    }

    #[test]
    fn union_member_is_subtype_of_whole() {
        let u = TypeInfo::Union(vec![TypeInfo::concrete("int"), TypeInfo::concrete("str")]);
        assert!(TypeInfo::concrete("int").is_subtype_of(&u));
        assert!(!TypeInfo::concrete("float").is_subtype_of(&u));
    }
}
