//! Newtype identifiers for variables, constraints, and families.
//!
//! All three share the same sentinel convention: `-1` means
//! "absent" (a padded term, a masked-out position, a shift-outside cell).

use derive_more::{Deref, From};

/// Sentinel label value denoting an absent term or masked-out position.
pub const SENTINEL: i64 = -1;

/// A unique positive integer naming one scalar decision variable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Deref)]
pub struct VariableLabel(i64);

impl VariableLabel {
    pub const SENTINEL: VariableLabel = VariableLabel(SENTINEL);

    pub fn is_sentinel(self) -> bool {
        self.0 == SENTINEL
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl std::fmt::Debug for VariableLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_sentinel() {
            write!(f, "VariableLabel(sentinel)")
        } else {
            write!(f, "VariableLabel({})", self.0)
        }
    }
}

impl std::fmt::Display for VariableLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A unique positive integer naming one scalar constraint row.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Deref)]
pub struct ConstraintLabel(i64);

impl ConstraintLabel {
    pub const SENTINEL: ConstraintLabel = ConstraintLabel(SENTINEL);

    pub fn is_sentinel(self) -> bool {
        self.0 == SENTINEL
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl std::fmt::Debug for ConstraintLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_sentinel() {
            write!(f, "ConstraintLabel(sentinel)")
        } else {
            write!(f, "ConstraintLabel({})", self.0)
        }
    }
}

impl std::fmt::Display for ConstraintLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable id of one `add_variables`/`add_constraints` family call.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Deref, Debug)]
pub struct FamilyId(usize);

impl FamilyId {
    pub fn into_inner(self) -> usize {
        self.0
    }
}
