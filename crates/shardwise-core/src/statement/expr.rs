use crate::{error::InternalError, value::Value};

/// Upper bound on AND-groups produced by OR distribution. Predicate trees
/// that would exceed it are treated as unconditioned.
pub(crate) const MAX_AND_GROUPS: usize = 1024;

///
/// ColumnRef
///
/// Column reference, qualified by the logical table when the binder could
/// resolve it (aliases already replaced by table names).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    #[must_use]
    pub fn new(column: &str) -> Self {
        Self {
            table: None,
            column: column.to_string(),
        }
    }

    #[must_use]
    pub fn qualified(table: &str, column: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            column: column.to_string(),
        }
    }
}

///
/// Operand
///
/// Literal value or positional parameter marker (0-based).
///

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Literal(Value),
    Param(usize),
}

impl Operand {
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub const fn param(index: usize) -> Self {
        Self::Param(index)
    }

    /// Substitute bound parameters.
    pub fn resolve(&self, params: &[Value]) -> Result<Value, InternalError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Param(index) => params.get(*index).cloned().ok_or_else(|| {
                InternalError::condition_invariant(format!(
                    "parameter marker {index} has no bound value ({} bound)",
                    params.len()
                ))
            }),
        }
    }

    #[must_use]
    pub const fn param_index(&self) -> Option<usize> {
        match self {
            Self::Param(index) => Some(*index),
            Self::Literal(_) => None,
        }
    }
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

///
/// Expr
///
/// Predicate tree. `Opaque` stands for any predicate the router cannot use
/// (LIKE, function calls, column-to-column comparisons).
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    And(Vec<Self>),
    Or(Vec<Self>),
    Compare {
        column: ColumnRef,
        op: CompareOp,
        operand: Operand,
    },
    In {
        column: ColumnRef,
        operands: Vec<Operand>,
    },
    Between {
        column: ColumnRef,
        low: Operand,
        high: Operand,
    },
    Opaque,
}

impl Expr {
    #[must_use]
    pub const fn and(children: Vec<Self>) -> Self {
        Self::And(children)
    }

    #[must_use]
    pub const fn or(children: Vec<Self>) -> Self {
        Self::Or(children)
    }

    #[must_use]
    pub const fn compare(column: ColumnRef, op: CompareOp, operand: Operand) -> Self {
        Self::Compare {
            column,
            op,
            operand,
        }
    }

    #[must_use]
    pub fn equals(column: &str, operand: Operand) -> Self {
        Self::compare(ColumnRef::new(column), CompareOp::Eq, operand)
    }

    #[must_use]
    pub fn in_list(column: &str, operands: Vec<Operand>) -> Self {
        Self::In {
            column: ColumnRef::new(column),
            operands,
        }
    }

    #[must_use]
    pub fn between(column: &str, low: Operand, high: Operand) -> Self {
        Self::Between {
            column: ColumnRef::new(column),
            low,
            high,
        }
    }

    /// Normalize into disjunctive form: a list of AND-groups of atoms.
    ///
    /// `Opaque` atoms are dropped (they cannot narrow routing, and dropping a
    /// conjunct only widens a group). Returns `None` when distribution would
    /// exceed [`MAX_AND_GROUPS`].
    pub(crate) fn and_groups(&self) -> Option<Vec<Vec<&Self>>> {
        match self {
            Self::Opaque => Some(vec![Vec::new()]),
            Self::Compare { .. } | Self::In { .. } | Self::Between { .. } => Some(vec![vec![self]]),
            Self::Or(children) => {
                let mut groups = Vec::new();
                for child in children {
                    groups.extend(child.and_groups()?);
                    if groups.len() > MAX_AND_GROUPS {
                        return None;
                    }
                }
                if groups.is_empty() {
                    groups.push(Vec::new());
                }

                Some(groups)
            }
            Self::And(children) => {
                let mut groups: Vec<Vec<&Self>> = vec![Vec::new()];
                for child in children {
                    let child_groups = child.and_groups()?;
                    if groups.len() * child_groups.len() > MAX_AND_GROUPS {
                        return None;
                    }
                    groups = groups
                        .iter()
                        .flat_map(|left| {
                            child_groups.iter().map(move |right| {
                                let mut merged = left.clone();
                                merged.extend(right.iter().copied());
                                merged
                            })
                        })
                        .collect();
                }

                Some(groups)
            }
        }
    }

    /// Every parameter marker index referenced by an atom on a column
    /// accepted by `is_routing_column`.
    pub(crate) fn routing_params(
        &self,
        is_routing_column: &impl Fn(&ColumnRef) -> bool,
        out: &mut Vec<usize>,
    ) {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.routing_params(is_routing_column, out);
                }
            }
            Self::Compare {
                column, operand, ..
            } if is_routing_column(column) => out.extend(operand.param_index()),
            Self::In { column, operands } if is_routing_column(column) => {
                out.extend(operands.iter().filter_map(Operand::param_index));
            }
            Self::Between { column, low, high } if is_routing_column(column) => {
                out.extend(low.param_index());
                out.extend(high.param_index());
            }
            _ => {}
        }
    }
}
