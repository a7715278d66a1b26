//! DML acknowledgement merge.

use crate::{error::InternalError, route::RouteContext, value::Value};
use std::collections::VecDeque;

/// Total affected rows across route units. Saturates instead of wrapping.
#[must_use]
pub fn merge_affected_rows(counts: &[u64]) -> u64 {
    counts
        .iter()
        .fold(0u64, |total, count| total.saturating_add(*count))
}

/// Put per-unit generated keys back into statement row order.
///
/// `unit_keys[i]` holds the keys route unit `i` generated, in the order it
/// received its rows. Row `r` of the statement went to the single node of
/// `original_data_nodes()[r]`; rows with no node (always-false conditions)
/// produced no key.
pub fn reassemble_generated_keys(
    context: &RouteContext,
    unit_keys: &[Vec<Value>],
) -> Result<Vec<Value>, InternalError> {
    let units = context.route_units();
    if unit_keys.len() != units.len() {
        return Err(InternalError::merge_invariant(format!(
            "{} generated key lists for {} route units",
            unit_keys.len(),
            units.len()
        )));
    }

    let mut queues: Vec<VecDeque<&Value>> =
        unit_keys.iter().map(|keys| keys.iter().collect()).collect();
    let mut keys = Vec::with_capacity(context.original_data_nodes().len());

    for (row, nodes) in context.original_data_nodes().iter().enumerate() {
        let node = match nodes.as_slice() {
            [] => continue,
            [node] => node,
            _ => {
                return Err(InternalError::merge_invariant(format!(
                    "row {row} routed to {} data nodes",
                    nodes.len()
                )));
            }
        };
        let unit = units
            .iter()
            .position(|unit| {
                unit.data_source() == node.data_source
                    && unit
                        .table_mappers
                        .iter()
                        .any(|mapper| mapper.actual_name == node.table)
            })
            .ok_or_else(|| {
                InternalError::merge_invariant(format!(
                    "row {row} routed to {node}, which no route unit covers"
                ))
            })?;
        let key = queues[unit].pop_front().ok_or_else(|| {
            InternalError::merge_invariant(format!(
                "route unit {} returned fewer generated keys than rows",
                units[unit]
            ))
        })?;
        keys.push(key.clone());
    }

    Ok(keys)
}
