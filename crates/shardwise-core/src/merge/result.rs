use crate::{error::InternalError, merge::MergeKind, value::Value};

///
/// QueryResult
///
/// Forward-only cursor over one shard's rows. Owned by the executor; the
/// merge engine drives it from a single thread.
///

pub trait QueryResult {
    /// Advance to the next row. `false` once exhausted.
    fn next(&mut self) -> Result<bool, InternalError>;

    /// Value of the current row at a 0-based column.
    fn value(&self, column_index: usize) -> Result<&Value, InternalError>;

    fn column_count(&self) -> usize;

    fn column_label(&self, column_index: usize) -> Option<&str>;
}

impl<T: QueryResult + ?Sized> QueryResult for Box<T> {
    fn next(&mut self) -> Result<bool, InternalError> {
        (**self).next()
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        (**self).value(column_index)
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        (**self).column_label(column_index)
    }
}

impl<T: QueryResult + ?Sized> QueryResult for &mut T {
    fn next(&mut self) -> Result<bool, InternalError> {
        (**self).next()
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        (**self).value(column_index)
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        (**self).column_label(column_index)
    }
}

///
/// MergedResult
///
/// The single logical cursor over a distributed query. Decorators own
/// exactly one inner result.
///

pub trait MergedResult {
    fn next(&mut self) -> Result<bool, InternalError>;

    fn value(&self, column_index: usize) -> Result<&Value, InternalError>;

    fn column_count(&self) -> usize;

    fn column_label(&self, column_index: usize) -> Option<&str>;

    fn kind(&self) -> MergeKind;

    /// The wrapped result, for decorators.
    fn inner(&self) -> Option<&dyn MergedResult> {
        None
    }

    /// Every value of the current row.
    fn row(&self) -> Result<Vec<Value>, InternalError> {
        (0..self.column_count())
            .map(|index| self.value(index).cloned())
            .collect()
    }
}

/// Copy the current row of a shard cursor.
pub(crate) fn current_row(result: &dyn QueryResult) -> Result<Vec<Value>, InternalError> {
    (0..result.column_count())
        .map(|index| result.value(index).cloned())
        .collect()
}

/// Kinds of every layer, outermost first.
#[must_use]
pub fn chain_kinds(result: &dyn MergedResult) -> Vec<MergeKind> {
    let mut kinds = vec![result.kind()];
    let mut cursor = result.inner();
    while let Some(inner) = cursor {
        kinds.push(inner.kind());
        cursor = inner.inner();
    }

    kinds
}

///
/// MemoryQueryResult
///
/// In-memory shard cursor, for executors that buffer whole results and for
/// tests.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryQueryResult {
    labels: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
}

impl MemoryQueryResult {
    #[must_use]
    pub fn new(labels: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            labels: labels.iter().map(ToString::to_string).collect(),
            rows,
            position: None,
        }
    }

    /// Rows of integers under generated labels `c0`, `c1`, ...
    #[must_use]
    pub fn of_ints(rows: &[&[i64]]) -> Self {
        let width = rows.first().map_or(0, |row| row.len());
        let labels = (0..width).map(|index| format!("c{index}")).collect();

        Self {
            labels,
            rows: rows
                .iter()
                .map(|row| row.iter().copied().map(Value::Int).collect())
                .collect(),
            position: None,
        }
    }

    fn current(&self) -> Result<&[Value], InternalError> {
        self.position
            .and_then(|position| self.rows.get(position))
            .map(Vec::as_slice)
            .ok_or_else(|| InternalError::merge_invariant("query result has no current row"))
    }
}

impl QueryResult for MemoryQueryResult {
    fn next(&mut self) -> Result<bool, InternalError> {
        let next = self.position.map_or(0, |position| position + 1);
        self.position = Some(next.min(self.rows.len()));

        Ok(next < self.rows.len())
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        let row = self.current()?;
        row.get(column_index)
            .ok_or_else(|| InternalError::column_not_found(column_index, row.len()))
    }

    fn column_count(&self) -> usize {
        self.labels.len()
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        self.labels.get(column_index).map(String::as_str)
    }
}
