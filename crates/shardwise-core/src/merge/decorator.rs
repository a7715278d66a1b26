//! Decorators: each owns exactly one inner merged result.

use crate::{
    error::InternalError,
    merge::{MergeKind, memory::KeyIndex, result::MergedResult},
    statement::ResolvedPagination,
    value::Value,
};

///
/// PaginationMergedResult
///
/// Skips `skip` rows without exposing them, then emits at most `take`.
///

pub struct PaginationMergedResult<'a> {
    inner: Box<dyn MergedResult + 'a>,
    pagination: ResolvedPagination,
    skipped: bool,
    emitted: u64,
}

impl<'a> PaginationMergedResult<'a> {
    #[must_use]
    pub fn new(inner: Box<dyn MergedResult + 'a>, pagination: ResolvedPagination) -> Self {
        Self {
            inner,
            pagination,
            skipped: false,
            emitted: 0,
        }
    }
}

impl MergedResult for PaginationMergedResult<'_> {
    fn next(&mut self) -> Result<bool, InternalError> {
        if !self.skipped {
            self.skipped = true;
            for _ in 0..self.pagination.skip {
                if !self.inner.next()? {
                    return Ok(false);
                }
            }
        }

        if let Some(take) = self.pagination.take
            && self.emitted >= take
        {
            return Ok(false);
        }
        if !self.inner.next()? {
            return Ok(false);
        }
        self.emitted += 1;

        Ok(true)
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        self.inner.value(column_index)
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        self.inner.column_label(column_index)
    }

    fn kind(&self) -> MergeKind {
        MergeKind::Pagination
    }

    fn inner(&self) -> Option<&dyn MergedResult> {
        Some(self.inner.as_ref())
    }
}

///
/// DistinctMergedResult
///
/// Emits each projected row tuple once, in first-seen order.
///

pub struct DistinctMergedResult<'a> {
    inner: Box<dyn MergedResult + 'a>,
    seen: KeyIndex,
}

impl<'a> DistinctMergedResult<'a> {
    #[must_use]
    pub fn new(inner: Box<dyn MergedResult + 'a>) -> Self {
        Self {
            inner,
            seen: KeyIndex::default(),
        }
    }
}

impl MergedResult for DistinctMergedResult<'_> {
    fn next(&mut self) -> Result<bool, InternalError> {
        while self.inner.next()? {
            let row = self.inner.row()?;
            if self.seen.find_or_insert(&row).1 {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn value(&self, column_index: usize) -> Result<&Value, InternalError> {
        self.inner.value(column_index)
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_label(&self, column_index: usize) -> Option<&str> {
        self.inner.column_label(column_index)
    }

    fn kind(&self) -> MergeKind {
        MergeKind::Distinct
    }

    fn inner(&self) -> Option<&dyn MergedResult> {
        Some(self.inner.as_ref())
    }
}
