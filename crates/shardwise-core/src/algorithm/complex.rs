use crate::{
    algorithm::{
        AlgorithmProps, ComplexKeysShardingAlgorithm, ComplexShardingValues, ModShardingAlgorithm,
        push_unique, require_integer, target_for_suffix,
    },
    error::InternalError,
};
use num_bigint::BigInt;

///
/// ComplexModShardingAlgorithm
///
/// Multi-column modulo: the target suffix is the sum of one value per
/// configured column, modulo `sharding-count`. Evaluated over every
/// combination of candidate values. When any column has no equality values
/// the statement cannot be narrowed and every target is returned.
///

#[derive(Clone, Debug)]
pub struct ComplexModShardingAlgorithm {
    columns: Vec<String>,
    count: u64,
}

impl ComplexModShardingAlgorithm {
    pub const SHARDING_COLUMNS: &'static str = "sharding-columns";
    pub const SHARDING_COUNT: &'static str = "sharding-count";

    #[must_use]
    pub fn new(columns: Vec<String>, count: u64) -> Self {
        let columns = columns
            .into_iter()
            .map(|column| column.to_ascii_lowercase())
            .collect();

        Self { columns, count }
    }

    pub fn from_props(props: &AlgorithmProps) -> Result<Self, InternalError> {
        Ok(Self::new(
            props.require_text_list(Self::SHARDING_COLUMNS)?,
            props.require_positive(Self::SHARDING_COUNT)?,
        ))
    }
}

impl ComplexKeysShardingAlgorithm for ComplexModShardingAlgorithm {
    fn sharding_column_count(&self) -> Option<usize> {
        Some(self.columns.len())
    }

    fn shard(
        &self,
        available: &[String],
        values: &ComplexShardingValues,
    ) -> Result<Vec<String>, InternalError> {
        // Only residues matter; each step keeps at most `count` distinct sums.
        let mut per_column = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            match values.lists.get(column) {
                Some(list) if !list.is_empty() => {
                    let mut residues = Vec::new();
                    for value in list.iter().filter(|value| !value.is_null()) {
                        let integer = require_integer(value)?;
                        push_unique(
                            &mut residues,
                            ModShardingAlgorithm::suffix(&integer, self.count),
                        );
                    }
                    per_column.push(residues);
                }
                _ => return Ok(available.to_vec()),
            }
        }

        let mut sums = vec![BigInt::from(0)];
        for residues in &per_column {
            let mut next = Vec::new();
            for sum in &sums {
                for residue in residues {
                    let combined = sum + residue;
                    push_unique(
                        &mut next,
                        ModShardingAlgorithm::suffix(&combined, self.count),
                    );
                }
            }
            sums = next;
        }

        let mut targets = Vec::new();
        for suffix in &sums {
            if let Some(target) = target_for_suffix(available, suffix) {
                push_unique(&mut targets, target);
            }
        }

        Ok(targets)
    }
}
