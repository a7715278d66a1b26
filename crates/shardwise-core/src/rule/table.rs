use crate::{
    error::{ConfigError, InternalError},
    rule::{DataNode, ShardingStrategy, data_node::expand_data_nodes},
};

///
/// TableRule
///
/// Resolved sharding rule of one logical table: its physical data nodes in
/// configuration order and one strategy per sharding dimension.
///

#[derive(Clone, Debug)]
pub struct TableRule {
    logic_table: String,
    data_nodes: Vec<DataNode>,
    data_sources: Vec<String>,
    tables_by_data_source: Vec<Vec<String>>,
    database_strategy: ShardingStrategy,
    table_strategy: ShardingStrategy,
    key_generate_column: Option<String>,
}

impl TableRule {
    pub(crate) fn new(
        logic_table: &str,
        actual_data_nodes: Option<&str>,
        all_data_sources: &[String],
        database_strategy: ShardingStrategy,
        table_strategy: ShardingStrategy,
        key_generate_column: Option<&str>,
    ) -> Result<Self, InternalError> {
        let data_nodes = match actual_data_nodes {
            Some(expression) => expand_data_nodes(expression)?,
            None => all_data_sources
                .iter()
                .map(|data_source| DataNode::new(data_source.as_str(), logic_table))
                .collect(),
        };

        let mut data_sources: Vec<String> = Vec::new();
        let mut tables_by_data_source: Vec<Vec<String>> = Vec::new();
        for node in &data_nodes {
            if !all_data_sources.contains(&node.data_source) {
                return Err(InternalError::rule_config(ConfigError::UnknownDataSource {
                    logic_table: logic_table.to_string(),
                    data_source: node.data_source.clone(),
                }));
            }

            match data_sources.iter().position(|ds| *ds == node.data_source) {
                Some(index) => tables_by_data_source[index].push(node.table.clone()),
                None => {
                    data_sources.push(node.data_source.clone());
                    tables_by_data_source.push(vec![node.table.clone()]);
                }
            }
        }

        Ok(Self {
            logic_table: logic_table.to_string(),
            data_nodes,
            data_sources,
            tables_by_data_source,
            database_strategy,
            table_strategy,
            key_generate_column: key_generate_column.map(str::to_ascii_lowercase),
        })
    }

    #[must_use]
    pub fn logic_table(&self) -> &str {
        &self.logic_table
    }

    #[must_use]
    pub fn data_nodes(&self) -> &[DataNode] {
        &self.data_nodes
    }

    /// Data sources holding this table, in first-appearance order.
    #[must_use]
    pub fn data_sources(&self) -> &[String] {
        &self.data_sources
    }

    /// Actual tables of this table on `data_source`, in node order.
    #[must_use]
    pub fn actual_tables(&self, data_source: &str) -> &[String] {
        self.data_sources
            .iter()
            .position(|ds| ds == data_source)
            .map_or(&[] as &[String], |index| {
                self.tables_by_data_source[index].as_slice()
            })
    }

    #[must_use]
    pub const fn database_strategy(&self) -> &ShardingStrategy {
        &self.database_strategy
    }

    #[must_use]
    pub const fn table_strategy(&self) -> &ShardingStrategy {
        &self.table_strategy
    }

    #[must_use]
    pub fn key_generate_column(&self) -> Option<&str> {
        self.key_generate_column.as_deref()
    }

    /// Whether `column` (lower-case) drives either sharding dimension.
    #[must_use]
    pub fn is_sharding_column(&self, column: &str) -> bool {
        self.database_strategy
            .sharding_columns()
            .iter()
            .chain(self.table_strategy.sharding_columns())
            .any(|candidate| candidate == column)
    }

    /// Every sharding column of both dimensions, database first, unique.
    #[must_use]
    pub fn sharding_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for column in self
            .database_strategy
            .sharding_columns()
            .iter()
            .chain(self.table_strategy.sharding_columns())
        {
            if !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }

        columns
    }

    #[must_use]
    pub const fn uses_hint(&self) -> bool {
        self.database_strategy.is_hint() || self.table_strategy.is_hint()
    }

    /// Position of one node in configuration order.
    #[must_use]
    pub fn node_index(&self, data_source: &str, table: &str) -> Option<usize> {
        self.data_nodes
            .iter()
            .position(|node| node.data_source == data_source && node.table == table)
    }

    /// Shard shape: the data source of every node, in order.
    pub(crate) fn shape(&self) -> impl Iterator<Item = &str> {
        self.data_nodes.iter().map(|node| node.data_source.as_str())
    }
}
