use crate::rule::DataNode;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// RouteStrategyKind
///
/// Which routing strategy produced a [`RouteContext`].
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStrategyKind {
    Standard,
    Cartesian,
    DatabaseBroadcast,
    TableBroadcast,
    Unicast,
    Hint,
    DataSourceHint,
    PassThrough,
}

impl RouteStrategyKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Standard,
        Self::Cartesian,
        Self::DatabaseBroadcast,
        Self::TableBroadcast,
        Self::Unicast,
        Self::Hint,
        Self::DataSourceHint,
        Self::PassThrough,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Cartesian => "cartesian",
            Self::DatabaseBroadcast => "database_broadcast",
            Self::TableBroadcast => "table_broadcast",
            Self::Unicast => "unicast",
            Self::Hint => "hint",
            Self::DataSourceHint => "data_source_hint",
            Self::PassThrough => "pass_through",
        }
    }
}

impl fmt::Display for RouteStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// RouteMapper
///
/// Logical name and the actual name it maps to.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RouteMapper {
    pub logic_name: String,
    pub actual_name: String,
}

impl RouteMapper {
    #[must_use]
    pub fn new(logic_name: impl Into<String>, actual_name: impl Into<String>) -> Self {
        Self {
            logic_name: logic_name.into(),
            actual_name: actual_name.into(),
        }
    }

    /// A name that maps to itself.
    #[must_use]
    pub fn identity(name: &str) -> Self {
        Self::new(name, name)
    }
}

impl fmt::Display for RouteMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.logic_name, self.actual_name)
    }
}

///
/// RouteUnit
///
/// One physical target: a data source plus the actual tables the statement
/// touches there.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct RouteUnit {
    pub data_source_mapper: RouteMapper,
    pub table_mappers: Vec<RouteMapper>,
}

impl RouteUnit {
    #[must_use]
    pub const fn new(data_source_mapper: RouteMapper, table_mappers: Vec<RouteMapper>) -> Self {
        Self {
            data_source_mapper,
            table_mappers,
        }
    }

    /// Actual data source name.
    #[must_use]
    pub fn data_source(&self) -> &str {
        &self.data_source_mapper.actual_name
    }

    /// Actual table for `logic_table` in this unit, matched case-insensitively.
    #[must_use]
    pub fn actual_table(&self, logic_table: &str) -> Option<&str> {
        self.table_mappers
            .iter()
            .find(|mapper| mapper.logic_name.eq_ignore_ascii_case(logic_table))
            .map(|mapper| mapper.actual_name.as_str())
    }

    pub fn logic_tables(&self) -> impl Iterator<Item = &str> {
        self.table_mappers
            .iter()
            .map(|mapper| mapper.logic_name.as_str())
    }
}

impl fmt::Display for RouteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.data_source_mapper.actual_name)?;
        for (index, mapper) in self.table_mappers.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{mapper}")?;
        }
        f.write_str("]")
    }
}

///
/// RouteContext
///
/// Routing outcome of one statement.
///
/// Units keep insertion order (table discovery order, then algorithm order)
/// and are unique. `original_data_nodes[i]` holds the nodes the `i`-th
/// insert row or AND-group routed to. No units means the statement matches
/// no data; it is not a routing fault.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RouteContext {
    strategy: RouteStrategyKind,
    route_units: Vec<RouteUnit>,
    original_data_nodes: Vec<Vec<DataNode>>,
}

impl RouteContext {
    #[must_use]
    pub const fn new(strategy: RouteStrategyKind) -> Self {
        Self {
            strategy,
            route_units: Vec::new(),
            original_data_nodes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn strategy(&self) -> RouteStrategyKind {
        self.strategy
    }

    #[must_use]
    pub fn route_units(&self) -> &[RouteUnit] {
        &self.route_units
    }

    /// Units for post-routing decoration. Callers holding a cached context
    /// work on their own copy.
    pub const fn route_units_mut(&mut self) -> &mut Vec<RouteUnit> {
        &mut self.route_units
    }

    #[must_use]
    pub fn original_data_nodes(&self) -> &[Vec<DataNode>] {
        &self.original_data_nodes
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.route_units.is_empty()
    }

    /// Distinct actual data sources, in unit order.
    #[must_use]
    pub fn data_sources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for unit in &self.route_units {
            if !names.contains(&unit.data_source()) {
                names.push(unit.data_source());
            }
        }

        names
    }

    /// Whether every unit targets the same data source.
    #[must_use]
    pub fn is_single_data_source(&self) -> bool {
        self.data_sources().len() == 1
    }

    /// Append a unit unless an equal one is already present.
    pub fn push_unit(&mut self, unit: RouteUnit) {
        if !self.route_units.contains(&unit) {
            self.route_units.push(unit);
        }
    }

    pub(crate) fn push_original_nodes(&mut self, nodes: Vec<DataNode>) {
        self.original_data_nodes.push(nodes);
    }
}
