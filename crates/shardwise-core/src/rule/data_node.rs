use crate::error::{ConfigError, InternalError};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// DataNode
///
/// One physical `(data source, actual table)` location of a logical table.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct DataNode {
    pub data_source: String,
    pub table: String,
}

impl DataNode {
    #[must_use]
    pub fn new(data_source: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            table: table.into(),
        }
    }

    /// Parse `data_source.table`.
    pub(crate) fn parse(item: &str, expression: &str) -> Result<Self, InternalError> {
        match item.split_once('.') {
            Some((data_source, table))
                if !data_source.trim().is_empty()
                    && !table.trim().is_empty()
                    && !table.contains('.') =>
            {
                Ok(Self::new(data_source.trim(), table.trim()))
            }
            _ => Err(malformed(
                expression,
                format!("'{item}' is not of the form data_source.table"),
            )),
        }
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.data_source, self.table)
    }
}

/// Expand an inline data-node expression into its data nodes, in order.
pub(crate) fn expand_data_nodes(expression: &str) -> Result<Vec<DataNode>, InternalError> {
    expand_inline(expression)?
        .iter()
        .map(|item| DataNode::parse(item, expression))
        .collect()
}

/// Expand `${a..b}` ranges and `${[x, y]}` lists.
///
/// The expression is a comma-separated list of items; each item expands to
/// the ordered cartesian product of its groups, leftmost group outermost.
pub(crate) fn expand_inline(expression: &str) -> Result<Vec<String>, InternalError> {
    let mut expanded = Vec::new();
    for item in split_top_level(expression)? {
        let item = item.trim();
        if item.is_empty() {
            return Err(malformed(expression, "empty item"));
        }
        expanded.extend(expand_item(item, expression)?);
    }

    if expanded.is_empty() {
        return Err(malformed(expression, "expression is empty"));
    }

    Ok(expanded)
}

// Split on commas that are not inside a `${...}` group.
fn split_top_level(expression: &str) -> Result<Vec<&str>, InternalError> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (index, ch) in expression.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed(expression, "unbalanced '}'"))?;
            }
            ',' if depth == 0 => {
                items.push(&expression[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(malformed(expression, "unterminated '${'"));
    }
    items.push(&expression[start..]);

    Ok(items)
}

///
/// Segment
///

enum Segment {
    Literal(String),
    Group(Vec<String>),
}

fn expand_item(item: &str, expression: &str) -> Result<Vec<String>, InternalError> {
    let mut segments = Vec::new();
    let mut rest = item;

    while let Some(open) = rest.find("${") {
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        let after = &rest[open + 2..];
        let close = after
            .find('}')
            .ok_or_else(|| malformed(expression, "unterminated '${'"))?;
        segments.push(Segment::Group(expand_group(&after[..close], expression)?));
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    let mut results = vec![String::new()];
    for segment in segments {
        results = match segment {
            Segment::Literal(text) => results
                .into_iter()
                .map(|prefix| prefix + &text)
                .collect(),
            Segment::Group(options) => results
                .iter()
                .flat_map(|prefix| options.iter().map(move |option| format!("{prefix}{option}")))
                .collect(),
        };
    }

    Ok(results)
}

fn expand_group(body: &str, expression: &str) -> Result<Vec<String>, InternalError> {
    let body = body.trim();

    if let Some(list) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        let options = list
            .split(',')
            .map(|option| option.trim().trim_matches(|c| c == '\'' || c == '"'))
            .filter(|option| !option.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if options.is_empty() {
            return Err(malformed(expression, "empty '${[...]}' list"));
        }

        return Ok(options);
    }

    if let Some((start, end)) = body.split_once("..") {
        let (start, end) = (start.trim(), end.trim());
        let (Ok(first), Ok(last)) = (start.parse::<i64>(), end.parse::<i64>()) else {
            return Err(malformed(
                expression,
                format!("'{body}' is not an integer range"),
            ));
        };
        if last < first {
            return Err(malformed(expression, format!("range '{body}' is descending")));
        }

        // `${00..15}` keeps the zero padding of its lower bound.
        let width = if start.len() > 1 && start.starts_with('0') {
            start.len()
        } else {
            0
        };

        return Ok((first..=last)
            .map(|value| format!("{value:0width$}"))
            .collect());
    }

    Err(malformed(
        expression,
        format!("'${{{body}}}' is neither a range nor a list"),
    ))
}

fn malformed(expression: &str, reason: impl Into<String>) -> InternalError {
    InternalError::rule_config(ConfigError::InvalidDataNodes {
        expression: expression.to_string(),
        reason: reason.into(),
    })
}
