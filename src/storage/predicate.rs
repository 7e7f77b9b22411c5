//! Typed WHERE clause builder.
//!
//! Filters are collected as an ordered list of `(column, operator, values)`
//! triples and compiled into SQL text with positional `?` placeholders plus
//! the matching argument list. Values never end up in the SQL text.

use std::fmt;

use rusqlite::types::Value;

/// Columns of the edge table that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Lemma,
    Upos,
    PLemma,
    PUpos,
    Deprel,
    Freq,
    Shard,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Lemma => "lemma",
            Column::Upos => "upos",
            Column::PLemma => "p_lemma",
            Column::PUpos => "p_upos",
            Column::Deprel => "deprel",
            Column::Freq => "freq",
            Column::Shard => "shard",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ge,
    Lt,
    AnyOf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: Column,
    pub op: Op,
    pub values: Vec<Value>,
}

/// Builder of a conjunction of predicates.
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    alias: Option<&'static str>,
    items: Vec<Predicate>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualify all columns with a table alias.
    pub fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    fn push(mut self, column: Column, op: Op, values: Vec<Value>) -> Self {
        self.items.push(Predicate { column, op, values });
        self
    }

    pub fn eq_str(self, column: Column, value: &str) -> Self {
        self.push(column, Op::Eq, vec![Value::Text(value.to_string())])
    }

    /// Add an equality test only when a non-empty value is given.
    pub fn eq_opt(self, column: Column, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.eq_str(column, v),
            _ => self,
        }
    }

    pub fn ge(self, column: Column, value: i64) -> Self {
        self.push(column, Op::Ge, vec![Value::Integer(value)])
    }

    pub fn lt(self, column: Column, value: i64) -> Self {
        self.push(column, Op::Lt, vec![Value::Integer(value)])
    }

    pub fn any_of<S: AsRef<str>>(self, column: Column, values: &[S]) -> Self {
        let values = values
            .iter()
            .map(|v| Value::Text(v.as_ref().to_string()))
            .collect();
        self.push(column, Op::AnyOf, values)
    }

    /// Restrict the shard column to `[from, to)`.
    pub fn shard_range(self, range: Option<(u32, u32)>) -> Self {
        match range {
            Some((from, to)) => self
                .ge(Column::Shard, i64::from(from))
                .lt(Column::Shard, i64::from(to)),
            None => self,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compile into a WHERE clause body (without the keyword) and its
    /// arguments. An empty builder yields a tautology.
    pub fn build(&self) -> (String, Vec<Value>) {
        if self.items.is_empty() {
            return ("1 = 1".to_string(), Vec::new());
        }
        let mut parts = Vec::with_capacity(self.items.len());
        let mut args = Vec::new();
        for pred in &self.items {
            let col = match self.alias {
                Some(alias) => format!("{alias}.{}", pred.column),
                None => pred.column.to_string(),
            };
            let sql = match pred.op {
                Op::Eq => format!("{col} = ?"),
                Op::Ge => format!("{col} >= ?"),
                Op::Lt => format!("{col} < ?"),
                Op::AnyOf if pred.values.is_empty() => "0 = 1".to_string(),
                Op::AnyOf if pred.values.len() == 1 => format!("{col} = ?"),
                Op::AnyOf => {
                    let marks = vec!["?"; pred.values.len()].join(", ");
                    format!("{col} IN ({marks})")
                }
            };
            parts.push(sql);
            args.extend(pred.values.iter().cloned());
        }
        (parts.join(" AND "), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let (sql, args) = PredicateBuilder::new()
            .with_alias("a")
            .eq_str(Column::Lemma, "team")
            .eq_opt(Column::Upos, Some(""))
            .eq_opt(Column::PUpos, Some("NOUN"))
            .any_of(Column::Deprel, &["obj", "iobj"])
            .ge(Column::Freq, 2)
            .build();
        assert_eq!(
            sql,
            "a.lemma = ? AND a.p_upos = ? AND a.deprel IN (?, ?) AND a.freq >= ?"
        );
        assert_eq!(
            args,
            vec![
                Value::Text("team".into()),
                Value::Text("NOUN".into()),
                Value::Text("obj".into()),
                Value::Text("iobj".into()),
                Value::Integer(2),
            ]
        );
    }

    #[test]
    fn test_values_are_not_interpolated() {
        let (sql, args) = PredicateBuilder::new()
            .eq_str(Column::Lemma, "x' OR '1'='1")
            .build();
        assert_eq!(sql, "lemma = ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_shard_range_and_edge_cases() {
        let (sql, args) = PredicateBuilder::new().shard_range(Some((2, 4))).build();
        assert_eq!(sql, "shard >= ? AND shard < ?");
        assert_eq!(args, vec![Value::Integer(2), Value::Integer(4)]);

        let empty: [&str; 0] = [];
        assert_eq!(
            PredicateBuilder::new().any_of(Column::Deprel, &empty).build().0,
            "0 = 1"
        );
        assert_eq!(PredicateBuilder::new().build().0, "1 = 1");
    }
}
