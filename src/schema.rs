//! Column mapping for the three input tables and the presence rule shared by
//! the loader and the cohort reshaper.
//!
//! Each table is described by a [`TableSchema`]. Resolving a schema against a
//! CSV header yields a [`ColumnMap`] of named fields, so nothing downstream of
//! the loader ever depends on column positions or on the exact header text.

/// How a logical field is located in a CSV header
#[derive(Debug, Clone, Copy)]
pub enum ColumnSpec {
    /// Matched by name, case-insensitively, against any of the aliases
    Named {
        field: &'static str,
        aliases: &'static [&'static str],
    },
    /// Taken from a fixed position regardless of its header text
    Positional { field: &'static str, index: usize },
}

impl ColumnSpec {
    pub const fn named(field: &'static str, aliases: &'static [&'static str]) -> Self {
        ColumnSpec::Named { field, aliases }
    }

    pub const fn positional(field: &'static str, index: usize) -> Self {
        ColumnSpec::Positional { field, index }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ColumnSpec::Named { field, .. } | ColumnSpec::Positional { field, .. } => field,
        }
    }
}

/// Expected layout of one input table
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub columns: &'static [ColumnSpec],
    /// Collect every column not claimed by `columns` (in header order)
    pub trailing: bool,
}

/// Per-customer RFM metrics, matched by header name
pub const RFM_SCHEMA: TableSchema = TableSchema {
    columns: &[
        ColumnSpec::named("customer_id", &["customer_unique_id", "customer_id", "id"]),
        ColumnSpec::named("recency", &["recency"]),
        ColumnSpec::named("frequency", &["frequency"]),
        ColumnSpec::named("monetary", &["monetary"]),
        ColumnSpec::named("rfm_score", &["rfm_score", "score"]),
        ColumnSpec::named("segment", &["segment"]),
    ],
    trailing: false,
};

/// Revenue per segment: a (segment, value) pair in the first two columns
pub const REVENUE_SCHEMA: TableSchema = TableSchema {
    columns: &[
        ColumnSpec::positional("segment", 0),
        ColumnSpec::positional("total_revenue", 1),
    ],
    trailing: false,
};

/// Cohort retention: cohort label first, one column per period after it
pub const RETENTION_SCHEMA: TableSchema = TableSchema {
    columns: &[ColumnSpec::positional("cohort_label", 0)],
    trailing: true,
};

/// Header positions of a resolved [`TableSchema`]
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    fields: Vec<(&'static str, usize)>,
    trailing: Vec<usize>,
}

impl ColumnMap {
    /// Header position of a field declared in the schema
    pub fn index(&self, field: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, idx)| *idx)
    }

    /// Positions of the unclaimed columns, in header order
    pub fn trailing(&self) -> &[usize] {
        &self.trailing
    }
}

impl TableSchema {
    /// Resolve the schema against a header row.
    ///
    /// Returns a human-readable reason when a column cannot be located.
    pub fn resolve<S: AsRef<str>>(&self, header: &[S]) -> std::result::Result<ColumnMap, String> {
        let names: Vec<&str> = header.iter().map(|h| h.as_ref().trim()).collect();
        let mut fields = Vec::with_capacity(self.columns.len());

        for spec in self.columns {
            let idx = match *spec {
                ColumnSpec::Named { field, aliases } => names
                    .iter()
                    .position(|name| aliases.iter().any(|alias| name.eq_ignore_ascii_case(alias)))
                    .ok_or_else(|| {
                        format!(
                            "missing column '{}' (accepted names: {}; found: {})",
                            field,
                            aliases.join(", "),
                            names.join(", ")
                        )
                    })?,
                ColumnSpec::Positional { field, index } => {
                    if index >= names.len() {
                        return Err(format!(
                            "expected at least {} columns to read '{}' positionally, found {}",
                            index + 1,
                            field,
                            names.len()
                        ));
                    }
                    index
                }
            };
            fields.push((spec.field(), idx));
        }

        let trailing = if self.trailing {
            (0..names.len())
                .filter(|idx| fields.iter().all(|(_, claimed)| claimed != idx))
                .collect()
        } else {
            Vec::new()
        };

        Ok(ColumnMap { fields, trailing })
    }
}

/// Keep a measure only when it is a finite number.
///
/// Polars casts unparseable text to null; `NaN` and infinities slip through
/// that cast as numbers and are treated as absent here. A zero is present.
pub fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Narrow a present measure to an integer score, accepting integral floats
/// such as `9.0`
pub fn integral_score(value: Option<f64>) -> Option<i64> {
    present(value)
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfm_schema_matches_aliases_case_insensitively() {
        let header = [
            "customer_unique_id",
            "Recency",
            "frequency",
            "monetary",
            "RFM_score",
            "segment",
            "r_score",
        ];
        let map = RFM_SCHEMA.resolve(&header).unwrap();
        assert_eq!(map.index("customer_id"), Some(0));
        assert_eq!(map.index("recency"), Some(1));
        assert_eq!(map.index("rfm_score"), Some(4));
        assert_eq!(map.index("segment"), Some(5));
        assert_eq!(map.index("unknown"), None);
        assert!(map.trailing().is_empty());
    }

    #[test]
    fn test_rfm_schema_reports_missing_column() {
        let header = ["customer_id", "recency", "frequency", "monetary", "segment"];
        let err = RFM_SCHEMA.resolve(&header).unwrap_err();
        assert!(err.contains("rfm_score"), "unexpected reason: {}", err);
    }

    #[test]
    fn test_revenue_schema_is_positional() {
        let map = REVENUE_SCHEMA.resolve(&["seg", "payment_value"]).unwrap();
        assert_eq!(map.index("segment"), Some(0));
        assert_eq!(map.index("total_revenue"), Some(1));

        assert!(REVENUE_SCHEMA.resolve(&["segment"]).is_err());
    }

    #[test]
    fn test_retention_schema_collects_periods() {
        let map = RETENTION_SCHEMA
            .resolve(&["cohort_month", "1", "2", "3"])
            .unwrap();
        assert_eq!(map.index("cohort_label"), Some(0));
        assert_eq!(map.trailing(), &[1, 2, 3]);
    }

    #[test]
    fn test_present_drops_non_finite_values() {
        assert_eq!(present(Some(0.25)), Some(0.25));
        assert_eq!(present(Some(0.0)), Some(0.0));
        assert_eq!(present(None), None);
        assert_eq!(present(Some(f64::NAN)), None);
        assert_eq!(present(Some(f64::INFINITY)), None);
    }

    #[test]
    fn test_integral_score() {
        assert_eq!(integral_score(Some(12.0)), Some(12));
        assert_eq!(integral_score(Some(-3.0)), Some(-3));
        assert_eq!(integral_score(Some(9.5)), None);
        assert_eq!(integral_score(Some(f64::NAN)), None);
        assert_eq!(integral_score(Some(1e300)), None);
        assert_eq!(integral_score(None), None);
    }
}
