//! Descriptive statistics over a table's numeric columns.

use crate::domain::model::{Record, Table};
use crate::utils::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, NaN below two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Linear interpolation between closest ranks, `sorted` ascending.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

pub fn describe(table: &Table) -> Result<Vec<ColumnSummary>> {
    let mut summaries = Vec::new();
    for column in table.numeric_columns() {
        let mut values: Vec<f64> = table
            .optional_numeric_column(&column)?
            .into_iter()
            .flatten()
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        summaries.push(ColumnSummary {
            count: values.len(),
            mean: mean(&values),
            std: sample_std(&values),
            min: values.first().copied().unwrap_or(f64::NAN),
            q25: percentile(&values, 0.25),
            median: percentile(&values, 0.5),
            q75: percentile(&values, 0.75),
            max: values.last().copied().unwrap_or(f64::NAN),
            column,
        });
    }
    Ok(summaries)
}

/// `describe` laid out as a table: one row per statistic, one column per
/// feature.
pub fn summary_table(summaries: &[ColumnSummary]) -> Table {
    let mut columns = vec!["statistic".to_string()];
    columns.extend(summaries.iter().map(|s| s.column.clone()));

    let rows: [(&str, fn(&ColumnSummary) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.median),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];

    let mut table = Table::new(columns);
    for (name, stat) in rows {
        let mut record = Record::new();
        record.set("statistic", Value::String(name.to_string()));
        for summary in summaries {
            record.set(summary.column.clone(), Value::from(stat(summary)));
        }
        table.push(record);
    }
    table
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x) * (x - mean_x);
        var_y += (y - mean_y) * (y - mean_y);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

pub fn correlation_matrix(table: &Table) -> Result<CorrelationMatrix> {
    let columns = table.numeric_columns();
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| table.optional_numeric_column(c))
        .collect::<Result<_>>()?;

    let values = data
        .iter()
        .map(|a| data.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Ok(CorrelationMatrix { columns, values })
}

/// Mean of `value` per distinct `by`, ordered by group key.
pub fn group_mean(table: &Table, by: &str, value: &str) -> Result<Vec<(String, f64)>> {
    table.require_columns(&[by])?;
    let values = table.optional_numeric_column(value)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (record, v) in table.records.iter().zip(values) {
        let entry = groups.entry(record.display(by)).or_default();
        if let Some(v) = v {
            entry.push(v);
        }
    }
    Ok(groups.into_iter().map(|(k, vs)| (k, mean(&vs))).collect())
}

/// Occurrences per distinct value, most frequent first.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>> {
    table.require_columns(&[column])?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in &table.records {
        *counts.entry(record.display(column)).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonIssue {
    pub season: String,
    pub winners: usize,
}

/// Seasons whose winner flag is not set on exactly one row.
pub fn seasons_without_single_winner(table: &Table, season: &str, winner: &str) -> Result<Vec<SeasonIssue>> {
    table.require_columns(&[season])?;
    let flags = table.optional_numeric_column(winner)?;

    let mut winners: BTreeMap<String, usize> = BTreeMap::new();
    for (record, flag) in table.records.iter().zip(flags) {
        let count = winners.entry(record.display(season)).or_default();
        if flag == Some(1.0) {
            *count += 1;
        }
    }
    Ok(winners
        .into_iter()
        .filter(|(_, count)| *count != 1)
        .map(|(season, winners)| SeasonIssue { season, winners })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_csv(
            b"Team,Season,points,Goal_Diff,Winner\n\
              A,2015,90,50,1\n\
              B,2015,70,10,0\n\
              C,2016,80,30,1\n\
              D,2016,60,,0\n",
        )
        .unwrap()
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 0.5), 2.5);
        assert_eq!(percentile(&sorted, 0.25), 1.75);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_describe_numeric_columns() {
        let summaries = describe(&table()).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["Season", "points", "Goal_Diff", "Winner"]);

        let points = &summaries[1];
        assert_eq!(points.count, 4);
        assert_eq!(points.mean, 75.0);
        assert_eq!(points.min, 60.0);
        assert_eq!(points.max, 90.0);
        assert!((points.std - 12.909944487358056).abs() < 1e-9);

        let goal_diff = &summaries[2];
        assert_eq!(goal_diff.count, 3);
        assert_eq!(goal_diff.median, 30.0);
    }

    #[test]
    fn test_summary_table_layout() {
        let summary = summary_table(&describe(&table()).unwrap());
        assert_eq!(summary.len(), 8);
        assert_eq!(summary.columns[0], "statistic");
        assert_eq!(summary.records[0].display("statistic"), "count");
        assert_eq!(summary.records[0].number("points"), Some(4.0));
    }

    #[test]
    fn test_correlation_matrix() {
        let matrix = correlation_matrix(&table()).unwrap();
        let p = matrix.columns.iter().position(|c| c == "points").unwrap();
        let g = matrix.columns.iter().position(|c| c == "Goal_Diff").unwrap();

        assert!((matrix.values[p][p] - 1.0).abs() < 1e-12);
        assert!(matrix.values[p][g] > 0.9);
        assert_eq!(matrix.values[p][g], matrix.values[g][p]);
    }

    #[test]
    fn test_pearson_constant_is_nan() {
        let a = [Some(1.0), Some(1.0), Some(1.0)];
        let b = [Some(1.0), Some(2.0), Some(3.0)];
        assert!(pearson(&a, &b).is_nan());
    }

    #[test]
    fn test_group_mean_and_value_counts() {
        let t = table();
        assert_eq!(
            group_mean(&t, "Season", "points").unwrap(),
            vec![("2015".to_string(), 80.0), ("2016".to_string(), 70.0)]
        );
        assert_eq!(
            value_counts(&t, "Winner").unwrap(),
            vec![("0".to_string(), 2), ("1".to_string(), 2)]
        );
    }

    #[test]
    fn test_season_validation() {
        let mut t = table();
        assert!(seasons_without_single_winner(&t, "Season", "Winner").unwrap().is_empty());

        t.records[1].set("Winner", Value::from(1));
        assert_eq!(
            seasons_without_single_winner(&t, "Season", "Winner").unwrap(),
            vec![SeasonIssue {
                season: "2015".to_string(),
                winners: 2
            }]
        );
    }
}
