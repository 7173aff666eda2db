use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Display;

use crate::config::*;

/// Where the aggregator gets its rows from.
///
/// Every file is requested exactly once per aggregation.
pub trait RowSource {
    type Error: Display;

    fn fetch_rows(&mut self, file: &str) -> Result<Vec<RawRow>, Self::Error>;
}

/// Per-file parsed data: unit id -> suffixed field -> value.
type FileData = HashMap<UnitId, BTreeMap<String, f64>>;

/// Merges the tabular sources into one record per unit.
///
/// A unit is kept only if every distinct file produced a record for it
/// (possibly as the child of a split unit). Only the portion, total and "all"
/// fields that the sources reference are copied into the records.
///
/// Arguments:
/// * `sources` one entry per series, files may repeat
/// * `splits` the units to redistribute into sub-units
/// * `options` the identifier field and the fields left out of "all"
/// * `row_source` the provider of the raw rows
pub fn aggregate<S: RowSource>(
    sources: &[SourceRef],
    splits: &SplitRules,
    options: &AggregateOptions,
    row_source: &mut S,
) -> Result<PrecinctData, AggregationError> {
    if sources.is_empty() {
        return Err(AggregationError::EmptySources);
    }

    let mut unique_files: Vec<&str> = Vec::new();
    {
        let mut seen: HashSet<&str> = HashSet::new();
        for s in sources.iter() {
            if seen.insert(s.file.as_str()) {
                unique_files.push(s.file.as_str());
            }
        }
    }
    info!(
        "aggregate: {} sources over {} distinct files",
        sources.len(),
        unique_files.len()
    );

    // All the files are loaded before anything is merged: one failure and
    // nothing is returned.
    let mut file_data: HashMap<&str, FileData> = HashMap::new();
    for &file in unique_files.iter() {
        let rows = row_source
            .fetch_rows(file)
            .map_err(|e| AggregationError::Load {
                file: file.to_string(),
                message: e.to_string(),
            })?;
        info!("aggregate: read {} rows from {}", rows.len(), file);
        file_data.insert(file, parse_file_rows(file, &rows, splits, options));
    }

    let mut presence: BTreeMap<&str, usize> = BTreeMap::new();
    for data in file_data.values() {
        for unit_id in data.keys() {
            *presence.entry(unit_id.as_str()).or_insert(0) += 1;
        }
    }

    let required = unique_files.len();
    let mut res: PrecinctData = presence
        .iter()
        .filter(|(_, count)| **count == required)
        .map(|(unit_id, _)| (unit_id.to_string(), UnitRecord::new(unit_id)))
        .collect();
    let dropped = presence.len() - res.len();
    if dropped > 0 {
        warn!(
            "aggregate: {} units are missing from at least one file and are left out",
            dropped
        );
    }

    for source in sources.iter() {
        let Some(data) = file_data.get(source.file.as_str()) else {
            continue;
        };
        let keys = [
            suffixed(&source.portion_field, &source.file),
            suffixed(&source.total_field, &source.file),
            all_field(&source.file),
        ];
        for (unit_id, record) in res.iter_mut() {
            let Some(file_row) = data.get(unit_id) else {
                continue;
            };
            for key in keys.iter() {
                if let Some(v) = file_row.get(key) {
                    record.fields.insert(key.clone(), *v);
                }
            }
        }
    }

    info!("aggregate: {} units retained", res.len());
    Ok(res)
}

/// Parses the rows of one file, applying the split rules.
fn parse_file_rows(
    file: &str,
    rows: &[RawRow],
    splits: &SplitRules,
    options: &AggregateOptions,
) -> FileData {
    let all_key = all_field(file);
    let mut parsed: FileData = HashMap::new();

    for (lineno, row) in rows.iter().enumerate() {
        let unit_id = match row.get(&options.id_field).map(|s| s.trim()) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                warn!("parse_file_rows: {}: row {} has no id, skipping", file, lineno);
                continue;
            }
        };

        let values: Vec<(&String, f64)> = row
            .iter()
            .filter(|(k, _)| **k != options.id_field)
            .map(|(k, v)| (k, coerce_number(v)))
            .collect();

        match splits.children(&unit_id) {
            Some(children) => {
                let n = children.len() as f64;
                let all_total = sum_all(&values, &options.excluded_from_split_all);
                debug!(
                    "parse_file_rows: {}: splitting {} into {:?}",
                    file, unit_id, children
                );
                for child in children.iter() {
                    let entry = parsed.entry(child.clone()).or_default();
                    for (k, v) in values.iter() {
                        *entry.entry(suffixed(k, file)).or_insert(0.0) += v / n;
                    }
                    // The "all" share of a child is the sum of its divided
                    // shares, divided again by the number of children. The
                    // last parent feeding a child sets it.
                    entry.insert(all_key.clone(), all_total / n / n);
                }
            }
            None => {
                let entry = parsed.entry(unit_id).or_default();
                for (k, v) in values.iter() {
                    entry.insert(suffixed(k, file), *v);
                }
                entry.insert(all_key.clone(), sum_all(&values, &options.excluded_from_all));
            }
        }
    }
    parsed
}

fn sum_all(values: &[(&String, f64)], excluded: &[String]) -> f64 {
    values
        .iter()
        .filter(|(k, _)| !excluded.contains(k))
        .map(|(_, v)| *v)
        .sum()
}
