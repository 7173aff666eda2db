use std::collections::BTreeMap;

use crate::config::*;

/// Sums the portion and denominator of each series over all the units.
///
/// Missing fields count as 0. The percentage is 0 when the summed
/// denominator is 0.
pub fn totals(records: &PrecinctData, series: &[&Series]) -> BTreeMap<SeriesId, SeriesTotals> {
    series
        .iter()
        .map(|s| {
            let sum_portion: f64 = records.values().map(|r| r.portion(s)).sum();
            let sum_denominator: f64 = records.values().map(|r| r.total(s)).sum();
            let percentage = if sum_denominator > 0.0 {
                sum_portion / sum_denominator * 100.0
            } else {
                0.0
            };
            (
                s.id.clone(),
                SeriesTotals {
                    sum_portion,
                    sum_denominator,
                    percentage,
                },
            )
        })
        .collect()
}

/// The legend text of a series: the rounded portion sum in absolute mode,
/// the percentage with two decimals otherwise.
pub fn legend_label(name: &str, totals: &SeriesTotals, absolute_mode: bool) -> String {
    if absolute_mode {
        format!("{}: {}", name, totals.sum_portion.round())
    } else {
        format!("{}: {:.2}%", name, totals.percentage)
    }
}
