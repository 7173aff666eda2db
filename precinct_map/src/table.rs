use log::debug;

use crate::config::*;
use crate::map::MapConfiguration;
use crate::style::format_value;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TableColumn {
    pub series_id: SeriesId,
    pub title: String,
    /// Title usable as a field name (no dots).
    pub field: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TableRow {
    pub unit_id: UnitId,
    /// One value per column, in column order.
    pub values: Vec<f64>,
    /// Overall leader minus overall runner-up in this unit. Absent with
    /// fewer than two enabled series.
    pub margin: Option<f64>,
}

/// The detail table of the enabled series.
#[derive(PartialEq, Debug, Clone)]
pub struct ResultsTable {
    pub absolute_mode: bool,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
    /// The two series with the largest summed values over all the units.
    pub leaders: Option<(SeriesId, SeriesId)>,
}

impl ResultsTable {
    pub fn header(&self) -> Vec<String> {
        let mut h = vec!["Precinct".to_string()];
        h.extend(self.columns.iter().map(|c| c.field.clone()));
        h.push("Margin".to_string());
        h
    }

    /// The formatted cells of a row, matching [`ResultsTable::header`].
    pub fn cells(&self, row: &TableRow) -> Vec<String> {
        let mut cells = vec![row.unit_id.clone()];
        cells.extend(row.values.iter().map(|v| format_value(*v, self.absolute_mode)));
        cells.push(match row.margin {
            Some(m) => format_value(m, self.absolute_mode),
            None => "N/A".to_string(),
        });
        cells
    }
}

/// Projects the records into the detail table.
///
/// The margin column always compares the same two series, the overall top
/// two, even in units where another series leads.
pub fn project(records: &PrecinctData, config: &MapConfiguration) -> ResultsTable {
    let absolute = config.display().absolute_mode;
    let enabled = config.enabled_series();

    let columns: Vec<TableColumn> = enabled
        .iter()
        .map(|s| TableColumn {
            series_id: s.id.clone(),
            title: s.name.clone(),
            field: s.name.replace('.', "_"),
        })
        .collect();

    let rows_values: Vec<(&UnitId, Vec<f64>)> = records
        .iter()
        .map(|(unit_id, r)| {
            let values = enabled
                .iter()
                .map(|s| r.display_value(s, absolute))
                .collect();
            (unit_id, values)
        })
        .collect();

    let mut sums: Vec<(usize, f64)> = (0..enabled.len())
        .map(|idx| (idx, rows_values.iter().map(|(_, v)| v[idx]).sum::<f64>()))
        .collect();
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top_two = match sums.as_slice() {
        [first, second, ..] => Some((first.0, second.0)),
        _ => None,
    };
    debug!("project: overall ranking {:?}", sums);

    let rows = rows_values
        .into_iter()
        .map(|(unit_id, values)| TableRow {
            unit_id: unit_id.clone(),
            margin: top_two.map(|(w, s)| values[w] - values[s]),
            values,
        })
        .collect();

    ResultsTable {
        absolute_mode: absolute,
        leaders: top_two.map(|(w, s)| (enabled[w].id.clone(), enabled[s].id.clone())),
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn records(rows: &[(&str, f64, f64, f64)]) -> PrecinctData {
        rows.iter()
            .map(|(id, a, b, all)| {
                let mut r = UnitRecord::new(id);
                r.fields.insert("a_f".to_string(), *a);
                r.fields.insert("b_f".to_string(), *b);
                r.fields.insert("all_f".to_string(), *all);
                (id.to_string(), r)
            })
            .collect()
    }

    fn config() -> MapConfiguration {
        Builder::new()
            .series("f", "a", "all", "Mr. A", None)
            .series("f", "b", "all", "B", None)
            .build()
            .unwrap()
    }

    #[test]
    fn margin_uses_the_overall_top_two() {
        let data = records(&[
            ("p1", 60.0, 40.0, 100.0),
            ("p2", 30.0, 70.0, 100.0),
            ("p3", 80.0, 20.0, 100.0),
        ]);
        let table = project(&data, &config());
        // a sums to 170%, b to 130%: a leads overall.
        assert_eq!(table.leaders, Some(("a_f".to_string(), "b_f".to_string())));
        let margins: Vec<Option<f64>> = table
            .rows
            .iter()
            .map(|r| r.margin.map(|m| (m * 100.0).round() / 100.0))
            .collect();
        assert_eq!(margins, vec![Some(20.0), Some(-40.0), Some(60.0)]);
        assert_eq!(table.header(), vec!["Precinct", "Mr_ A", "B", "Margin"]);
        assert_eq!(
            table.cells(&table.rows[1]),
            vec!["p2", "30.00%", "70.00%", "-40.00%"]
        );
    }

    #[test]
    fn absolute_mode_formats_counts() {
        let mut config = config();
        config.set_absolute_mode(true);
        let data = records(&[("p1", 12.0, 30.0, 50.0), ("p2", 20.0, 5.0, 30.0)]);
        let table = project(&data, &config);
        assert_eq!(table.leaders, Some(("b_f".to_string(), "a_f".to_string())));
        assert_eq!(table.cells(&table.rows[0]), vec!["p1", "12", "30", "18"]);
        assert_eq!(table.cells(&table.rows[1]), vec!["p2", "20", "5", "-15"]);
    }

    #[test]
    fn single_series_has_no_margin() {
        let mut config = config();
        config.set_enabled("b_f", false);
        let data = records(&[("p1", 60.0, 40.0, 100.0)]);
        let table = project(&data, &config);
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.leaders, None);
        assert_eq!(table.cells(&table.rows[0]), vec!["p1", "60.00%", "N/A"]);
    }

    #[test]
    fn near_zero_margin_has_no_sign() {
        let mut config = config();
        config.set_absolute_mode(true);
        let data = records(&[("p1", 10.0, 10.3, 30.0), ("p2", 50.0, 0.0, 50.0)]);
        let table = project(&data, &config);
        assert_eq!(table.leaders, Some(("a_f".to_string(), "b_f".to_string())));
        assert_eq!(table.cells(&table.rows[0]), vec!["p1", "10", "10", "0"]);
    }
}
