// Primitives for reading and writing CSV files.

use log::debug;

use std::io;
use std::path::Path;

use crate::render::*;

/// Reads a results file. The first row holds the column names, every cell
/// is kept as a string.
pub fn read_csv_rows(path: &Path) -> MapResult<Vec<RawRow>> {
    let path_str = path.display().to_string();
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path: &path_str })?;
    read_records(rdr, &path_str)
}

fn read_records<R: io::Read>(mut rdr: csv::Reader<R>, path: &str) -> MapResult<Vec<RawRow>> {
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_rows: {}: header: {:?}", path, header);

    let mut res: Vec<RawRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let row: RawRow = header
            .iter()
            .zip(line.iter())
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        res.push(row);
    }
    Ok(res)
}

/// Writes the detail table: the precinct, one column per enabled series and
/// the margin.
pub fn write_table(path: &Path, table: &ResultsTable) -> MapResult<()> {
    let path_str = path.display().to_string();
    let wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path: &path_str })?;
    write_table_records(wtr, table, &path_str)
}

fn write_table_records<W: io::Write>(
    mut wtr: csv::Writer<W>,
    table: &ResultsTable,
    path: &str,
) -> MapResult<()> {
    wtr.write_record(table.header())
        .context(CsvWriteSnafu { path })?;
    for row in table.rows.iter() {
        wtr.write_record(table.cells(row))
            .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingSnafu { path })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use precinct_map::builder::Builder;

    fn reader(s: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(s.as_bytes())
    }

    #[test]
    fn rows_keep_strings_by_column() {
        let rows = read_records(
            reader("id, dem ,rep\n01,10,n/a\n02,3\n"),
            "test.csv",
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("dem").map(|s| s.as_str()), Some("10"));
        assert_eq!(rows[0].get("rep").map(|s| s.as_str()), Some("n/a"));
        // Short rows only carry the cells they have.
        assert_eq!(rows[1].get("rep"), None);
    }

    #[test]
    fn table_is_written_with_margin() {
        let config = Builder::new()
            .series("f", "a", "all", "Mr. A", None)
            .series("f", "b", "all", "B", None)
            .build()
            .unwrap();
        let mut r = UnitRecord::new("p1");
        r.fields.insert("a_f".to_string(), 25.0);
        r.fields.insert("b_f".to_string(), 75.0);
        r.fields.insert("all_f".to_string(), 100.0);
        let mut records = PrecinctData::new();
        records.insert("p1".to_string(), r);
        let map = PrecinctMap::from_records(config, records);

        let mut buf: Vec<u8> = Vec::new();
        write_table_records(csv::Writer::from_writer(&mut buf), &map.table(), "mem").unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert_eq!(s, "Precinct,Mr_ A,B,Margin\np1,25.00%,75.00%,50.00%\n");
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let res = read_csv_rows(Path::new("/nonexistent/results.csv"));
        assert!(matches!(res, Err(MapError::CsvOpen { .. })));
    }
}
