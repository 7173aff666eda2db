use log::debug;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use std::path::Path;

use crate::render::*;

/// Reads the first worksheet of an Excel workbook. The first row holds the
/// column names.
pub fn read_xlsx_rows(path: &Path) -> MapResult<Vec<RawRow>> {
    let path_str = path.display().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path: &path_str })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path: &path_str })?
        .context(OpeningExcelSnafu { path: &path_str })?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu { path: &path_str })?
        .iter()
        .map(cell_to_string)
        .collect();
    debug!("read_xlsx_rows: header: {:?}", header);

    let res: Vec<RawRow> = iter
        .map(|row| {
            header
                .iter()
                .zip(row.iter())
                .map(|(k, cell)| (k.clone(), cell_to_string(cell)))
                .collect()
        })
        .collect();
    Ok(res)
}

/// Renders a cell the way it would appear in a CSV export.
fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => String::new(),
        other => {
            debug!("cell_to_string: unsupported cell {:?}", other);
            String::new()
        }
    }
}
