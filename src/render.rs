use log::{debug, info, warn};

use precinct_map::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::render::catalog::*;
use crate::render::config_reader::*;

pub mod catalog;
pub mod config_reader;
pub mod io_csv;
pub mod io_geojson;
pub mod io_xlsx;
pub mod output;

#[derive(Debug, Snafu)]
pub enum MapError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a list of strings or a comma-separated string for {key}"))]
    ParsingJsonList { key: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    Writing {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid GeoJSON feature collection: {message}"))]
    GeoJsonFormat { message: String },
    #[snafu(display("Invalid map configuration"))]
    Configuration { source: ConfigError },
    #[snafu(display("Could not aggregate the results files"))]
    Aggregation { source: AggregationError },
    #[snafu(display("Election {name} not found in the catalog"))]
    UnknownElection { name: String },
    #[snafu(display("Unknown series {name}"))]
    UnknownSeries { name: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MapResult<T> = Result<T, MapError>;

/// Reads the results files from a data directory. The reader is chosen by
/// the file extension: Excel workbooks with calamine, everything else as CSV.
pub struct FileRowSource {
    data_directory: PathBuf,
}

impl FileRowSource {
    pub fn new(data_directory: &Path) -> FileRowSource {
        FileRowSource {
            data_directory: data_directory.to_path_buf(),
        }
    }
}

impl RowSource for FileRowSource {
    type Error = MapError;

    fn fetch_rows(&mut self, file: &str) -> MapResult<Vec<RawRow>> {
        let p: PathBuf = self.data_directory.join(file);
        info!("Attempting to read results file {:?}", p.display());
        let extension = p
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => io_xlsx::read_xlsx_rows(&p),
            _ => io_csv::read_csv_rows(&p),
        }
    }
}

/// Where the settings come from, and the directory their relative paths
/// are resolved against.
fn load_settings(args: &Args) -> MapResult<(MapSettings, PathBuf)> {
    if let Some(election_name) = args.election.as_ref() {
        let catalog_path = args.catalog.clone().unwrap_or_else(|| "maps.json".to_string());
        let elections = read_catalog(&catalog_path)?;
        let election = find_election(&elections, election_name)?;
        info!("load_settings: using catalog entry {:?}", election.name);
        let root = parent_dir(&catalog_path)?;
        return Ok((settings_from_election(election), root));
    }
    match args.config.as_ref() {
        Some(config_path) => {
            let settings = read_settings(config_path)?;
            Ok((settings, parent_dir(config_path)?))
        }
        None => {
            info!("load_settings: no configuration provided, using the default map");
            Ok((MapSettings::default(), PathBuf::from(".")))
        }
    }
}

fn parent_dir(path: &str) -> MapResult<PathBuf> {
    let p = Path::new(path)
        .parent()
        .context(MissingParentDirSnafu {})?
        .to_path_buf();
    Ok(p)
}

/// Applies the command line display overrides.
fn apply_overrides(config: &mut MapConfiguration, args: &Args) -> MapResult<()> {
    if let Some(mode_str) = args.style_mode.as_ref() {
        let mode: StyleMode = mode_str.parse().context(ConfigurationSnafu {})?;
        config.set_style_mode(mode);
    }
    if args.absolute {
        config.set_absolute_mode(true);
    }
    for name in args.disable.iter() {
        let series_id = config
            .find_series(name)
            .context(UnknownSeriesSnafu { name: name.clone() })?
            .id
            .clone();
        config.set_enabled(&series_id, false);
    }
    debug!("apply_overrides: display {:?}", config.display());
    Ok(())
}

/// Lists the elections of the catalog with the vote counts of their
/// candidates. Elections whose files cannot be read are listed without counts.
fn list_elections(args: &Args) -> MapResult<()> {
    let catalog_path = args.catalog.clone().unwrap_or_else(|| "maps.json".to_string());
    let elections = read_catalog(&catalog_path)?;
    let root = parent_dir(&catalog_path)?;
    let mut row_source = FileRowSource::new(&root.join(DEFAULT_DATA_DIRECTORY));
    let mut sums_cache: HashMap<String, ColumnSums> = HashMap::new();

    for election in filter_by_tags(&elections, &args.tag) {
        println!("{} [{}]", election.name, election.tags.join(", "));
        let mut sums_by_file: HashMap<String, ColumnSums> = HashMap::new();
        for file in election.files() {
            if let Some(sums) = sums_cache.get(&file) {
                sums_by_file.insert(file, sums.clone());
                continue;
            }
            match row_source.fetch_rows(&file) {
                Ok(rows) => {
                    let sums = column_sums(&rows);
                    sums_cache.insert(file.clone(), sums.clone());
                    sums_by_file.insert(file, sums);
                }
                Err(e) => warn!("list_elections: could not read {}: {}", file, e),
            }
        }
        for summary in summarize(election, &sums_by_file) {
            match summary.counts {
                Some(c) => println!(
                    "  {:<30} {:<6} {:>10} / {:<10} {:>6.2}%",
                    summary.name,
                    summary.party.unwrap_or_default(),
                    c.votes,
                    c.total_votes,
                    c.percent
                ),
                None => println!(
                    "  {:<30} {:<6} (no data)",
                    summary.name,
                    summary.party.unwrap_or_default()
                ),
            }
        }
    }
    Ok(())
}

pub fn run(args: &Args) -> MapResult<()> {
    if args.list {
        return list_elections(args);
    }

    let (settings, root) = load_settings(args)?;
    debug!("run: settings: {:?}", settings);
    let mut config = settings.to_configuration()?;
    apply_overrides(&mut config, args)?;

    let mut row_source = FileRowSource::new(&settings.data_directory(&root));
    let mut map = PrecinctMap::load(config, &mut row_source).context(AggregationSnafu {})?;
    info!("run: {} precincts with data", map.records().len());

    let features = io_geojson::read_features(
        &settings.shapes_path(&root),
        &settings.feature_id_property(),
    )?;
    let rendered = map.render(&features);
    let plan = output::render_plan(&map, &rendered, settings.show_background());

    if let Some(out_path) = args.out.as_ref() {
        output::write_plan(out_path, &plan)?;
    }

    if let Some(table_path) = args.table.as_ref() {
        let table = map.table();
        io_csv::write_table(Path::new(table_path), &table)?;
        info!("run: detail table with {} rows written to {}", table.rows.len(), table_path);
    }

    if let Some(reference_path) = args.reference.as_ref() {
        let reference = output::read_plan(reference_path)?;
        output::check_reference(&reference, &plan)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let d = std::env::temp_dir().join(format!("precinctmap-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&d);
        fs::create_dir_all(d.join("data")).unwrap();
        fs::create_dir_all(d.join("shapes")).unwrap();
        d
    }

    const RESULTS: &str = "id,dem,rep,under\n01,60,30,5\n02,20,70,0\n03,45,45,1\n";

    const SHAPES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"PRECINCT": "01"},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 0]]]}},
            {"type": "Feature", "properties": {"PRECINCT": "02"},
             "geometry": {"type": "Point", "coordinates": [5, 5]}},
            {"type": "Feature", "properties": {"PRECINCT": "99"},
             "geometry": {"type": "Point", "coordinates": [9, 9]}}
        ]
    }"#;

    const CONFIG: &str = r#"{
        "file": "precincts.geojson",
        "csv": "results.csv,results.csv",
        "portion": "dem,rep",
        "total": "all,all",
        "name": "Democrat,Republican",
        "color": "blue,red",
        "title": "Test election",
        "splits": {}
    }"#;

    fn setup(name: &str) -> PathBuf {
        let _ = env_logger::builder().is_test(true).try_init();
        let d = scratch_dir(name);
        fs::write(d.join("data").join("results.csv"), RESULTS).unwrap();
        fs::write(d.join("shapes").join("precincts.geojson"), SHAPES).unwrap();
        fs::write(d.join("map.json"), CONFIG).unwrap();
        d
    }

    fn args(cmd: &[&str]) -> Args {
        let mut l = vec!["precinctmap"];
        l.extend(cmd);
        Args::parse_from(l)
    }

    #[test]
    fn run_writes_plan_and_table() {
        let d = setup("plan");
        let config = d.join("map.json").display().to_string();
        let out = d.join("plan.json").display().to_string();
        let table = d.join("table.csv").display().to_string();
        run(&args(&["--config", &config, "--out", &out, "--table", &table])).unwrap();

        let plan: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(plan["title"], "Test election");
        let features = plan["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["id"], "01");
        // "under" is not part of the "all" column: 125 / 270.
        assert_eq!(plan["legend"][0]["label"], "Democrat: 46.30%");

        let table_csv = fs::read_to_string(&table).unwrap();
        let mut lines = table_csv.lines();
        assert_eq!(lines.next(), Some("Precinct,Democrat,Republican,Margin"));
        // Republican leads overall, the margin is Republican minus Democrat.
        assert_eq!(lines.next(), Some("01,66.67%,33.33%,-33.33%"));
        assert_eq!(lines.next(), Some("02,22.22%,77.78%,55.56%"));
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let d = setup("reference");
        let config = d.join("map.json").display().to_string();
        let out = d.join("plan.json").display().to_string();
        run(&args(&["--config", &config, "--out", &out])).unwrap();
        assert!(run(&args(&["--config", &config, "--reference", &out])).is_ok());

        let winner = d.join("wta.json").display().to_string();
        let res = run(&args(&[
            "--config",
            &config,
            "--absolute",
            "--reference",
            &out,
            "--out",
            &winner,
        ]));
        assert!(res.is_err());
    }

    #[test]
    fn unknown_series_cannot_be_disabled() {
        let d = setup("disable");
        let config = d.join("map.json").display().to_string();
        let res = run(&args(&["--config", &config, "--disable", "Green"]));
        assert!(matches!(res, Err(MapError::UnknownSeries { .. })));
        assert!(run(&args(&["--config", &config, "--disable", "Republican"])).is_ok());
    }

    #[test]
    fn missing_results_file_fails_the_load() {
        let d = setup("missing");
        fs::remove_file(d.join("data").join("results.csv")).unwrap();
        let config = d.join("map.json").display().to_string();
        let res = run(&args(&["--config", &config]));
        assert!(matches!(res, Err(MapError::Aggregation { .. })));
    }
}
