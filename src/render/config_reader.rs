use log::debug;

use crate::render::*;
use precinct_map::builder::Builder;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SHAPES_FILE: &str = "2024.geojson";
pub const DEFAULT_DATA_DIRECTORY: &str = "data";
pub const DEFAULT_SHAPES_DIRECTORY: &str = "shapes";
pub const DEFAULT_FEATURE_ID_PROPERTY: &str = "PRECINCT";

const DEFAULT_CSV: &str = "demoturnout2024.csv,demoturnout2024.csv";
const DEFAULT_PORTION: &str = "party_DEM_voted,party_REP_voted";
const DEFAULT_TOTAL: &str = "party_DEM,party_REP";
const DEFAULT_NAME: &str = "Democrat,Republican";
const DEFAULT_COLOR: &str = "blue,red";

/// Precincts renumbered after the shapes were drawn: their results are
/// shared evenly between the new precincts.
pub const DEFAULT_SPLITS: [(&str, [&str; 2]); 6] = [
    ("03-00", ["03-01", "03-02"]),
    ("06-09", ["06-11", "06-12"]),
    ("10-04", ["10-05", "10-06"]),
    ("12-05", ["12-10", "12-11"]),
    ("17-04", ["17-14", "17-15"]),
    ("19-12", ["19-22", "19-23"]),
];

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BucketSettings {
    pub width: f64,
    pub count: usize,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ArrowThresholdSettings {
    pub margin: f64,
    pub size: String,
}

/// The description of a map, with the keys of the map page parameters.
///
/// The parallel lists (csv, portion, total, name, color) are either JSON
/// lists or comma-separated strings.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapSettings {
    pub file: Option<String>,
    pub csv: Option<JSValue>,
    pub portion: Option<JSValue>,
    pub total: Option<JSValue>,
    pub name: Option<JSValue>,
    pub color: Option<JSValue>,
    pub title: Option<String>,
    pub labels: Option<bool>,
    #[serde(rename = "showTitle")]
    pub show_title: Option<bool>,
    pub key: Option<bool>,
    #[serde(rename = "showMap")]
    pub show_map: Option<bool>,
    #[serde(rename = "absoluteMode")]
    pub absolute_mode: Option<bool>,
    #[serde(rename = "styleMode")]
    pub style_mode: Option<String>,
    #[serde(rename = "dataDirectory")]
    pub data_directory: Option<String>,
    #[serde(rename = "shapesDirectory")]
    pub shapes_directory: Option<String>,
    #[serde(rename = "idField")]
    pub id_field: Option<String>,
    #[serde(rename = "featureIdProperty")]
    pub feature_id_property: Option<String>,
    pub splits: Option<BTreeMap<String, Vec<String>>>,
    pub buckets: Option<BucketSettings>,
    #[serde(rename = "arrowThresholds")]
    pub arrow_thresholds: Option<Vec<ArrowThresholdSettings>>,
}

impl MapSettings {
    pub fn data_directory(&self, root: &Path) -> PathBuf {
        root.join(
            self.data_directory
                .as_deref()
                .unwrap_or(DEFAULT_DATA_DIRECTORY),
        )
    }

    pub fn shapes_path(&self, root: &Path) -> PathBuf {
        root.join(
            self.shapes_directory
                .as_deref()
                .unwrap_or(DEFAULT_SHAPES_DIRECTORY),
        )
        .join(self.file.as_deref().unwrap_or(DEFAULT_SHAPES_FILE))
    }

    pub fn feature_id_property(&self) -> String {
        self.feature_id_property
            .clone()
            .unwrap_or_else(|| DEFAULT_FEATURE_ID_PROPERTY.to_string())
    }

    pub fn show_background(&self) -> bool {
        self.show_map.unwrap_or(true)
    }

    pub fn display_options(&self) -> MapResult<DisplayOptions> {
        let style_mode = match self.style_mode.as_deref() {
            Some(s) => s.parse::<StyleMode>().context(ConfigurationSnafu {})?,
            None => StyleMode::Gradient,
        };
        Ok(DisplayOptions {
            title: self.title.clone(),
            absolute_mode: self.absolute_mode.unwrap_or(false),
            style_mode,
            show_labels: self.labels.unwrap_or(false),
            show_title: self.show_title.unwrap_or(true),
            show_legend: self.key.unwrap_or(true),
            show_background: self.show_background(),
        })
    }

    /// The unit split rules. Without a `splits` key the default rules apply.
    fn split_pairs(&self) -> Vec<(String, Vec<String>)> {
        match self.splits.as_ref() {
            Some(splits) => splits
                .iter()
                .map(|(p, c)| (p.clone(), c.clone()))
                .collect(),
            None => DEFAULT_SPLITS
                .iter()
                .map(|(p, c)| (p.to_string(), c.iter().map(|x| x.to_string()).collect()))
                .collect(),
        }
    }

    fn arrow_thresholds_table(&self) -> MapResult<ArrowThresholds> {
        match self.arrow_thresholds.as_ref() {
            Some(l) => {
                let mut steps: Vec<(f64, GlyphSize)> = Vec::new();
                for t in l.iter() {
                    let size: GlyphSize = t.size.parse().context(ConfigurationSnafu {})?;
                    steps.push((t.margin, size));
                }
                ArrowThresholds::new(steps).context(ConfigurationSnafu {})
            }
            None => Ok(ArrowThresholds::default()),
        }
    }

    /// Validates the settings and assigns the colors of the series.
    pub fn to_configuration(&self) -> MapResult<MapConfiguration> {
        let files = read_js_list(&self.csv, "csv", DEFAULT_CSV)?;
        let portions = read_js_list(&self.portion, "portion", DEFAULT_PORTION)?;
        let totals = read_js_list(&self.total, "total", DEFAULT_TOTAL)?;
        let names = read_js_list(&self.name, "name", DEFAULT_NAME)?;
        let colors = read_js_list(&self.color, "color", DEFAULT_COLOR)?;
        debug!(
            "to_configuration: files: {:?} portions: {:?} totals: {:?}",
            files, portions, totals
        );

        let buckets = match self.buckets.as_ref() {
            Some(b) => BucketTable::uniform(b.width, b.count).context(ConfigurationSnafu {})?,
            None => BucketTable::default(),
        };
        let mut options = AggregateOptions::default();
        if let Some(id_field) = self.id_field.as_ref() {
            options.id_field = id_field.clone();
        }

        let mut builder = Builder::from_lists(&files, &portions, &totals, &names, &colors)
            .context(ConfigurationSnafu {})?
            .display(self.display_options()?)
            .buckets(buckets)
            .arrow_thresholds(self.arrow_thresholds_table()?)
            .aggregate_options(options);
        for (parent, children) in self.split_pairs() {
            builder = builder
                .split(&parent, &children)
                .context(ConfigurationSnafu {})?;
        }
        builder.build().context(ConfigurationSnafu {})
    }
}

pub fn read_settings(path: &str) -> MapResult<MapSettings> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let settings: MapSettings =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(settings)
}

/// Reads a list of strings, either as a JSON list or as a comma-separated
/// string. Items are trimmed.
fn read_js_list(x: &Option<JSValue>, key: &str, default: &str) -> MapResult<Vec<String>> {
    match x {
        None => Ok(split_list(default)),
        Some(JSValue::String(s)) => Ok(split_list(s)),
        Some(JSValue::Array(l)) => l
            .iter()
            .map(|v| v.as_str().map(|s| s.trim().to_string()))
            .collect::<Option<Vec<String>>>()
            .context(ParsingJsonListSnafu { key }),
        Some(_) => None.context(ParsingJsonListSnafu { key }),
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(|x| x.trim().to_string()).collect()
}
