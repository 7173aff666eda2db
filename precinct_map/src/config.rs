// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// Identifier of a geographic unit (a precinct).
pub type UnitId = String;

/// Identifier of a series. It is the portion field suffixed with the name of
/// its source file, which keeps it unique across sources.
pub type SeriesId = String;

/// A raw row of a tabular source, as returned by the readers.
pub type RawRow = BTreeMap<String, String>;

/// The name of a field once it has been tagged with its source file.
pub fn suffixed(field: &str, file: &str) -> String {
    format!("{}_{}", field, file)
}

/// The name of the per-file "all" field.
pub fn all_field(file: &str) -> String {
    suffixed("all", file)
}

/// Numeric coercion used everywhere a raw value is read.
/// Anything that does not parse as a finite number counts as 0.
pub fn coerce_number(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(x) if x.is_finite() => x,
        _ => 0.0,
    }
}

/// One tabular source referenced by a series.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct SourceRef {
    pub file: String,
    pub portion_field: String,
    pub total_field: String,
}

/// A data dimension (one candidate or one party) tracked across units.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Series {
    pub id: SeriesId,
    pub name: String,
    pub file: String,
    pub portion_field: String,
    pub total_field: String,
    pub preferred_color: Option<String>,
    pub enabled: bool,
}

impl Series {
    pub fn new(
        file: &str,
        portion_field: &str,
        total_field: &str,
        name: &str,
        preferred_color: Option<&str>,
    ) -> Series {
        Series {
            id: suffixed(portion_field, file),
            name: name.to_string(),
            file: file.to_string(),
            portion_field: portion_field.to_string(),
            total_field: total_field.to_string(),
            preferred_color: match preferred_color {
                Some(c) if !c.is_empty() && c != "any" => Some(c.to_string()),
                _ => None,
            },
            enabled: true,
        }
    }

    pub fn portion_key(&self) -> String {
        self.id.clone()
    }

    pub fn total_key(&self) -> String {
        suffixed(&self.total_field, &self.file)
    }

    pub fn all_key(&self) -> String {
        all_field(&self.file)
    }

    pub fn source(&self) -> SourceRef {
        SourceRef {
            file: self.file.clone(),
            portion_field: self.portion_field.clone(),
            total_field: self.total_field.clone(),
        }
    }
}

/// The merged record of one geographic unit.
///
/// Fields are named after their source file (see [`suffixed`]).
#[derive(PartialEq, Debug, Clone, Default)]
pub struct UnitRecord {
    pub id: UnitId,
    pub fields: BTreeMap<String, f64>,
}

impl UnitRecord {
    pub fn new(id: &str) -> UnitRecord {
        UnitRecord {
            id: id.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields.get(key).cloned()
    }

    /// The portion of the series, 0 when absent.
    pub fn portion(&self, series: &Series) -> f64 {
        self.get(&series.portion_key()).unwrap_or(0.0)
    }

    /// The raw denominator of the series, 0 when absent.
    pub fn total(&self, series: &Series) -> f64 {
        self.get(&series.total_key()).unwrap_or(0.0)
    }

    /// The value displayed for a series: the raw portion in absolute mode,
    /// the percentage of the denominator otherwise. A missing or zero
    /// denominator counts as 1.
    pub fn display_value(&self, series: &Series, absolute_mode: bool) -> f64 {
        let portion = self.portion(series);
        if absolute_mode {
            portion
        } else {
            let total = match self.total(series) {
                x if x == 0.0 => 1.0,
                x => x,
            };
            portion / total * 100.0
        }
    }
}

/// The merged data set: one record per retained unit.
pub type PrecinctData = BTreeMap<UnitId, UnitRecord>;

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct SeriesTotals {
    pub sum_portion: f64,
    pub sum_denominator: f64,
    pub percentage: f64,
}

/// Size class of an arrow glyph.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum GlyphSize {
    Small,
    Medium,
    Large,
}

impl GlyphSize {
    pub fn pixels(&self) -> u32 {
        match self {
            GlyphSize::Small => 14,
            GlyphSize::Medium => 22,
            GlyphSize::Large => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GlyphSize::Small => "small",
            GlyphSize::Medium => "medium",
            GlyphSize::Large => "large",
        }
    }
}

impl FromStr for GlyphSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(GlyphSize::Small),
            "medium" => Ok(GlyphSize::Medium),
            "large" => Ok(GlyphSize::Large),
            x => Err(ConfigError::UnknownGlyphSize(x.to_string())),
        }
    }
}

/// Errors detected while assembling a configuration. They are all fatal and
/// happen before any source is read.
#[derive(PartialEq, Debug, Clone)]
pub enum ConfigError {
    /// The parallel lists (files, portions, totals, names, colors) differ in length.
    MismatchedLengths {
        files: usize,
        portions: usize,
        totals: usize,
        names: usize,
        colors: usize,
    },
    EmptyConfiguration,
    DuplicateSeries(SeriesId),
    UnknownStyleMode(String),
    UnknownGlyphSize(String),
    InvalidBuckets { width: f64, count: usize },
    UnsortedArrowThresholds,
    EmptySplit(UnitId),
}

impl Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MismatchedLengths {
                files,
                portions,
                totals,
                names,
                colors,
            } => write!(
                f,
                "the number of files ({}), portion columns ({}), total columns ({}), names ({}) and colors ({}) must match",
                files, portions, totals, names, colors
            ),
            ConfigError::EmptyConfiguration => write!(f, "no series configured"),
            ConfigError::DuplicateSeries(id) => write!(f, "series {} is configured twice", id),
            ConfigError::UnknownStyleMode(m) => write!(f, "unknown style mode {:?}", m),
            ConfigError::UnknownGlyphSize(s) => write!(f, "unknown glyph size {:?}", s),
            ConfigError::InvalidBuckets { width, count } => write!(
                f,
                "invalid bucket table: width {} count {} (both must be positive)",
                width, count
            ),
            ConfigError::UnsortedArrowThresholds => {
                write!(f, "arrow thresholds must be positive and strictly ascending")
            }
            ConfigError::EmptySplit(id) => write!(f, "split rule for {} has no children", id),
        }
    }
}

/// Errors that prevent the aggregation from completing. No partial data set
/// is ever returned.
#[derive(PartialEq, Debug, Clone)]
pub enum AggregationError {
    Load { file: String, message: String },
    EmptySources,
}

impl Error for AggregationError {}

impl Display for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::Load { file, message } => {
                write!(f, "failed to load data file {}: {}", file, message)
            }
            AggregationError::EmptySources => write!(f, "no data source to aggregate"),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum StyleMode {
    /// Margin-bucketed shades of the leading series (linear shades when a
    /// single series is enabled).
    Gradient,
    /// Base color of the leading series, whatever the margin.
    WinnerTakeAll,
    /// Neutral fill with a directional glyph sized by the margin.
    Arrows,
}

impl StyleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleMode::Gradient => "gradient",
            StyleMode::WinnerTakeAll => "winnerTakeAll",
            StyleMode::Arrows => "arrows",
        }
    }
}

impl FromStr for StyleMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gradient" => Ok(StyleMode::Gradient),
            "winnerTakeAll" => Ok(StyleMode::WinnerTakeAll),
            "arrows" => Ok(StyleMode::Arrows),
            x => Err(ConfigError::UnknownStyleMode(x.to_string())),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DisplayOptions {
    pub title: Option<String>,
    pub absolute_mode: bool,
    pub style_mode: StyleMode,
    pub show_labels: bool,
    pub show_title: bool,
    pub show_legend: bool,
    pub show_background: bool,
}

impl DisplayOptions {
    pub const DEFAULT: DisplayOptions = DisplayOptions {
        title: None,
        absolute_mode: false,
        style_mode: StyleMode::Gradient,
        show_labels: false,
        show_title: true,
        show_legend: true,
        show_background: true,
    };
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions::DEFAULT
    }
}

/// A half-open margin interval `[min, max)`.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Bucket {
    pub min: f64,
    pub max: f64,
}

/// Ascending, contiguous margin intervals starting at 0. The last one is
/// open-ended.
#[derive(PartialEq, Debug, Clone)]
pub struct BucketTable {
    buckets: Vec<Bucket>,
}

impl BucketTable {
    pub const DEFAULT_WIDTH: f64 = 1.5;
    pub const DEFAULT_COUNT: usize = 10;

    pub fn uniform(width: f64, count: usize) -> Result<BucketTable, ConfigError> {
        if !(width.is_finite() && width > 0.0) || count == 0 {
            return Err(ConfigError::InvalidBuckets { width, count });
        }
        Ok(BucketTable {
            buckets: uniform_buckets(width, count),
        })
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Index of the first interval containing the margin. Negative (or NaN)
    /// margins are not found.
    pub fn index(&self, margin: f64) -> Option<usize> {
        self.buckets
            .iter()
            .position(|b| margin >= b.min && margin < b.max)
    }
}

impl Default for BucketTable {
    fn default() -> Self {
        BucketTable {
            buckets: uniform_buckets(BucketTable::DEFAULT_WIDTH, BucketTable::DEFAULT_COUNT),
        }
    }
}

fn uniform_buckets(width: f64, count: usize) -> Vec<Bucket> {
    (0..count)
        .map(|idx| Bucket {
            min: idx as f64 * width,
            max: if idx + 1 == count {
                f64::INFINITY
            } else {
                (idx + 1) as f64 * width
            },
        })
        .collect()
}

/// Margin thresholds for the arrow glyphs, coarser than the bucket table.
/// A margin below the first threshold produces no glyph.
#[derive(PartialEq, Debug, Clone)]
pub struct ArrowThresholds {
    steps: Vec<(f64, GlyphSize)>,
}

impl ArrowThresholds {
    pub fn new(steps: Vec<(f64, GlyphSize)>) -> Result<ArrowThresholds, ConfigError> {
        let ascending = steps.windows(2).all(|w| w[0].0 < w[1].0);
        let positive = steps.iter().all(|(t, _)| t.is_finite() && *t > 0.0);
        if steps.is_empty() || !ascending || !positive {
            return Err(ConfigError::UnsortedArrowThresholds);
        }
        Ok(ArrowThresholds { steps })
    }

    pub fn steps(&self) -> &[(f64, GlyphSize)] {
        &self.steps
    }

    pub fn classify(&self, margin: f64) -> Option<GlyphSize> {
        self.steps
            .iter()
            .rev()
            .find(|(threshold, _)| margin >= *threshold)
            .map(|(_, size)| *size)
    }
}

impl Default for ArrowThresholds {
    fn default() -> Self {
        ArrowThresholds {
            steps: vec![
                (3.0, GlyphSize::Small),
                (10.0, GlyphSize::Medium),
                (20.0, GlyphSize::Large),
            ],
        }
    }
}

/// Units that must be redistributed evenly into several sub-units.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SplitRules {
    rules: BTreeMap<UnitId, Vec<UnitId>>,
}

impl SplitRules {
    pub fn new() -> SplitRules {
        SplitRules::default()
    }

    pub fn insert(&mut self, parent: &str, children: &[String]) -> Result<(), ConfigError> {
        if children.is_empty() {
            return Err(ConfigError::EmptySplit(parent.to_string()));
        }
        self.rules.insert(parent.to_string(), children.to_vec());
        Ok(())
    }

    pub fn children(&self, parent: &str) -> Option<&[UnitId]> {
        self.rules.get(parent).map(|c| c.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// How raw rows are read by the aggregator.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregateOptions {
    /// The field naming the unit in each row.
    pub id_field: String,
    /// Fields left out of the per-file "all" total of a direct row.
    pub excluded_from_all: Vec<String>,
    /// Fields left out of the "all" total of a row shared between split units.
    pub excluded_from_split_all: Vec<String>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            id_field: "id".to_string(),
            excluded_from_all: vec!["under".to_string()],
            excluded_from_split_all: vec!["under".to_string(), "over".to_string()],
        }
    }
}
