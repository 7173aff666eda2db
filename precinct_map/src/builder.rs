pub use crate::config::*;
use crate::map::MapConfiguration;

/// A builder for map configurations.
///
/// ```
/// pub use precinct_map::builder::Builder;
/// pub use precinct_map::StyleMode;
/// # use precinct_map::ConfigError;
///
/// let config = Builder::new()
///     .series("turnout.csv", "party_DEM_voted", "party_DEM", "Democrat", Some("blue"))
///     .series("turnout.csv", "party_REP_voted", "party_REP", "Republican", Some("red"))
///     .style_mode(StyleMode::WinnerTakeAll)
///     .split("03-00", &["03-01".to_string(), "03-02".to_string()])?
///     .build()?;
///
/// assert_eq!(config.enabled_series().len(), 2);
/// assert_eq!(config.scale_for("party_REP_voted_turnout.csv").name, "red");
///
/// # Ok::<(), ConfigError>(())
/// ```
pub struct Builder {
    pub(crate) _series: Vec<Series>,
    pub(crate) _display: DisplayOptions,
    pub(crate) _buckets: BucketTable,
    pub(crate) _arrow_thresholds: ArrowThresholds,
    pub(crate) _splits: SplitRules,
    pub(crate) _aggregate_options: AggregateOptions,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _series: Vec::new(),
            _display: DisplayOptions::DEFAULT,
            _buckets: BucketTable::default(),
            _arrow_thresholds: ArrowThresholds::default(),
            _splits: SplitRules::new(),
            _aggregate_options: AggregateOptions::default(),
        }
    }

    /// Builds from the parallel lists of the page parameters.
    ///
    /// All the lists must have the same length. An empty color stands for no
    /// preference.
    pub fn from_lists(
        files: &[String],
        portions: &[String],
        totals: &[String],
        names: &[String],
        colors: &[String],
    ) -> Result<Builder, ConfigError> {
        let n = files.len();
        if [portions.len(), totals.len(), names.len(), colors.len()]
            .iter()
            .any(|l| *l != n)
        {
            return Err(ConfigError::MismatchedLengths {
                files: files.len(),
                portions: portions.len(),
                totals: totals.len(),
                names: names.len(),
                colors: colors.len(),
            });
        }
        let mut b = Builder::new();
        for idx in 0..n {
            b = b.series(
                files[idx].trim(),
                portions[idx].trim(),
                totals[idx].trim(),
                names[idx].trim(),
                Some(colors[idx].trim()),
            );
        }
        Ok(b)
    }

    /// Adds a series.
    ///
    /// file: the tabular source holding the columns
    /// portion: the column counted for this series
    /// total: the column used as denominator
    pub fn series(
        mut self,
        file: &str,
        portion: &str,
        total: &str,
        name: &str,
        preferred_color: Option<&str>,
    ) -> Builder {
        self._series
            .push(Series::new(file, portion, total, name, preferred_color));
        self
    }

    pub fn display(mut self, display: DisplayOptions) -> Builder {
        self._display = display;
        self
    }

    pub fn style_mode(mut self, mode: StyleMode) -> Builder {
        self._display.style_mode = mode;
        self
    }

    pub fn absolute_mode(mut self, absolute: bool) -> Builder {
        self._display.absolute_mode = absolute;
        self
    }

    pub fn buckets(mut self, buckets: BucketTable) -> Builder {
        self._buckets = buckets;
        self
    }

    pub fn arrow_thresholds(mut self, thresholds: ArrowThresholds) -> Builder {
        self._arrow_thresholds = thresholds;
        self
    }

    pub fn split(mut self, parent: &str, children: &[String]) -> Result<Builder, ConfigError> {
        self._splits.insert(parent, children)?;
        Ok(self)
    }

    pub fn aggregate_options(mut self, options: AggregateOptions) -> Builder {
        self._aggregate_options = options;
        self
    }

    /// Validates the configuration and assigns the colors.
    ///
    /// Absolute mode is only kept with winner-take-all.
    pub fn build(self) -> Result<MapConfiguration, ConfigError> {
        let mut display = self._display;
        if display.absolute_mode {
            display.style_mode = StyleMode::WinnerTakeAll;
        }
        MapConfiguration::new(
            self._series,
            display,
            self._buckets,
            self._arrow_thresholds,
            self._splits,
            self._aggregate_options,
        )
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn from_lists_reports_all_lengths() {
        let res = Builder::from_lists(
            &strings(&["a.csv", "a.csv"]),
            &strings(&["x", "y"]),
            &strings(&["all"]),
            &strings(&["X", "Y"]),
            &strings(&["blue", "red"]),
        );
        assert_eq!(
            res.err(),
            Some(ConfigError::MismatchedLengths {
                files: 2,
                portions: 2,
                totals: 1,
                names: 2,
                colors: 2
            })
        );
    }

    #[test]
    fn from_lists_builds_series_in_order() {
        let config = Builder::from_lists(
            &strings(&["a.csv", "b.csv"]),
            &strings(&["x", " y "]),
            &strings(&["all", "all"]),
            &strings(&["X", "Y"]),
            &strings(&["any", "green"]),
        )
        .unwrap()
        .build()
        .unwrap();
        let ids: Vec<&str> = config.series().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["x_a.csv", "y_b.csv"]);
        assert_eq!(config.scale_for("y_b.csv").name, "green");
        assert_eq!(config.scale_for("x_a.csv").name, "blue");
        assert_eq!(config.find_series("Y").map(|s| s.id.as_str()), Some("y_b.csv"));
    }

    #[test]
    fn invalid_configurations() {
        assert_eq!(Builder::new().build().err(), Some(ConfigError::EmptyConfiguration));
        assert_eq!(
            Builder::new()
                .series("a.csv", "x", "all", "X", None)
                .series("a.csv", "x", "n", "X again", None)
                .build()
                .err(),
            Some(ConfigError::DuplicateSeries("x_a.csv".to_string()))
        );
        assert_eq!(
            Builder::new().split("p", &[]).err(),
            Some(ConfigError::EmptySplit("p".to_string()))
        );
    }

    #[test]
    fn absolute_mode_forces_winner_take_all() {
        let config = Builder::new()
            .series("a.csv", "x", "all", "X", None)
            .style_mode(StyleMode::Arrows)
            .absolute_mode(true)
            .build()
            .unwrap();
        assert_eq!(config.display().style_mode, StyleMode::WinnerTakeAll);
        assert!(config.display().absolute_mode);
    }
}
