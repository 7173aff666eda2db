use log::{debug, info, warn};

use std::collections::{BTreeMap, HashSet};

use crate::aggregate::{aggregate, RowSource};
use crate::color::{fallback_scale, ColorRegistry, ColorScale};
use crate::config::*;
use crate::geometry::{Feature, LngLat};
use crate::style::{describe, style, GlyphOverlay, StyleResult};
use crate::table::{project, ResultsTable};
use crate::totals::{legend_label, totals};

/// Everything that drives one map: the series, the display options, the
/// tables used by the styler, and the color assignments.
///
/// Only the enabled flags and the display mode change after construction.
#[derive(PartialEq, Debug, Clone)]
pub struct MapConfiguration {
    series: Vec<Series>,
    display: DisplayOptions,
    buckets: BucketTable,
    arrow_thresholds: ArrowThresholds,
    splits: SplitRules,
    aggregate_options: AggregateOptions,
    colors: ColorRegistry,
}

impl MapConfiguration {
    pub fn new(
        series: Vec<Series>,
        display: DisplayOptions,
        buckets: BucketTable,
        arrow_thresholds: ArrowThresholds,
        splits: SplitRules,
        aggregate_options: AggregateOptions,
    ) -> Result<MapConfiguration, ConfigError> {
        if series.is_empty() {
            return Err(ConfigError::EmptyConfiguration);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for s in series.iter() {
            if !seen.insert(s.id.as_str()) {
                return Err(ConfigError::DuplicateSeries(s.id.clone()));
            }
        }

        let mut colors = ColorRegistry::new();
        let preferences: Vec<Option<String>> =
            series.iter().map(|s| s.preferred_color.clone()).collect();
        let ids: Vec<SeriesId> = series.iter().map(|s| s.id.clone()).collect();
        colors.assign(&preferences, &ids);

        Ok(MapConfiguration {
            series,
            display,
            buckets,
            arrow_thresholds,
            splits,
            aggregate_options,
            colors,
        })
    }

    /// All the series, in configuration order.
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn enabled_series(&self) -> Vec<&Series> {
        self.series.iter().filter(|s| s.enabled).collect()
    }

    pub fn series_by_id(&self, series_id: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.id == series_id)
    }

    /// Looks a series up by identifier first, then by friendly name.
    pub fn find_series(&self, key: &str) -> Option<&Series> {
        self.series_by_id(key)
            .or_else(|| self.series.iter().find(|s| s.name == key))
    }

    /// Returns false if the series does not exist.
    pub fn set_enabled(&mut self, series_id: &str, enabled: bool) -> bool {
        match self.series.iter_mut().find(|s| s.id == series_id) {
            Some(s) => {
                debug!("set_enabled: {} -> {}", series_id, enabled);
                s.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn friendly_name<'a>(&'a self, series_id: &'a str) -> &'a str {
        self.series_by_id(series_id)
            .map(|s| s.name.as_str())
            .unwrap_or(series_id)
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    /// Absolute counts only make sense with winner-take-all: any other mode
    /// turns absolute mode off.
    pub fn set_style_mode(&mut self, mode: StyleMode) {
        self.display.style_mode = mode;
        if mode != StyleMode::WinnerTakeAll {
            self.display.absolute_mode = false;
        }
    }

    /// Turning absolute mode on switches to winner-take-all.
    pub fn set_absolute_mode(&mut self, absolute: bool) {
        self.display.absolute_mode = absolute;
        if absolute {
            self.display.style_mode = StyleMode::WinnerTakeAll;
        }
    }

    /// The scale assigned to a series. Unassigned series get the neutral scale.
    pub fn scale_for(&self, series_id: &str) -> &'static ColorScale {
        self.colors.scale_for(series_id).unwrap_or_else(|| {
            warn!("scale_for: no scale assigned to {}", series_id);
            fallback_scale()
        })
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    /// One source reference per series, files may repeat.
    pub fn sources(&self) -> Vec<SourceRef> {
        self.series.iter().map(|s| s.source()).collect()
    }

    pub fn buckets(&self) -> &BucketTable {
        &self.buckets
    }

    pub fn arrow_thresholds(&self) -> &ArrowThresholds {
        &self.arrow_thresholds
    }

    pub fn splits(&self) -> &SplitRules {
        &self.splits
    }

    pub fn aggregate_options(&self) -> &AggregateOptions {
        &self.aggregate_options
    }
}

/// One row of the legend.
#[derive(PartialEq, Debug, Clone)]
pub struct LegendEntry {
    pub series_id: SeriesId,
    pub name: String,
    pub color: String,
    pub enabled: bool,
    /// Only computed for enabled series.
    pub totals: Option<SeriesTotals>,
    pub label: String,
}

/// A feature that made it to the map layer, with its styling.
#[derive(PartialEq, Debug, Clone)]
pub struct RenderedFeature {
    pub unit_id: UnitId,
    pub style: StyleResult,
    pub tooltip: String,
    /// Present when labels are shown.
    pub label: Option<(String, LngLat)>,
}

/// A loaded map: the configuration, the merged data snapshot and the glyph
/// overlay of the last rendering.
///
/// The data is aggregated once; toggles and mode changes only restyle.
#[derive(Debug, Clone)]
pub struct PrecinctMap {
    config: MapConfiguration,
    records: PrecinctData,
    overlay: GlyphOverlay,
}

impl PrecinctMap {
    /// Aggregates the sources of the configuration.
    pub fn load<S: RowSource>(
        config: MapConfiguration,
        row_source: &mut S,
    ) -> Result<PrecinctMap, AggregationError> {
        let records = aggregate(
            &config.sources(),
            config.splits(),
            config.aggregate_options(),
            row_source,
        )?;
        Ok(PrecinctMap::from_records(config, records))
    }

    pub fn from_records(config: MapConfiguration, records: PrecinctData) -> PrecinctMap {
        PrecinctMap {
            config,
            records,
            overlay: GlyphOverlay::new(),
        }
    }

    pub fn config(&self) -> &MapConfiguration {
        &self.config
    }

    pub fn records(&self) -> &PrecinctData {
        &self.records
    }

    pub fn overlay(&self) -> &GlyphOverlay {
        &self.overlay
    }

    pub fn style(&mut self, feature: &Feature) -> StyleResult {
        style(feature, &self.records, &self.config, &mut self.overlay)
    }

    pub fn describe(&self, feature: &Feature) -> Option<String> {
        describe(feature, &self.records, &self.config)
    }

    /// Totals of the enabled series.
    pub fn totals(&self) -> BTreeMap<SeriesId, SeriesTotals> {
        totals(&self.records, &self.config.enabled_series())
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let totals = self.totals();
        let absolute = self.config.display().absolute_mode;
        self.config
            .series()
            .iter()
            .map(|s| {
                let t = totals.get(&s.id).cloned();
                LegendEntry {
                    series_id: s.id.clone(),
                    name: s.name.clone(),
                    color: self.config.scale_for(&s.id).base.to_string(),
                    enabled: s.enabled,
                    totals: t,
                    label: match t {
                        Some(t) => legend_label(&s.name, &t, absolute),
                        None => s.name.clone(),
                    },
                }
            })
            .collect()
    }

    pub fn table(&self) -> ResultsTable {
        project(&self.records, &self.config)
    }

    /// Toggles a series. The caller restyles everything afterwards.
    pub fn set_enabled(&mut self, series_id: &str, enabled: bool) -> bool {
        self.config.set_enabled(series_id, enabled)
    }

    pub fn set_style_mode(&mut self, mode: StyleMode) {
        self.config.set_style_mode(mode)
    }

    pub fn set_absolute_mode(&mut self, absolute: bool) {
        self.config.set_absolute_mode(absolute)
    }

    /// Restyles every feature from scratch.
    ///
    /// Features without a record are left out of the layer. The overlay is
    /// emptied first and holds the glyphs of this rendering afterwards.
    pub fn render(&mut self, features: &[Feature]) -> Vec<RenderedFeature> {
        self.overlay.clear();
        let show_labels = self.config.display().show_labels;
        let mut res: Vec<RenderedFeature> = Vec::new();
        for feature in features.iter() {
            if !self.records.contains_key(&feature.unit_id) {
                debug!("render: dropping feature {} (no data)", feature.unit_id);
                continue;
            }
            let style = self.style(feature);
            let tooltip = self.describe(feature).unwrap_or_default();
            let label = if show_labels {
                feature
                    .geometry
                    .anchor()
                    .map(|a| (feature.unit_id.clone(), a))
            } else {
                None
            };
            res.push(RenderedFeature {
                unit_id: feature.unit_id.clone(),
                style,
                tooltip,
                label,
            });
        }
        info!(
            "render: {} of {} features rendered, {} glyphs",
            res.len(),
            features.len(),
            self.overlay.len()
        );
        res
    }
}
