use log::debug;

use crate::color::{color_for_margin, gradient_color};
use crate::config::*;
use crate::geometry::{Feature, LngLat};
use crate::map::MapConfiguration;

pub const NO_DATA_FILL: &str = "#cccccc";
pub const ARROW_BASE_FILL: &str = "#f2f2f2";
pub const STROKE_COLOR: &str = "black";

/// Rotation of the glyph when the leader sits at an even position among the
/// enabled series.
pub const EVEN_ROTATION_DEG: f64 = 315.0;
/// Rotation for an odd position: the mirrored diagonal.
pub const ODD_ROTATION_DEG: f64 = 45.0;

#[derive(PartialEq, Debug, Clone)]
pub struct StyleResult {
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_weight: f64,
    pub stroke_opacity: f64,
    pub fill_opacity: f64,
    pub glyph: Option<Glyph>,
}

impl StyleResult {
    /// The look of a unit without data.
    pub fn no_data() -> StyleResult {
        StyleResult {
            fill_color: NO_DATA_FILL.to_string(),
            stroke_color: STROKE_COLOR.to_string(),
            stroke_weight: 1.0,
            stroke_opacity: 1.0,
            fill_opacity: 0.5,
            glyph: None,
        }
    }

    fn filled(fill_color: &str) -> StyleResult {
        StyleResult {
            fill_color: fill_color.to_string(),
            stroke_color: STROKE_COLOR.to_string(),
            stroke_weight: 1.0,
            stroke_opacity: 1.0,
            fill_opacity: 0.7,
            glyph: None,
        }
    }

    fn arrow_base() -> StyleResult {
        StyleResult {
            fill_color: ARROW_BASE_FILL.to_string(),
            stroke_color: STROKE_COLOR.to_string(),
            stroke_weight: 1.0,
            stroke_opacity: 1.0,
            fill_opacity: 0.3,
            glyph: None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        *self == StyleResult::no_data()
    }
}

/// A directional arrow drawn over a unit.
#[derive(PartialEq, Debug, Clone)]
pub struct Glyph {
    pub unit_id: UnitId,
    pub anchor: Option<LngLat>,
    pub color: String,
    pub size: GlyphSize,
    pub rotation_deg: f64,
    pub leader: SeriesId,
    pub margin: f64,
}

/// The glyphs of the current rendering. The owner clears it before each
/// full render.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct GlyphOverlay {
    glyphs: Vec<Glyph>,
}

impl GlyphOverlay {
    pub fn new() -> GlyphOverlay {
        GlyphOverlay::default()
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
    }

    pub fn add(&mut self, glyph: Glyph) {
        self.glyphs.push(glyph);
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The value of one enabled series for one unit.
#[derive(PartialEq, Debug, Clone)]
pub struct SeriesValue {
    pub series_id: SeriesId,
    /// Position of the series among the enabled series.
    pub position: usize,
    pub value: f64,
}

/// The values of the enabled series for a record, largest first. Ties keep
/// the configuration order.
pub fn ranked_values(record: &UnitRecord, config: &MapConfiguration) -> Vec<SeriesValue> {
    let absolute = config.display().absolute_mode;
    let mut values: Vec<SeriesValue> = config
        .enabled_series()
        .iter()
        .enumerate()
        .map(|(position, s)| SeriesValue {
            series_id: s.id.clone(),
            position,
            value: record.display_value(s, absolute),
        })
        .collect();
    values.sort_by(|a, b| b.value.total_cmp(&a.value));
    values
}

/// Computes the style of one feature.
///
/// In arrows mode a glyph may also be registered into the overlay.
pub fn style(
    feature: &Feature,
    records: &PrecinctData,
    config: &MapConfiguration,
    overlay: &mut GlyphOverlay,
) -> StyleResult {
    let Some(record) = records.get(&feature.unit_id) else {
        debug!("style: no record for {}", feature.unit_id);
        return StyleResult::no_data();
    };
    let values = ranked_values(record, config);
    let Some(leader) = values.first() else {
        return StyleResult::no_data();
    };
    let scale = config.scale_for(&leader.series_id);
    let margin = match values.get(1) {
        Some(second) => leader.value - second.value,
        None => 0.0,
    };

    match config.display().style_mode {
        StyleMode::WinnerTakeAll => StyleResult::filled(scale.base),
        StyleMode::Arrows => {
            let mut res = StyleResult::arrow_base();
            if let Some(size) = config.arrow_thresholds().classify(margin) {
                let glyph = Glyph {
                    unit_id: feature.unit_id.clone(),
                    anchor: feature.geometry.anchor(),
                    color: scale.base.to_string(),
                    size,
                    rotation_deg: if leader.position % 2 == 0 {
                        EVEN_ROTATION_DEG
                    } else {
                        ODD_ROTATION_DEG
                    },
                    leader: leader.series_id.clone(),
                    margin,
                };
                overlay.add(glyph.clone());
                res.glyph = Some(glyph);
            }
            res
        }
        StyleMode::Gradient if values.len() > 1 => {
            StyleResult::filled(color_for_margin(margin, scale, config.buckets()))
        }
        StyleMode::Gradient => StyleResult::filled(gradient_color(leader.value, scale)),
    }
}

/// Formats one value the way tooltips and tables show it. Values that
/// round to zero are shown without a sign.
pub fn format_value(value: f64, absolute_mode: bool) -> String {
    if absolute_mode {
        format!("{}", value.round() + 0.0)
    } else if value.abs() < 0.005 {
        format!("{:.2}%", 0.0)
    } else {
        format!("{:.2}%", value)
    }
}

/// The tooltip of a feature: the unit, then every enabled series largest
/// first. Features without a record have no tooltip.
pub fn describe(feature: &Feature, records: &PrecinctData, config: &MapConfiguration) -> Option<String> {
    let record = records.get(&feature.unit_id)?;
    let absolute = config.display().absolute_mode;
    let mut lines = vec![format!("Precinct: {}", feature.unit_id)];
    for v in ranked_values(record, config) {
        lines.push(format!(
            "{}: {}",
            config.friendly_name(&v.series_id),
            format_value(v.value, absolute)
        ));
    }
    Some(lines.join("\n"))
}
