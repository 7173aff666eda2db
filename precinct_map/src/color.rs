use log::{debug, warn};

use std::collections::{HashMap, HashSet};

use crate::config::{BucketTable, SeriesId};

/// A named ramp of shades. Shades go from the lightest to the darkest.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct ColorScale {
    pub name: &'static str,
    pub base: &'static str,
    pub shades: &'static [&'static str],
}

pub const COLOR_SCALES: [ColorScale; 10] = [
    ColorScale {
        name: "blue",
        base: "#00aed6",
        shades: &[
            "#00ddff", "#00c6eb", "#00aed6", "#009bc2", "#008bae", "#007b9a", "#006a85", "#005a71",
            "#004a5d", "#003a49",
        ],
    },
    ColorScale {
        name: "red",
        base: "#a50f15",
        shades: &[
            "#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15",
            "#7d0011", "#52000b",
        ],
    },
    ColorScale {
        name: "green",
        base: "#006d2c",
        shades: &[
            "#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c",
            "#065220", "#023414",
        ],
    },
    ColorScale {
        name: "orange",
        base: "#d15c1e",
        shades: &[
            "#fbdcc5", "#f6b693", "#ef8147", "#e5581a", "#c04612", "#d15c1e", "#84350b", "#4c1d06",
            "#261103", "#120902",
        ],
    },
    ColorScale {
        name: "purple",
        base: "#60298e",
        shades: &[
            "#e3d1f7", "#c5a5ed", "#a869e0", "#8939d0", "#6c2ab5", "#60298e", "#482069", "#2c1340",
            "#170920", "#0a0410",
        ],
    },
    ColorScale {
        name: "yellow",
        base: "#d8b31f",
        shades: &[
            "#fff5b5", "#ffec6b", "#ffdf23", "#f7c404", "#a1840d", "#d8b31f", "#604b07", "#362903",
            "#1d1601", "#0d0b00",
        ],
    },
    ColorScale {
        name: "pink",
        base: "#cc337d",
        shades: &[
            "#f9c7dd", "#f399bb", "#ea5f90", "#db3472", "#b1265a", "#cc337d", "#822047", "#4c132a",
            "#270a16", "#13070b",
        ],
    },
    ColorScale {
        name: "teal",
        base: "#206d6b",
        shades: &[
            "#c1eded", "#8bd6d6", "#47b8b7", "#239f9e", "#1d7c7c", "#206d6b", "#124847", "#082727",
            "#041515", "#020b0b",
        ],
    },
    ColorScale {
        name: "brown",
        base: "#7a5230",
        shades: &[
            "#eedccc", "#e1bfa0", "#d19c6e", "#bb7642", "#8f5a2f", "#7a5230", "#4e341f", "#2e1f12",
            "#17100a", "#0a0805",
        ],
    },
    ColorScale {
        name: "gray",
        base: "#5c5c5c",
        shades: &[
            "#ececec", "#c7c7c7", "#9a9a9a", "#757575", "#5c5c5c", "#3a3a3a", "#202020", "#111111",
            "#080808", "#030303",
        ],
    },
];

/// The neutral scale used when the registry runs out of scales, and for
/// series without an assignment.
pub fn fallback_scale() -> &'static ColorScale {
    &COLOR_SCALES[COLOR_SCALES.len() - 1]
}

pub fn scale_by_name(name: &str) -> Option<&'static ColorScale> {
    COLOR_SCALES.iter().find(|s| s.name == name)
}

/// Assigns one color scale per series.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColorRegistry {
    assignments: HashMap<SeriesId, &'static ColorScale>,
}

impl ColorRegistry {
    pub fn new() -> ColorRegistry {
        ColorRegistry::default()
    }

    /// Builds the assignment table from scratch.
    ///
    /// Preferred colors are honored first, in series order, as long as they
    /// are unclaimed. The remaining series get the next unclaimed scale in
    /// registry order, then the fallback scale once all the scales are taken.
    pub fn assign(&mut self, preferences: &[Option<String>], series: &[SeriesId]) {
        self.assignments.clear();
        let mut used: HashSet<&'static str> = HashSet::new();

        for (idx, sid) in series.iter().enumerate() {
            let pref = preferences.get(idx).cloned().flatten();
            if let Some(scale) = pref.as_deref().and_then(scale_by_name) {
                if !used.contains(scale.name) {
                    debug!("assign: {} gets preferred scale {}", sid, scale.name);
                    self.assignments.insert(sid.clone(), scale);
                    used.insert(scale.name);
                }
            }
        }

        for sid in series.iter() {
            if self.assignments.contains_key(sid) {
                continue;
            }
            let scale = match COLOR_SCALES.iter().find(|s| !used.contains(s.name)) {
                Some(s) => {
                    used.insert(s.name);
                    s
                }
                None => {
                    warn!(
                        "assign: no color scale left for {}, using {}",
                        sid,
                        fallback_scale().name
                    );
                    fallback_scale()
                }
            };
            debug!("assign: {} gets scale {}", sid, scale.name);
            self.assignments.insert(sid.clone(), scale);
        }
    }

    pub fn scale_for(&self, series_id: &str) -> Option<&'static ColorScale> {
        self.assignments.get(series_id).cloned()
    }
}

/// The shade of a scale for a margin.
///
/// Negative margins fall on the first shade. Bucket tables with more buckets
/// than the scale has shades saturate on the darkest shade.
pub fn color_for_margin(margin: f64, scale: &ColorScale, buckets: &BucketTable) -> &'static str {
    let idx = buckets.index(margin).unwrap_or(0);
    scale.shades[idx.min(scale.shades.len() - 1)]
}

/// The shade of a scale for a value between 0 and 100.
pub fn gradient_color(value: f64, scale: &ColorScale) -> &'static str {
    let last = scale.shades.len() - 1;
    let pos = (value / 100.0 * last as f64).floor();
    let idx = if pos.is_nan() || pos < 0.0 {
        0
    } else {
        (pos as usize).min(last)
    };
    scale.shades[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<SeriesId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn prefs(names: &[&str]) -> Vec<Option<String>> {
        names
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect()
    }

    #[test]
    fn preferred_colors_first_come_first_served() {
        let mut reg = ColorRegistry::new();
        reg.assign(&prefs(&["red", "red", "blue"]), &ids(&["X", "Y", "Z"]));
        assert_eq!(reg.scale_for("X").map(|s| s.name), Some("red"));
        assert_eq!(reg.scale_for("Y").map(|s| s.name), Some("green"));
        assert_eq!(reg.scale_for("Z").map(|s| s.name), Some("blue"));
    }

    #[test]
    fn unknown_preferences_are_ignored() {
        let mut reg = ColorRegistry::new();
        reg.assign(&prefs(&["chartreuse", ""]), &ids(&["A", "B"]));
        assert_eq!(reg.scale_for("A").map(|s| s.name), Some("blue"));
        assert_eq!(reg.scale_for("B").map(|s| s.name), Some("red"));
        assert_eq!(reg.scale_for("C"), None);
    }

    #[test]
    fn exhaustion_falls_back_to_gray() {
        let series: Vec<SeriesId> = (0..12).map(|i| format!("s{}", i)).collect();
        let mut reg = ColorRegistry::new();
        reg.assign(&[], &series);
        let names: Vec<&str> = series
            .iter()
            .map(|s| reg.scale_for(s).map(|c| c.name).unwrap_or(""))
            .collect();
        assert_eq!(names[0], "blue");
        assert_eq!(names[9], "gray");
        assert_eq!(names[10], "gray");
        assert_eq!(names[11], "gray");
        let distinct: HashSet<&str> = names[..10].iter().cloned().collect();
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn assign_is_idempotent() {
        let mut reg = ColorRegistry::new();
        reg.assign(&prefs(&["", "blue"]), &ids(&["A", "B"]));
        let first = reg.clone();
        reg.assign(&prefs(&["", "blue"]), &ids(&["A", "B"]));
        assert_eq!(reg, first);
        reg.assign(&prefs(&["green"]), &ids(&["C"]));
        assert_eq!(reg.scale_for("A"), None);
        assert_eq!(reg.scale_for("C").map(|s| s.name), Some("green"));
    }

    #[test]
    fn bucket_index_is_monotonic() {
        let table = BucketTable::default();
        let mut prev = 0;
        for step in 0..400 {
            let margin = step as f64 * 0.1;
            let idx = table.index(margin).unwrap();
            assert!(idx >= prev);
            prev = idx;
        }
        assert_eq!(table.index(0.0), Some(0));
        assert_eq!(table.index(1.5), Some(1));
        assert_eq!(table.index(13.49), Some(8));
        assert_eq!(table.index(1000.0), Some(9));
        assert_eq!(table.index(-0.1), None);
    }

    #[test]
    fn shades_stay_in_range() {
        let red = scale_by_name("red").unwrap();
        let wide = BucketTable::uniform(1.0, 15).unwrap();
        for step in 0..300 {
            let margin = step as f64 * 0.5;
            assert!(red.shades.contains(&color_for_margin(margin, red, &wide)));
            assert!(red
                .shades
                .contains(&color_for_margin(margin, red, &BucketTable::default())));
        }
        assert_eq!(color_for_margin(100.0, red, &wide), "#52000b");
        assert_eq!(color_for_margin(-3.0, red, &wide), "#fff5f0");
        assert_eq!(gradient_color(0.0, red), "#fff5f0");
        assert_eq!(gradient_color(50.0, red), "#fb6a4a");
        assert_eq!(gradient_color(100.0, red), "#52000b");
        assert_eq!(gradient_color(250.0, red), "#52000b");
        assert_eq!(gradient_color(-5.0, red), "#fff5f0");
    }
}
