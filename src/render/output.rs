// The render plan: everything the map layer needs to draw the map, in JSON.

use log::{info, warn};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use std::fs;

use crate::render::*;

fn style_to_json(s: &StyleResult) -> JSValue {
    json!({
        "fillColor": s.fill_color,
        "color": s.stroke_color,
        "weight": s.stroke_weight,
        "opacity": s.stroke_opacity,
        "fillOpacity": s.fill_opacity,
    })
}

fn position_to_json(p: &Option<LngLat>) -> JSValue {
    match p {
        Some(p) => json!([p.lng, p.lat]),
        None => JSValue::Null,
    }
}

fn glyph_to_json(g: &Glyph) -> JSValue {
    json!({
        "id": g.unit_id,
        "anchor": position_to_json(&g.anchor),
        "color": g.color,
        "size": g.size.as_str(),
        "pixels": g.size.pixels(),
        "rotation": g.rotation_deg,
        "leader": g.leader,
        "margin": g.margin,
    })
}

fn legend_to_json(e: &LegendEntry) -> JSValue {
    let totals = match e.totals {
        Some(t) => json!({
            "portion": t.sum_portion,
            "denominator": t.sum_denominator,
            "percentage": t.percentage,
        }),
        None => JSValue::Null,
    };
    json!({
        "series": e.series_id,
        "name": e.name,
        "color": e.color,
        "enabled": e.enabled,
        "label": e.label,
        "totals": totals,
    })
}

/// Assembles the render plan of a rendered map.
pub fn render_plan(
    map: &PrecinctMap,
    rendered: &[RenderedFeature],
    show_background: bool,
) -> JSValue {
    let display = map.config().display();
    let features: Vec<JSValue> = rendered
        .iter()
        .map(|f| {
            json!({
                "id": f.unit_id,
                "style": style_to_json(&f.style),
                "tooltip": f.tooltip,
            })
        })
        .collect();
    let labels: Vec<JSValue> = rendered
        .iter()
        .filter_map(|f| f.label.as_ref())
        .map(|(text, anchor)| json!({"text": text, "anchor": [anchor.lng, anchor.lat]}))
        .collect();
    let glyphs: Vec<JSValue> = map.overlay().glyphs().iter().map(glyph_to_json).collect();
    let legend: Vec<JSValue> = if display.show_legend {
        map.legend().iter().map(legend_to_json).collect()
    } else {
        Vec::new()
    };
    let title = if display.show_title {
        display.title.clone()
    } else {
        None
    };

    json!({
        "title": title,
        "styleMode": display.style_mode.as_str(),
        "absoluteMode": display.absolute_mode,
        "showMap": show_background,
        "legend": legend,
        "features": features,
        "labels": labels,
        "glyphs": glyphs,
    })
}

/// Writes the plan to a file, or to the standard output for `stdout`.
pub fn write_plan(out: &str, plan: &JSValue) -> MapResult<()> {
    let pretty = serde_json::to_string_pretty(plan).context(ParsingJsonSnafu {})?;
    if out == "stdout" {
        println!("{}", pretty);
    } else {
        fs::write(out, pretty).context(WritingSnafu { path: out })?;
        info!("write_plan: render plan written to {}", out);
    }
    Ok(())
}

pub fn read_plan(path: &str) -> MapResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Compares a computed plan with a reference one. The differences are
/// printed.
pub fn check_reference(reference: &JSValue, computed: &JSValue) -> MapResult<()> {
    let pretty_ref = serde_json::to_string_pretty(reference).context(ParsingJsonSnafu {})?;
    // The computed numbers go through the same text round trip as the
    // reference ones.
    let computed_rt: JSValue = serde_json::from_str(
        serde_json::to_string(computed)
            .context(ParsingJsonSnafu {})?
            .as_str(),
    )
    .context(ParsingJsonSnafu {})?;
    let pretty_computed =
        serde_json::to_string_pretty(&computed_rt).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty_computed {
        warn!("Found differences with the reference render plan");
        print_diff(pretty_ref.as_str(), pretty_computed.as_str(), "\n");
        whatever!("Difference detected between the computed render plan and the reference")
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use precinct_map::builder::Builder;

    fn map(mode: StyleMode, labels: bool) -> PrecinctMap {
        let mut display = DisplayOptions::DEFAULT;
        display.title = Some("County".to_string());
        display.show_labels = labels;
        display.style_mode = mode;
        let config = Builder::new()
            .series("f", "dem", "all", "Democrat", Some("blue"))
            .series("f", "rep", "all", "Republican", Some("red"))
            .display(display)
            .build()
            .unwrap();
        let mut r = UnitRecord::new("p1");
        r.fields.insert("dem_f".to_string(), 70.0);
        r.fields.insert("rep_f".to_string(), 30.0);
        r.fields.insert("all_f".to_string(), 100.0);
        let mut records = PrecinctData::new();
        records.insert("p1".to_string(), r);
        PrecinctMap::from_records(config, records)
    }

    fn features() -> Vec<Feature> {
        vec![Feature {
            unit_id: "p1".to_string(),
            geometry: Geometry::Point(LngLat { lng: -78.9, lat: 36.0 }),
        }]
    }

    #[test]
    fn plan_with_glyphs_and_labels() {
        let mut m = map(StyleMode::Arrows, true);
        let rendered = m.render(&features());
        let plan = render_plan(&m, &rendered, true);
        assert_eq!(plan["title"], "County");
        assert_eq!(plan["styleMode"], "arrows");
        assert_eq!(plan["features"][0]["style"]["fillColor"], "#f2f2f2");
        assert_eq!(plan["glyphs"][0]["size"], "large");
        assert_eq!(plan["glyphs"][0]["rotation"], 315.0);
        assert_eq!(plan["labels"][0]["text"], "p1");
        assert_eq!(plan["legend"][1]["label"], "Republican: 30.00%");
    }

    #[test]
    fn plan_without_glyphs() {
        let mut m = map(StyleMode::WinnerTakeAll, false);
        let rendered = m.render(&features());
        let plan = render_plan(&m, &rendered, false);
        assert_eq!(plan["glyphs"].as_array().map(|l| l.len()), Some(0));
        assert_eq!(plan["labels"].as_array().map(|l| l.len()), Some(0));
        assert_eq!(plan["features"][0]["style"]["fillColor"], "#00aed6");
        assert_eq!(plan["showMap"], false);
    }

    #[test]
    fn reference_comparison() {
        let mut m = map(StyleMode::Gradient, false);
        let rendered = m.render(&features());
        let plan = render_plan(&m, &rendered, true);
        assert!(check_reference(&plan, &plan).is_ok());
        let mut other = plan.clone();
        other["title"] = json!("Other");
        assert!(check_reference(&other, &plan).is_err());
    }
}
