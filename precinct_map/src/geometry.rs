use crate::config::UnitId;

/// A longitude / latitude position.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// A closed ring of positions.
pub type Ring = Vec<LngLat>;

#[derive(PartialEq, Debug, Clone)]
pub enum Geometry {
    Point(LngLat),
    /// Exterior ring first, then the holes.
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Bounds {
    pub south_west: LngLat,
    pub north_east: LngLat,
}

impl Bounds {
    pub fn center(&self) -> LngLat {
        LngLat {
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
        }
    }

    fn extend(self, p: &LngLat) -> Bounds {
        Bounds {
            south_west: LngLat {
                lng: self.south_west.lng.min(p.lng),
                lat: self.south_west.lat.min(p.lat),
            },
            north_east: LngLat {
                lng: self.north_east.lng.max(p.lng),
                lat: self.north_east.lat.max(p.lat),
            },
        }
    }
}

impl Geometry {
    fn positions(&self) -> Box<dyn Iterator<Item = &LngLat> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(p)),
            Geometry::Polygon(rings) => Box::new(rings.iter().flatten()),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().flatten().flatten()),
        }
    }

    /// The bounding box of all the positions, or nothing for an empty geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut it = self.positions();
        let first = *it.next()?;
        let init = Bounds {
            south_west: first,
            north_east: first,
        };
        Some(it.fold(init, |b, p| b.extend(p)))
    }

    /// Where labels and glyphs are anchored: the center of the bounding box.
    pub fn anchor(&self) -> Option<LngLat> {
        self.bounds().map(|b| b.center())
    }
}

/// A geographic feature as handed over by the feature source.
#[derive(PartialEq, Debug, Clone)]
pub struct Feature {
    pub unit_id: UnitId,
    pub geometry: Geometry,
}
