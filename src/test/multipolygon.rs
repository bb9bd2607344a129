use geo::{polygon, MultiPolygon};

pub(crate) fn mp0() -> MultiPolygon {
    MultiPolygon::new(vec![
        polygon![
            (x: -111., y: 45.),
            (x: -111., y: 41.),
            (x: -104., y: 41.),
            (x: -104., y: 45.),
        ],
        polygon!(
            exterior: [
                (x: -111., y: 45.),
                (x: -111., y: 41.),
                (x: -104., y: 41.),
                (x: -104., y: 45.),
            ],
            interiors: [
                [
                    (x: -110., y: 44.),
                    (x: -110., y: 42.),
                    (x: -105., y: 42.),
                    (x: -105., y: 44.),
                ],
            ],
        ),
    ])
}

pub(crate) fn mp1() -> MultiPolygon {
    MultiPolygon::new(vec![
        polygon![
            (x: -111., y: 45.),
            (x: -111., y: 41.),
            (x: -104., y: 41.),
            (x: -104., y: 45.),
        ],
        polygon![
            (x: -110., y: 44.),
            (x: -110., y: 42.),
            (x: -105., y: 42.),
            (x: -105., y: 44.),
        ],
    ])
}

/// A square island with a square lake, on a 1° grid: land spans [10, 20] × [10, 20], the lake
/// [13, 17] × [13, 17].
pub(crate) fn lake_island() -> MultiPolygon {
    MultiPolygon::new(vec![polygon!(
        exterior: [
            (x: 10., y: 10.),
            (x: 20., y: 10.),
            (x: 20., y: 20.),
            (x: 10., y: 20.),
        ],
        interiors: [
            [
                (x: 13., y: 13.),
                (x: 17., y: 13.),
                (x: 17., y: 17.),
                (x: 13., y: 17.),
            ],
        ],
    )])
}

/// A spit far thinner than a grid cell, running north along x = 50.3 from y = 0.2 to 4.7.
pub(crate) fn sliver() -> MultiPolygon {
    MultiPolygon::new(vec![polygon![
        (x: 50.3, y: 0.2),
        (x: 50.301, y: 0.2),
        (x: 50.301, y: 4.7),
        (x: 50.3, y: 4.7),
    ]])
}
