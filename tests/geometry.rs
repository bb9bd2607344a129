mod common;

use common::world;
use geozero::wkb::Wkb;
use geozero::{CoordDimensions, ToGeo, ToWkb};
use landmask::io::wkb::{from_wkb, to_wkb};
use landmask::{GeometrySource, Landmask, LandmaskConfig, LandmaskError, Provider};

fn config(dir: &std::path::Path) -> LandmaskConfig {
    LandmaskConfig::from_env().with_data_dir(dir)
}

#[test]
fn raw_geometry_decodes_with_standard_reader() {
    for compress in [false, true] {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        GeometrySource::new(Provider::Osm, &config)
            .compress(compress)
            .write_wkb(&to_wkb(&world()))
            .unwrap();

        let raw = Landmask::raw_geometry_with_config(Provider::Osm, &config).unwrap();
        let decoded = Wkb(raw).to_geo().unwrap();
        assert_eq!(decoded, geo::Geometry::MultiPolygon(world()));
    }
}

#[test]
fn reads_standard_writer_output() {
    let buf = geo::Geometry::MultiPolygon(world())
        .to_wkb(CoordDimensions::xy())
        .unwrap();
    assert_eq!(from_wkb(&buf).unwrap(), world());
    assert_eq!(to_wkb(&world()), buf);
}

#[test]
fn geometry_round_trip_through_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = GeometrySource::new(Provider::Gshhg, &config(dir.path()));
    source.write_wkb(&to_wkb(&world())).unwrap();
    assert_eq!(source.geometry().unwrap(), world());
}

#[test]
fn missing_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let err = Landmask::raw_geometry_with_config(Provider::Gshhg, &config(dir.path())).unwrap_err();
    assert!(matches!(
        err,
        LandmaskError::ResourceMissing {
            provider: Provider::Gshhg,
            ..
        }
    ));
}
