//! Per-provider resource files in a data directory.
//!
//! Every provider owns two files: its compressed index (`<name>_mask.lmsk`) and the WKB
//! MultiPolygon it was rasterized from (`<name>.wkb`). Either may be stored xz compressed with an
//! extra `.xz` suffix. When both variants exist the uncompressed one wins. An index may also be
//! a bare roaring treemap (`<name>_mask.tbmap[.xz]`), which is what the published assets are; it
//! is only read when no `.lmsk` index exists.
//!
//! Files are checked against a SHA-256 digest before they are decoded. The digest comes from a
//! `<file>.sha256` sidecar when there is one, and otherwise from the pinned digest of the
//! published asset of that name. Files with neither are read unchecked.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use geo::MultiPolygon;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use crate::config::LandmaskConfig;
use crate::error::{LandmaskError, Result};
use crate::grid::Grid;
use crate::index::CompressedIndex;
use crate::io::wkb::from_wkb;
use crate::provider::{Asset, Provider};

const XZ_LEVEL: u32 = 9;

/// The resource files of one provider.
#[derive(Debug, Clone)]
pub struct GeometrySource {
    provider: Provider,
    data_dir: PathBuf,
    compress: bool,
}

impl GeometrySource {
    pub fn new(provider: Provider, config: &LandmaskConfig) -> Self {
        Self {
            provider,
            data_dir: config.data_dir.clone(),
            compress: false,
        }
    }

    /// Write xz compressed files from now on.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the uncompressed index file. The file actually read may be `<path>.xz`.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(self.provider.index_file_name())
    }

    /// Path of the uncompressed bare treemap index, read when [`Self::index_path`] is absent.
    pub fn legacy_index_path(&self) -> PathBuf {
        self.data_dir.join(self.provider.legacy_index_file_name())
    }

    /// Path of the uncompressed geometry file. The file actually read may be `<path>.xz`.
    pub fn geometry_path(&self) -> PathBuf {
        self.data_dir.join(self.provider.geometry_file_name())
    }

    /// The published assets of this provider.
    pub fn assets(&self) -> impl Iterator<Item = &'static Asset> {
        self.provider.assets()
    }

    /// The raw WKB MultiPolygon.
    pub fn wkb(&self) -> Result<Vec<u8>> {
        self.read(&[self.geometry_path()])
    }

    /// The decoded land polygons.
    pub fn geometry(&self) -> Result<MultiPolygon> {
        from_wkb(&self.wkb()?)
    }

    /// Load the index, which must be encoded for `expected`.
    pub fn index(&self, expected: Grid) -> Result<CompressedIndex> {
        let buf = self.read(&[self.index_path(), self.legacy_index_path()])?;
        let index = CompressedIndex::deserialize_for_grid(buf.as_slice(), expected)?;
        debug!(
            provider = %self.provider,
            cardinality = index.cardinality(),
            "loaded index"
        );
        Ok(index)
    }

    /// Persist an index, returning the path written.
    pub fn write_index(&self, index: &CompressedIndex) -> Result<PathBuf> {
        self.write(&self.index_path(), |w| index.serialize_into(w))
    }

    /// Persist a WKB blob, returning the path written.
    pub fn write_wkb(&self, wkb: &[u8]) -> Result<PathBuf> {
        self.write(&self.geometry_path(), |w| Ok(w.write_all(wkb)?))
    }

    /// Store the downloaded bytes of a published asset after checking its pinned digest.
    ///
    /// Nothing is written when the digest does not match.
    pub fn install(&self, asset: &Asset, bytes: &[u8]) -> Result<PathBuf> {
        if asset.provider != self.provider {
            return Err(LandmaskError::ResourceCorrupt(format!(
                "{} is not a {} asset",
                asset.file_name, self.provider
            )));
        }
        self.store(asset.file_name, asset.sha256, bytes)
    }

    /// Whether a published asset is present and matches its pinned digest.
    pub fn check_asset(&self, asset: &Asset) -> Result<()> {
        let path = self.data_dir.join(asset.file_name);
        if !path.is_file() {
            return Err(LandmaskError::ResourceMissing {
                provider: self.provider,
                path,
            });
        }
        check_digest(&path, &fs::read(&path)?, asset.sha256)
    }

    fn store(&self, file_name: &str, sha256: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.data_dir.join(file_name);
        check_digest(&target, bytes, sha256)?;

        fs::create_dir_all(&self.data_dir)?;
        fs::write(&target, bytes)?;
        write_sidecar(&target, sha256)?;

        let stale = match file_name.strip_suffix(".xz") {
            Some(plain) => self.data_dir.join(plain),
            None => with_suffix(&target, ".xz"),
        };
        remove_resource(&stale)?;

        debug!(path = %target.display(), "installed asset");
        Ok(target)
    }

    /// Read the first existing candidate, trying `<path>` before `<path>.xz` for each.
    fn read(&self, candidates: &[PathBuf]) -> Result<Vec<u8>> {
        for path in candidates {
            if path.is_file() {
                let raw = fs::read(path)?;
                verify(path, &raw)?;
                debug!(path = %path.display(), bytes = raw.len(), "read resource");
                return Ok(raw);
            }

            let xz_path = with_suffix(path, ".xz");
            if xz_path.is_file() {
                let raw = fs::read(&xz_path)?;
                verify(&xz_path, &raw)?;

                let mut buf = Vec::new();
                XzDecoder::new(raw.as_slice())
                    .read_to_end(&mut buf)
                    .map_err(|err| {
                        LandmaskError::ResourceCorrupt(format!("{}: {}", xz_path.display(), err))
                    })?;
                debug!(path = %xz_path.display(), bytes = buf.len(), "read resource");
                return Ok(buf);
            }
        }

        Err(LandmaskError::ResourceMissing {
            provider: self.provider,
            path: candidates
                .first()
                .cloned()
                .unwrap_or_else(|| self.data_dir.clone()),
        })
    }

    fn write<F>(&self, path: &Path, body: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let (target, stale, bytes) = if self.compress {
            let mut encoder = XzEncoder::new(Vec::new(), XZ_LEVEL);
            body(&mut encoder)?;
            (with_suffix(path, ".xz"), path.to_path_buf(), encoder.finish()?)
        } else {
            let mut buf = Vec::new();
            body(&mut buf)?;
            (path.to_path_buf(), with_suffix(path, ".xz"), buf)
        };

        fs::create_dir_all(&self.data_dir)?;
        fs::write(&target, &bytes)?;
        write_sidecar(&target, &sha256_hex(&bytes))?;

        // the other variant would shadow or outlive this one
        remove_resource(&stale)?;

        debug!(path = %target.display(), bytes = bytes.len(), "wrote resource");
        Ok(target)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn verify(path: &Path, bytes: &[u8]) -> Result<()> {
    let sidecar = sidecar_path(path);
    if sidecar.is_file() {
        let content = fs::read_to_string(&sidecar)?;
        let expected = content.split_whitespace().next().unwrap_or_default();
        return check_digest(path, bytes, expected);
    }

    let pinned = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(Asset::find);
    match pinned {
        Some(asset) => check_digest(path, bytes, asset.sha256),
        None => {
            debug!(path = %path.display(), "no digest to check against");
            Ok(())
        }
    }
}

fn check_digest(path: &Path, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected) {
        warn!(path = %path.display(), %expected, %actual, "checksum mismatch");
        return Err(LandmaskError::ResourceCorrupt(format!(
            "{}: sha256 {} does not match the expected {}",
            path.display(),
            actual,
            expected
        )));
    }
    Ok(())
}

fn write_sidecar(path: &Path, sha256: &str) -> Result<()> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    fs::write(sidecar_path(path), format!("{}  {}\n", sha256, name))?;
    Ok(())
}

/// Remove a resource and its sidecar, if present.
fn remove_resource(path: &Path) -> Result<()> {
    for path in [path.to_path_buf(), sidecar_path(path)] {
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != io::ErrorKind::NotFound {
                return Err(err.into());
            }
        }
    }
    Ok(())
}

fn sidecar_path(path: &Path) -> PathBuf {
    with_suffix(path, ".sha256")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::wkb::to_wkb;
    use crate::test::multipolygon::mp0;
    use crate::test::raster::coastline;

    fn source(dir: &Path, provider: Provider) -> GeometrySource {
        GeometrySource::new(provider, &LandmaskConfig::from_env().with_data_dir(dir))
    }

    #[test]
    fn missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Osm);

        match source.wkb() {
            Err(LandmaskError::ResourceMissing { provider, path }) => {
                assert_eq!(provider, Provider::Osm);
                assert_eq!(path, dir.path().join("osm.wkb"));
            }
            other => panic!("expected missing resource, got {:?}", other),
        }
        match source.index(Grid::new(10, 10)) {
            Err(LandmaskError::ResourceMissing { path, .. }) => {
                assert_eq!(path, dir.path().join("osm_mask.lmsk"));
            }
            other => panic!("expected missing resource, got {:?}", other),
        }
    }

    #[test]
    fn plain_and_xz_round_trip() {
        let raster = coastline();
        let index = CompressedIndex::from_dense(&raster);
        let wkb = to_wkb(&mp0());

        for compress in [false, true] {
            let dir = tempfile::tempdir().unwrap();
            let source = source(dir.path(), Provider::Gshhg).compress(compress);

            let index_path = source.write_index(&index).unwrap();
            let wkb_path = source.write_wkb(&wkb).unwrap();
            assert_eq!(
                index_path.extension().unwrap() == "xz",
                compress,
                "{}",
                index_path.display()
            );
            assert!(wkb_path.is_file());
            assert!(sidecar_path(&wkb_path).is_file());

            assert_eq!(source.index(raster.grid()).unwrap(), index);
            assert_eq!(source.wkb().unwrap(), wkb);
            assert_eq!(source.geometry().unwrap(), mp0());
        }
    }

    #[test]
    fn rewrite_replaces_other_variant() {
        let dir = tempfile::tempdir().unwrap();
        let plain = source(dir.path(), Provider::Gshhg);
        let xz = plain.clone().compress(true);

        plain.write_wkb(b"old").unwrap();
        xz.write_wkb(&to_wkb(&mp0())).unwrap();
        assert!(!plain.geometry_path().exists());
        assert!(!sidecar_path(&plain.geometry_path()).exists());
        assert_eq!(plain.geometry().unwrap(), mp0());
    }

    #[test]
    fn corrupt_xz() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Gshhg);
        fs::write(with_suffix(&source.index_path(), ".xz"), b"definitely not xz").unwrap();
        assert!(matches!(
            source.index(Grid::new(10, 10)),
            Err(LandmaskError::ResourceCorrupt(_))
        ));
    }

    #[test]
    fn wrong_grid() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Gshhg);
        source
            .write_index(&CompressedIndex::from_dense(&coastline()))
            .unwrap();
        assert!(matches!(
            source.index(Provider::Gshhg.grid()),
            Err(LandmaskError::GridMismatch { .. })
        ));
    }

    #[test]
    fn sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn tampered_file_fails_its_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Osm);
        let raster = coastline();
        let path = source
            .write_index(&CompressedIndex::from_dense(&raster))
            .unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x80;
        fs::write(&path, &bytes).unwrap();

        match source.index(raster.grid()) {
            Err(LandmaskError::ResourceCorrupt(msg)) => assert!(msg.contains("sha256"), "{}", msg),
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }

    #[test]
    fn published_asset_names_are_pinned() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Gshhg);
        fs::write(dir.path().join("gshhg.wkb.xz"), b"not the published file").unwrap();

        match source.wkb() {
            Err(LandmaskError::ResourceCorrupt(msg)) => assert!(msg.contains("sha256"), "{}", msg),
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
        assert!(source
            .check_asset(Asset::find("gshhg.wkb.xz").unwrap())
            .is_err());
    }

    #[test]
    fn install_checks_the_digest() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Osm);
        let asset = Asset::find("osm.wkb.xz").unwrap();

        let err = source.install(asset, b"truncated download").unwrap_err();
        assert!(matches!(err, LandmaskError::ResourceCorrupt(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let gshhg = Asset::find("gshhg.wkb.xz").unwrap();
        assert!(source.install(gshhg, b"").is_err());
    }

    #[test]
    fn stored_asset_shadows_nothing_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Osm);
        fs::write(source.geometry_path(), b"stale plain copy").unwrap();

        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(&to_wkb(&mp0())).unwrap();
        let bytes = encoder.finish().unwrap();

        let path = source
            .store("osm.wkb.xz", &sha256_hex(&bytes), &bytes)
            .unwrap();
        assert_eq!(path, dir.path().join("osm.wkb.xz"));
        assert!(!source.geometry_path().exists());
        assert_eq!(source.geometry().unwrap(), mp0());
    }

    #[test]
    fn reads_bare_treemap_index() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path(), Provider::Gshhg);
        let raster = coastline();
        let index = CompressedIndex::from_dense(&raster);

        let mut bare = Vec::new();
        index.treemap().serialize_into(&mut bare).unwrap();
        fs::write(source.legacy_index_path(), &bare).unwrap();
        assert_eq!(source.index(raster.grid()).unwrap(), index);

        // an .lmsk index takes precedence
        let other = CompressedIndex::empty(raster.grid());
        source.write_index(&other).unwrap();
        assert_eq!(source.index(raster.grid()).unwrap(), other);
    }
}
