//! Coordinate Reference System handling

mod utm;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use utm::{parse_utm_epsg, utm_epsg_for, wgs84_to_utm};

/// EPSG codes treated as geographic (degree-based) references.
const GEOGRAPHIC_EPSG: [u32; 3] = [4326, 4258, 4269];

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether coordinates in this reference are degrees of longitude/latitude
    pub fn is_geographic(&self) -> bool {
        if let Some(code) = self.epsg {
            return GEOGRAPHIC_EPSG.contains(&code);
        }
        match &self.wkt {
            Some(wkt) => {
                let head = wkt.trim_start();
                head.starts_with("GEOGCS") || head.starts_with("GEOGCRS")
            }
            None => false,
        }
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        false
    }

    /// Reproject a WGS84 `(lon, lat)` point into this reference.
    ///
    /// Geographic references take the point as-is. UTM (EPSG 326xx/327xx)
    /// uses the Snyder series; anything else is rejected.
    pub fn from_wgs84(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        if self.is_geographic() {
            return Ok((lon, lat));
        }
        let (zone, north) = self
            .epsg
            .and_then(parse_utm_epsg)
            .ok_or_else(|| Error::UnsupportedCrs(self.identifier()))?;
        Ok(wgs84_to_utm(lon, lat, zone, north))
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", &wkt[..wkt.len().min(50)]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(32636);
        assert_eq!(crs.epsg(), Some(32636));
        assert_eq!(crs.identifier(), "EPSG:32636");
        assert!(!crs.is_geographic());
    }

    #[test]
    fn test_geographic_detection() {
        assert!(CRS::wgs84().is_geographic());
        assert!(CRS::from_wkt("GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\"]]").is_geographic());
        assert!(!CRS::from_wkt("PROJCS[\"WGS 84 / UTM zone 36N\"]").is_geographic());
    }

    #[test]
    fn test_from_wgs84_geographic_is_identity() {
        let (x, y) = CRS::wgs84().from_wgs84(32.85, 39.93).unwrap();
        assert_eq!((x, y), (32.85, 39.93));
    }

    #[test]
    fn test_from_wgs84_utm() {
        // Ankara lies in UTM zone 36N
        let (e, n) = CRS::from_epsg(32636).from_wgs84(32.85, 39.93).unwrap();
        assert!(e > 400_000.0 && e < 600_000.0, "easting {e}");
        assert!(n > 4_400_000.0 && n < 4_450_000.0, "northing {n}");
    }

    #[test]
    fn test_from_wgs84_unsupported() {
        let err = CRS::from_epsg(3857).from_wgs84(0.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCrs(_)));
    }
}
