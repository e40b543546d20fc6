//! Location results.

use serde::Serialize;

use crate::encoding::{self, Encoding};
use crate::Result;

const PROVINCE_SUFFIX: &str = "省";
const CITY_SUFFIX: &str = "市";
const AUTONOMOUS_SUFFIX: &str = "自治区";

/// Autonomous regions, written without a province suffix.
const AUTONOMOUS_REGIONS: [&str; 5] = ["西藏", "新疆", "内蒙古", "宁夏", "广西"];

/// Country and area strings borrowed from a loaded database.
///
/// The bytes are in the database's native encoding and are not
/// interpreted. Either field may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location<'a> {
    /// Country or region
    pub country: &'a [u8],
    /// Area, ISP or other detail
    pub area: &'a [u8],
}

impl<'a> Location<'a> {
    /// Create a location from raw strings.
    pub fn new(country: &'a [u8], area: &'a [u8]) -> Self {
        Self { country, area }
    }

    /// Copy into an owned location.
    pub fn to_buf(&self) -> LocationBuf {
        LocationBuf {
            country: self.country.to_vec(),
            area: self.area.to_vec(),
        }
    }

    /// Decode both strings from `encoding`.
    pub fn decode(&self, encoding: Encoding) -> Result<DecodedLocation> {
        Ok(DecodedLocation {
            country: encoding::decode(self.country, encoding)?.into_owned(),
            area: encoding::decode(self.area, encoding)?.into_owned(),
        })
    }

    /// Decode both strings, replacing malformed sequences.
    pub fn decode_lossy(&self, encoding: Encoding) -> DecodedLocation {
        DecodedLocation {
            country: encoding::decode_lossy(self.country, encoding).into_owned(),
            area: encoding::decode_lossy(self.area, encoding).into_owned(),
        }
    }
}

/// Owned counterpart of [`Location`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocationBuf {
    pub country: Vec<u8>,
    pub area: Vec<u8>,
}

impl LocationBuf {
    /// Borrow as a [`Location`].
    pub fn as_location(&self) -> Location<'_> {
        Location::new(&self.country, &self.area)
    }
}

impl From<Location<'_>> for LocationBuf {
    fn from(location: Location<'_>) -> Self {
        location.to_buf()
    }
}

/// Location decoded to UTF-8 text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedLocation {
    pub country: String,
    pub area: String,
}

impl DecodedLocation {
    /// Split a Chinese country string into province and city.
    ///
    /// The province ends at "省" or is one of the autonomous regions; the
    /// city is what follows, up to and including "市". A municipality such
    /// as "北京市" is its own province and city. Anything else, including
    /// foreign countries, yields two empty strings.
    pub fn province_city(&self) -> (String, String) {
        let country = self.country.as_str();

        let (province, rest) = if let Some(region) = AUTONOMOUS_REGIONS
            .iter()
            .find(|region| country.starts_with(**region))
        {
            let rest = &country[region.len()..];
            // "广西壮族自治区南宁市"
            let rest = rest
                .split_once(AUTONOMOUS_SUFFIX)
                .map_or(rest, |(_, city)| city);
            (*region, rest)
        } else if let Some(idx) = country.find(PROVINCE_SUFFIX) {
            country.split_at(idx + PROVINCE_SUFFIX.len())
        } else if let Some(idx) = country.find(CITY_SUFFIX) {
            let city = &country[..idx + CITY_SUFFIX.len()];
            return (city.to_string(), city.to_string());
        } else {
            return (String::new(), String::new());
        };

        let city = match rest.find(CITY_SUFFIX) {
            Some(idx) => &rest[..idx + CITY_SUFFIX.len()],
            None => rest,
        };
        (province.to_string(), city.to_string())
    }

    /// Province and city as one string, e.g. "福建省福州市".
    pub fn region(&self) -> String {
        let (province, city) = self.province_city();
        if province == city {
            province
        } else {
            province + &city
        }
    }
}

impl std::fmt::Display for DecodedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.area.is_empty() {
            f.write_str(&self.country)
        } else {
            write!(f, "{} {}", self.country, self.area)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buf_round_trip() {
        let loc = Location::new(b"X", b"A");
        let buf = loc.to_buf();
        assert_eq!(buf.as_location(), loc);
        assert_eq!(LocationBuf::from(loc), buf);
    }

    #[test]
    fn test_decode_gbk() {
        let loc = Location::new(&[0xB1, 0xB1, 0xBE, 0xA9], b"");
        let decoded = loc.decode(Encoding::Gbk).unwrap();
        assert_eq!(decoded.country, "北京");
        assert_eq!(decoded.area, "");
        assert_eq!(decoded.to_string(), "北京");
    }

    #[test]
    fn test_display_with_area() {
        let decoded = Location::new(b"US", b"Google").decode_lossy(Encoding::Utf8);
        assert_eq!(decoded.to_string(), "US Google");
    }

    fn split(country: &str) -> (String, String) {
        DecodedLocation {
            country: country.to_string(),
            area: String::new(),
        }
        .province_city()
    }

    #[test]
    fn test_province_city() {
        assert_eq!(split("福建省福州市"), ("福建省".into(), "福州市".into()));
        assert_eq!(split("广东省"), ("广东省".into(), "".into()));
        assert_eq!(split("北京市"), ("北京市".into(), "北京市".into()));
        assert_eq!(split("上海市浦东新区"), ("上海市".into(), "上海市".into()));
        assert_eq!(split("美国"), ("".into(), "".into()));
        assert_eq!(split(""), ("".into(), "".into()));
    }

    #[test]
    fn test_province_city_autonomous_regions() {
        assert_eq!(split("内蒙古呼和浩特市"), ("内蒙古".into(), "呼和浩特市".into()));
        assert_eq!(split("新疆乌鲁木齐市"), ("新疆".into(), "乌鲁木齐市".into()));
        assert_eq!(split("广西壮族自治区南宁市"), ("广西".into(), "南宁市".into()));
        assert_eq!(split("西藏"), ("西藏".into(), "".into()));
    }

    #[test]
    fn test_region() {
        let region = |country: &str| {
            DecodedLocation {
                country: country.to_string(),
                area: String::new(),
            }
            .region()
        };
        assert_eq!(region("福建省福州市"), "福建省福州市");
        assert_eq!(region("北京市"), "北京市");
        assert_eq!(region("宁夏银川市"), "宁夏银川市");
        assert_eq!(region("美国"), "");
    }
}
