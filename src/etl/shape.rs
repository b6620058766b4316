use log::{debug, warn};

use crate::data::osm::OsmElement;
use crate::data::record::{ElementType, Record, RESERVED_KEYS};
use crate::errors::{Error, Result};
use crate::etl::normalize::{Normalizer, TagEntry};

/// Attributes that describe who edited an element and when. They end up under `created`.
pub const CREATED: [&str; 5] = ["version", "changeset", "timestamp", "user", "uid"];

/// Turns `node` and `way` elements into records; everything else is skipped.
pub struct RecordShaper<'a> {
    normalizer: &'a Normalizer,
}

impl<'a> RecordShaper<'a> {
    pub fn new(normalizer: &'a Normalizer) -> RecordShaper<'a> {
        RecordShaper {
            normalizer,
        }
    }

    /// `Ok(None)` for elements that are neither nodes nor ways. Unparsable
    /// coordinates are an error.
    pub fn shape(&self, element: &OsmElement) -> Result<Option<Record>> {
        let Some(element_type) = ElementType::from_tag(&element.tag) else {
            return Ok(None);
        };
        let mut record = Record::new(element_type);

        Self::split_attributes(element, &mut record)?;

        for child in &element.children {
            match child.tag.as_str() {
                "nd" if element_type == ElementType::Way => {
                    if let Some(node_ref) = child.attribute("ref") {
                        record.node_refs.push(node_ref.to_string());
                    }
                },
                "tag" => self.apply_tag(child, &mut record),
                _ => (),
            }
        }

        Ok(Some(record))
    }

    fn split_attributes(element: &OsmElement, record: &mut Record) -> Result<()> {
        let mut lat: Option<f64> = None;
        let mut lon: Option<f64> = None;

        for (name, value) in &element.attributes {
            match name.as_str() {
                name if CREATED.contains(&name) => {
                    record.created.insert(name.to_string(), value.to_string());
                },
                "lat" => lat = Some(Self::parse_coordinate(element, "lat", value)?),
                "lon" => lon = Some(Self::parse_coordinate(element, "lon", value)?),
                name if RESERVED_KEYS.contains(&name) => {
                    warn!(element = element.tag.as_str(), attribute = name; "Dropping attribute with a reserved name");
                },
                name => record.set_scalar(name, value),
            }
        }

        match (lat, lon) {
            (Some(lat), Some(lon)) => record.pos = Some([lat, lon]),
            (None, None) => (),
            _ => {
                warn!(element = element.tag.as_str(), id = element.attribute("id").unwrap_or(""); "Only one of lat/lon given, leaving out pos");
            },
        }
        Ok(())
    }

    /// Only finite numbers are coordinates; "NaN" and "inf" parse as floats but not as positions.
    fn parse_coordinate(element: &OsmElement, name: &str, text: &str) -> Result<f64> {
        let reason = match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => return Ok(value),
            Ok(_) => "not a finite number".to_string(),
            Err(err) => err.to_string(),
        };
        Err(Error {
            message: format!(
                "Could not parse {name}=\"{text}\" of {} {}: {reason}",
                element.tag,
                element.attribute("id").unwrap_or("without id"),
            ),
        })
    }

    fn apply_tag(&self, tag: &OsmElement, record: &mut Record) {
        let (Some(key), Some(value)) = (tag.attribute("k"), tag.attribute("v")) else {
            debug!("Skipping tag without k or v");
            return;
        };

        match self.normalizer.classify_and_clean(key, value) {
            TagEntry::Address { subkey, value } => {
                record.address.insert(subkey.to_string(), value);
            },
            TagEntry::Namespaced { prefix, subkey, value } => {
                record.set_namespaced(prefix, subkey, value);
            },
            TagEntry::TopLevel { key, value } => record.set_scalar(key, value),
            TagEntry::Rejected(reason) => {
                debug!(tag_key = key, reason = reason.as_str(); "Dropping tag");
            },
        }
    }
}
