use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::config::UserConfig;
use crate::data::osm::OsmElement;
use crate::errors::Result;
use crate::etl::normalize::Normalizer;
use crate::etl::parse_osm::{open_osm_source, OsmReader};
use crate::etl::{output_path_for, Etl};

pub const ETL_NAME: &str = "audit_streets";
pub const OUTPUT_SUFFIX: &str = ".street_types.txt";

const STREET_KEY: &str = "addr:street";

/// How often each street-type token shows up in `addr:street` values.
pub type StreetTypeCounts = HashMap<String, u64>;

/// Counts the trailing tokens of every `addr:street` value in an extract, to find
/// abbreviations worth adding to the name normalizer.
pub struct AuditStreetsEtl<'a> {
    config: &'a UserConfig,
    normalizer: &'a Normalizer,
}

impl<'a> AuditStreetsEtl<'a> {
    pub fn new(config: &'a UserConfig, normalizer: &'a Normalizer) -> AuditStreetsEtl<'a> {
        AuditStreetsEtl {
            config,
            normalizer,
        }
    }

    pub fn output_path(&self, dir: &Path) -> Result<PathBuf> {
        output_path_for(dir, &self.config.data_path, OUTPUT_SUFFIX)
    }

    pub fn audit_street_type(&self, counts: &mut StreetTypeCounts, street_name: &str) {
        for token in street_name.split_whitespace() {
            if let Some(street_type) = self.normalizer.street_type(token) {
                *counts.entry(street_type.to_string()).or_insert(0) += 1;
            }
        }
    }

    fn audit_element(&self, counts: &mut StreetTypeCounts, element: &OsmElement) {
        if element.is("tag") && element.attribute("k") == Some(STREET_KEY) {
            if let Some(street_name) = element.attribute("v") {
                self.audit_street_type(counts, street_name);
            }
        }
        for child in &element.children {
            self.audit_element(counts, child);
        }
    }
}

/// Street types sorted case-insensitively, ties in byte order.
pub fn sorted_counts(counts: &StreetTypeCounts) -> Vec<(&str, u64)> {
    let mut sorted: Vec<(&str, u64)> = counts.iter()
        .map(|(street_type, count)| (street_type.as_str(), *count))
        .collect();
    sorted.sort_by(|(a, _), (b, _)| {
        a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
    });
    sorted
}

impl Etl for AuditStreetsEtl<'_> {
    type Input = OsmReader<Box<dyn BufRead>>;
    type Output = StreetTypeCounts;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(self.output_path(dir)?.try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        if self.is_cached(dir)? {
            fs::remove_file(self.output_path(dir)?)?;
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let source = open_osm_source(Path::new(&self.config.data_path))?;
        Ok(OsmReader::new(source))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let mut counts = StreetTypeCounts::new();
        for element in input {
            self.audit_element(&mut counts, &element?);
        }
        Ok(counts)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let mut output_file = BufWriter::new(File::create(self.output_path(dir)?)?);
        for (street_type, count) in sorted_counts(&output) {
            writeln!(output_file, "{street_type}: {count}")?;
        }
        output_file.flush()?;

        info!(etl_name = ETL_NAME, street_types = output.len(); "Wrote street type counts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::normalize::SubstitutionMode;

    #[test]
    fn counts_every_token_of_street_names() {
        let config = UserConfig::new("sample.osm");
        let normalizer = Normalizer::new(SubstitutionMode::Literal).unwrap();
        let etl = AuditStreetsEtl::new(&config, &normalizer);
        let mut counts = StreetTypeCounts::new();

        etl.audit_street_type(&mut counts, "W 42nd St");
        etl.audit_street_type(&mut counts, "5th Ave.");
        etl.audit_street_type(&mut counts, "Main St");

        assert_eq!(counts.get("St"), Some(&2));
        assert_eq!(counts.get("Ave."), Some(&1));
        assert_eq!(counts.get("W"), Some(&1));
        assert_eq!(counts.get("42nd"), Some(&1));
    }

    #[test]
    fn only_street_tags_are_audited() {
        let config = UserConfig::new("sample.osm");
        let normalizer = Normalizer::new(SubstitutionMode::Literal).unwrap();
        let etl = AuditStreetsEtl::new(&config, &normalizer);
        let way = OsmElement::new("way")
            .with_tag("addr:street", "Broadway")
            .with_tag("addr:city", "New York")
            .with_tag("name", "Some Rd");
        let mut counts = StreetTypeCounts::new();

        etl.audit_element(&mut counts, &way);

        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("Broadway"), Some(&1));
    }

    #[test]
    fn sorts_case_insensitively() {
        let counts: StreetTypeCounts = [("st", 1), ("Ave", 3), ("St", 2), ("avenue", 1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        assert_eq!(
            sorted_counts(&counts),
            vec![("Ave", 3), ("avenue", 1), ("St", 2), ("st", 1)]
        );
    }
}
