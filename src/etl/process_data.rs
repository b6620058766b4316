use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use tqdm::tqdm;

use crate::config::UserConfig;
use crate::data::record::Record;
use crate::errors::Result;
use crate::etl::normalize::Normalizer;
use crate::etl::parse_osm::{open_osm_source, OsmReader};
use crate::etl::shape::RecordShaper;
use crate::etl::{output_path_for, Etl};

pub const ETL_NAME: &str = "process_data";
pub const OUTPUT_SUFFIX: &str = ".json";
pub const PARTIAL_SUFFIX: &str = ".json.partial";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Elements pulled from the reader, including the ones that gave no record.
    pub elements: u64,
    pub records: u64,
}

/// Records for the node and way elements of a reader, shaped lazily as they are pulled.
pub struct ShapedRecords<'a, R: BufRead> {
    elements: OsmReader<R>,
    shaper: RecordShaper<'a>,
    seen: u64,
}

impl<'a, R: BufRead> ShapedRecords<'a, R> {
    pub fn new(elements: OsmReader<R>, normalizer: &'a Normalizer) -> ShapedRecords<'a, R> {
        ShapedRecords {
            elements,
            shaper: RecordShaper::new(normalizer),
            seen: 0,
        }
    }

    pub fn elements_seen(&self) -> u64 {
        self.seen
    }
}

impl<R: BufRead> Iterator for ShapedRecords<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let element = match self.elements.next()? {
                Ok(element) => element,
                Err(err) => return Some(Err(err)),
            };
            self.seen += 1;
            match self.shaper.shape(&element) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Writes one JSON record per line, or an indented record followed by a newline
/// when `pretty` is set.
pub struct RecordWriter<W: Write> {
    writer: W,
    pretty: bool,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, pretty: bool) -> RecordWriter<W> {
        RecordWriter {
            writer,
            pretty,
            written: 0,
        }
    }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, record)?;
        } else {
            serde_json::to_writer(&mut self.writer, record)?;
        }
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}

/// Reads an .osm extract and writes `<input>.json` with one cleaned record per
/// node and way, ready for `mongoimport`.
pub struct ProcessDataEtl<'a> {
    config: &'a UserConfig,
    normalizer: &'a Normalizer,
    summary: Option<ProcessSummary>,
}

impl<'a> ProcessDataEtl<'a> {
    pub fn new(config: &'a UserConfig, normalizer: &'a Normalizer) -> ProcessDataEtl<'a> {
        ProcessDataEtl {
            config,
            normalizer,
            summary: None,
        }
    }

    pub fn output_path(&self, dir: &Path) -> Result<PathBuf> {
        output_path_for(dir, &self.config.data_path, OUTPUT_SUFFIX)
    }

    /// Where records go while a run is in progress. Renamed to `output_path` once
    /// every element has been written, left behind if the run fails.
    pub fn partial_path(&self, dir: &Path) -> Result<PathBuf> {
        output_path_for(dir, &self.config.data_path, PARTIAL_SUFFIX)
    }

    /// Counts of the last completed load, `None` if nothing ran.
    pub fn summary(&self) -> Option<ProcessSummary> {
        self.summary
    }
}

impl<'a> Etl for ProcessDataEtl<'a> {
    type Input = OsmReader<Box<dyn BufRead>>;
    type Output = ShapedRecords<'a, Box<dyn BufRead>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    // Records always follow the current input and settings (e.g. `pretty`), so an
    // existing `<input>.json` is rewritten rather than reused.
    fn is_cached(&self, _dir: &Path) -> Result<bool> {
        Ok(false)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        for path in [self.output_path(dir)?, self.partial_path(dir)?] {
            if path.try_exists()? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let source = open_osm_source(Path::new(&self.config.data_path))?;
        Ok(OsmReader::new(source))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        Ok(ShapedRecords::new(input, self.normalizer))
    }

    fn load(&mut self, dir: &Path, mut output: Self::Output) -> Result<()> {
        // A failed run must not leave an older `<input>.json` looking like its result.
        self.clean(dir)?;
        let partial_path = self.partial_path(dir)?;
        let output_file = File::create(&partial_path)?;
        let mut writer = RecordWriter::new(BufWriter::new(output_file), self.config.pretty);

        {
            let records: Box<dyn Iterator<Item = Result<Record>> + '_> = if self.config.progress {
                Box::new(tqdm(&mut output))
            } else {
                Box::new(&mut output)
            };
            for record in records {
                // Whatever was written before a bad element stays in the partial file.
                let record = match record {
                    Ok(record) => record,
                    Err(err) => {
                        writer.flush()?;
                        return Err(err);
                    },
                };
                writer.write(&record)?;
            }
        }

        let summary = ProcessSummary {
            elements: output.elements_seen(),
            records: writer.written(),
        };
        writer.into_inner()?;
        fs::rename(&partial_path, self.output_path(dir)?)?;

        info!(etl_name = ETL_NAME, elements = summary.elements, records = summary.records; "Wrote records");
        self.summary = Some(summary);
        Ok(())
    }
}
