use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::OsmElement;
use crate::errors::Result;

/// Opens an .osm file, decompressing it on the fly when it ends in `.xz`.
pub fn open_osm_source(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = fs::File::open(path)?;
    let file_reader = BufReader::new(file);
    if path.extension().is_some_and(|ext| ext == "xz") {
        let xz_reader = XzDecoder::new(file_reader);
        Ok(Box::new(BufReader::new(xz_reader)))
    } else {
        Ok(Box::new(file_reader))
    }
}

/// Pulls elements out of an .osm document one at a time.
///
/// Every direct child of the root (`node`, `way`, `relation`, `bounds`, ...) is
/// yielded on its closing tag together with its whole subtree. The root element
/// comes last and carries only its own attributes, since its children have
/// already been handed out. Nothing is kept once an element has been yielded.
pub struct OsmReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Vec<OsmElement>,
    failed: bool,
}

impl<R: BufRead> OsmReader<R> {
    pub fn new(source: R) -> OsmReader<R> {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        OsmReader {
            reader,
            buf: Vec::new(),
            open: Vec::new(),
            failed: false,
        }
    }

    fn parse_element(reader: &Reader<R>, el: &BytesStart) -> Result<OsmElement> {
        let name = el.name();
        let tag = str::from_utf8(name.as_ref())?;
        let mut element = OsmElement::new(tag);

        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            let key = str::from_utf8(attribute.key.as_ref())?;
            let value = attribute.decode_and_unescape_value(reader)?;
            element.attributes.push((key.to_string(), value.into_owned()));
        }

        Ok(element)
    }

    /// Hands a finished element out if it sits directly below the root (or is the
    /// root), otherwise attaches it to its parent.
    fn close(open: &mut Vec<OsmElement>, element: OsmElement) -> Option<OsmElement> {
        if open.len() > 1 {
            if let Some(parent) = open.last_mut() {
                parent.children.push(element);
                return None;
            }
        }
        Some(element)
    }

    fn next_element(&mut self) -> Result<Option<OsmElement>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => return Ok(None),
                Event::Start(e) => {
                    let element = Self::parse_element(&self.reader, &e)?;
                    self.open.push(element);
                },
                Event::Empty(e) => {
                    let element = Self::parse_element(&self.reader, &e)?;
                    if let Some(done) = Self::close(&mut self.open, element) {
                        return Ok(Some(done));
                    }
                },
                Event::End(_e) => {
                    if let Some(element) = self.open.pop() {
                        if let Some(done) = Self::close(&mut self.open, element) {
                            return Ok(Some(done));
                        }
                    }
                },
                // Declarations, text, comments and the like carry no map data.
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmReader<R> {
    type Item = Result<OsmElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_element();
        self.failed = next.is_err();
        next.transpose()
    }
}
