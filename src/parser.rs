// @file parser.rs
// @brief whitespace-separated point list parser ("lng lat [count [text]]" per line)

use crate::data::{DataPoint, DataSet};
use anyhow::{Context, Result};
use std::io::BufRead;

pub struct PointParser<T>
where
    T: Iterator<Item = std::io::Result<String>>,
{
    it: T,
    line_no: usize,
}

impl<T> PointParser<T>
where
    T: Iterator<Item = std::io::Result<String>>,
{
    pub fn new(it: T) -> PointParser<T> {
        PointParser { it, line_no: 0 }
    }

    fn parse_line(line: &str) -> Option<DataPoint> {
        // 139.6917 35.6895 12 tokyo station
        let mut cols = line.split_whitespace();
        let lng = cols.next()?.parse::<f64>().ok()?;
        let lat = cols.next()?.parse::<f64>().ok()?;
        let mut point = DataPoint::point(lng, lat);
        if let Some(count) = cols.next() {
            point.count = Some(count.parse::<f64>().ok()?);
        }
        let text = cols.collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            point.text = Some(text);
        }
        Some(point)
    }
}

impl<T> Iterator for PointParser<T>
where
    T: Iterator<Item = std::io::Result<String>>,
{
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        loop {
            let line = match self.it.next()? {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("stopped reading points at line {}: {e}", self.line_no + 1);
                    return None;
                }
            };
            self.line_no += 1;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Self::parse_line(line) {
                Some(point) => return Some(point),
                None => log::warn!("skipping malformed line {}: {line:?}", self.line_no),
            }
        }
    }
}

/// Reads a point file: YAML for `.yaml`/`.yml`, the whitespace format otherwise.
pub fn load_points(path: &str) -> Result<DataSet> {
    if path.ends_with(".yaml") || path.ends_with(".yml") {
        let s = std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        return DataSet::from_yaml_str(&s).with_context(|| format!("failed to parse {path}"));
    }
    let file = std::fs::File::open(path).with_context(|| format!("failed to open {path}"))?;
    let points = PointParser::new(std::io::BufReader::new(file).lines()).collect::<Vec<_>>();
    log::info!("loaded {} points from {path}", points.len());
    Ok(DataSet::new(points))
}
