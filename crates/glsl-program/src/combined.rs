use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;
use crate::{Result, ShaderStage};

/// Substring that turns a line into a stage marker.
pub const STAGE_MARKER: &str = "#shader";
/// Appended after every line of accumulated source.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Per-stage sources recovered from one annotated file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombinedSource {
    stages: [String; ShaderStage::COUNT],
}

impl CombinedSource {
    pub fn get(&self, stage: ShaderStage) -> Option<&str> {
        let source = &self.stages[stage.index()];
        (!source.is_empty()).then_some(source.as_str())
    }

    /// Non-empty stages in compile order.
    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, &str)> + '_ {
        ShaderStage::ALL
            .into_iter()
            .filter_map(|stage| self.get(stage).map(|source| (stage, source)))
    }

    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(String::is_empty)
    }
}

/// Stage selected by a marker line, in keyword priority order.
fn marker_stage(line: &str) -> Option<ShaderStage> {
    ShaderStage::ALL
        .into_iter()
        .find(|stage| line.contains(stage.keyword()))
}

/// Splits annotated text into per-stage sources.
///
/// A line containing [`STAGE_MARKER`] switches the current stage to the first
/// stage keyword found on it and is dropped; a marker without a keyword keeps
/// the current stage. Lines before the first effective marker are discarded.
pub fn split_combined_source<I, S>(lines: I) -> CombinedSource
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = CombinedSource::default();
    let mut current: Option<ShaderStage> = None;

    for line in lines {
        let line = line.as_ref();
        if line.contains(STAGE_MARKER) {
            if let Some(stage) = marker_stage(line) {
                current = Some(stage);
            }
            continue;
        }
        let Some(stage) = current else {
            continue;
        };
        let buffer = &mut out.stages[stage.index()];
        buffer.push_str(line);
        buffer.push_str(LINE_SEPARATOR);
    }

    out
}

pub fn split_combined_str(text: &str) -> CombinedSource {
    split_combined_source(text.lines())
}

/// Reads `path` line by line. Bytes that are not UTF-8 are replaced rather
/// than rejected, and a trailing `\r` is stripped from every line.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>> {
    let open_error = |source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    let mut lines = Vec::new();
    for raw in BufReader::new(file).split(b'\n') {
        let mut raw = raw.map_err(open_error)?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        lines.push(String::from_utf8_lossy(&raw).into_owned());
    }
    Ok(lines)
}

/// Reads `path` and rejoins its lines with [`LINE_SEPARATOR`].
pub fn read_source_file(path: &Path) -> Result<String> {
    let lines = read_lines(path)?;
    let mut buffer = String::new();
    for line in lines {
        buffer.push_str(&line);
        buffer.push_str(LINE_SEPARATOR);
    }
    Ok(buffer)
}

pub fn read_combined_file(path: &Path) -> Result<CombinedSource> {
    Ok(split_combined_source(read_lines(path)?))
}
