//! Sample files on disk.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arrange_eval::{InstrumentActivity, NoteActivity, Sample};
use serde::Deserialize;

/// One generated piece as written by the decoding stage.
#[derive(Debug, Deserialize)]
pub struct SampleFile {
    #[serde(default)]
    pub name: Option<String>,
    /// `[class][timestep]`
    pub inst_class: Vec<Vec<f32>>,
    /// `[track][pitch][timestep]`
    pub output: Vec<Vec<Vec<f32>>>,
}

impl SampleFile {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing sample file {}", path.display()))
    }

    /// Build the sample, naming it after the file stem when unnamed.
    pub fn into_sample(self, path: &Path) -> Result<Sample> {
        let name = self.name.or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        });
        let inst_class = InstrumentActivity::from_rows(self.inst_class)?;
        let notes = NoteActivity::from_rows(self.output)?;
        Ok(Sample::new(&inst_class, &notes, name)?)
    }
}

/// Expand the command-line inputs into sample files.
///
/// Directories contribute their `*.json` entries in name order; files are
/// taken as given.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("listing {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
                .collect();
            entries.sort();
            files.extend(entries);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            bail!("input not found: {}", input.display());
        }
    }

    if files.is_empty() {
        bail!("no sample files found in the given inputs");
    }
    Ok(files)
}
