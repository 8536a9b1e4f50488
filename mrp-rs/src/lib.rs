//! Model Run Protocol harness.
//!
//! A run request arrives as one JSON document on stdin:
//!
//! ```json
//! {
//!   "input":  { "seed": 1, "replicate": 0, "r0": 2.0, ... },
//!   "model":  { "files": { "parameters": "scenarios/madagascar.toml" } },
//!   "output": { "spec": "filesystem", "dir": "output" }
//! }
//! ```
//!
//! [`Environment`] splits that request into the typed model input, the named
//! model files and the output destination. Outputs go to the requested
//! directory, or to stdout when the request names none.

mod error;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub use error::{MrpError, Result};

#[derive(Debug)]
pub struct Environment<I = ()> {
    input_json: serde_json::Map<String, Value>,
    pub input: Option<I>,
    pub seed: u64,
    pub replicate: u64,
    pub files: HashMap<String, PathBuf>,
    output: Value,
}

impl Environment {
    pub fn from_json(data: Value) -> Self {
        let mut input_json = data
            .get("input")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let seed = input_json
            .remove("seed")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let replicate = input_json
            .remove("replicate")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let files = data
            .get("model")
            .and_then(|m| m.get("files"))
            .and_then(|f| f.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), PathBuf::from(s))))
                    .collect()
            })
            .unwrap_or_default();

        let output = data.get("output").cloned().unwrap_or(Value::Null);

        Self {
            input_json,
            input: None,
            seed,
            replicate,
            files,
            output,
        }
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        if raw.trim().is_empty() {
            return Err(MrpError::EmptyInput);
        }
        let data: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_json(data))
    }

    pub fn from_stdin() -> Result<Self> {
        Self::from_reader(io::stdin().lock())
    }

    /// Fills input keys missing from the request with the values of the TOML
    /// file registered under `key` in `model.files`. Inline input wins.
    pub fn with_defaults_from(mut self, key: &str) -> Result<Self> {
        let Some(path) = self.files.get(key).cloned() else {
            return Ok(self);
        };
        let raw = fs::read_to_string(&path).map_err(|source| MrpError::ParameterFile {
            path: path.clone(),
            source,
        })?;
        let table: toml::Table = toml::from_str(&raw).map_err(|source| MrpError::Toml {
            path: path.clone(),
            source,
        })?;

        let mut filled = 0;
        for (name, value) in table {
            if !self.input_json.contains_key(&name) {
                self.input_json.insert(name, serde_json::to_value(value)?);
                filled += 1;
            }
        }
        debug!("{filled} input values taken from {}", path.display());
        Ok(self)
    }

    pub fn with_input_type<I: DeserializeOwned>(self) -> Result<Environment<I>> {
        let input_value = Value::Object(self.input_json.clone());
        let input = serde_json::from_value(input_value).map_err(MrpError::Input)?;
        Ok(Environment {
            input_json: self.input_json,
            input: Some(input),
            seed: self.seed,
            replicate: self.replicate,
            files: self.files,
            output: self.output,
        })
    }
}

impl<I: DeserializeOwned> Environment<I> {
    /// Reads the request from stdin, merges the optional parameter file
    /// registered under `defaults_key` and deserializes the model input.
    pub fn load(defaults_key: &str) -> Result<Self> {
        Environment::from_stdin()?
            .with_defaults_from(defaults_key)?
            .with_input_type::<I>()
    }
}

impl<I> Environment<I> {
    pub fn input_json(&self) -> &serde_json::Map<String, Value> {
        &self.input_json
    }

    /// SHA-256 of the canonical (key-sorted) model input, hex encoded.
    ///
    /// Two requests with the same effective input produce the same digest,
    /// independent of key order or of which values came from a parameter file.
    pub fn input_digest(&self) -> String {
        let canonical = Value::Object(self.input_json.clone()).to_string();
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        let output = &self.output;

        if output.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            return output
                .get("dir")
                .and_then(|v| v.as_str())
                .map(PathBuf::from);
        }

        // Profiled output: the "default" profile, else the first one listed
        let profile = output.get("profile").and_then(|v| v.as_object()).and_then(
            |profiles| profiles.get("default").or_else(|| profiles.values().next()),
        )?;
        if profile.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            return profile
                .get("dir")
                .and_then(|v| v.as_str())
                .map(PathBuf::from);
        }

        None
    }

    fn sink(&self, filename: &str) -> Result<Box<dyn Write>> {
        match self.output_dir() {
            Some(dir) => {
                fs::create_dir_all(&dir)?;
                let path = dir.join(filename);
                info!("writing {}", path.display());
                Ok(Box::new(io::BufWriter::new(fs::File::create(path)?)))
            }
            None => Ok(Box::new(io::stdout())),
        }
    }

    pub fn write(&self, filename: &str, data: &[u8]) -> Result<()> {
        let mut out = self.sink(filename)?;
        out.write_all(data)?;
        out.flush()?;
        Ok(())
    }

    /// Writes `records` as CSV, one row per record, with a header row derived
    /// from the record's field names.
    pub fn write_csv<T: Serialize>(&self, filename: &str, records: &[T]) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(self.sink(filename)?);
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(value)?;
        data.push(b'\n');
        self.write(filename, &data)
    }
}
