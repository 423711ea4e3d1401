use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::encoder::{CategoricalEncoder, Category};
use crate::error::PipelineError;
use crate::schema::{FEATURE_NAMES, feature_names};

pub const SNAPSHOT_VERSION: u32 = 1;
pub const COUNTRY_CODES_FILE: &str = "country_codes.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const VOCABULARY_FILE: &str = "vocabulary.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSnapshot {
    pub version: u32,
    pub schema_fingerprint: String,
    pub feature_names: Vec<String>,
    pub encoder: CategoricalEncoder,
}

/// SHA-256 over the ordered column names. Any rename or reorder changes it.
pub fn schema_fingerprint() -> String {
    let mut hasher = Sha256::new();
    for name in FEATURE_NAMES {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Writes the three encoder artifacts into `dir`. The country table and the
/// column list are also written on their own for consumers that only need
/// those.
pub fn save_encoders(dir: &Path, encoder: &CategoricalEncoder) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let countries: BTreeMap<String, i32> = encoder.table(Category::Country);
    write_json(&dir.join(COUNTRY_CODES_FILE), &countries)?;
    write_json(&dir.join(FEATURE_NAMES_FILE), &feature_names())?;

    let snapshot = EncoderSnapshot {
        version: SNAPSHOT_VERSION,
        schema_fingerprint: schema_fingerprint(),
        feature_names: feature_names(),
        encoder: encoder.clone(),
    };
    write_json(&dir.join(VOCABULARY_FILE), &snapshot)?;

    info!(
        dir = %dir.display(),
        countries = countries.len(),
        "saved encoders"
    );
    Ok(())
}

pub fn load_encoders(dir: &Path) -> Result<CategoricalEncoder> {
    let path = dir.join(VOCABULARY_FILE);
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let snapshot: EncoderSnapshot =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    let current = schema_fingerprint();
    if snapshot.schema_fingerprint != current {
        return Err(PipelineError::SchemaMismatch {
            snapshot: snapshot.schema_fingerprint,
            current,
        })
        .with_context(|| format!("load {}", path.display()));
    }
    Ok(snapshot.encoder)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}
