//! Class-name table loading from a YOLO dataset `data.yaml`.
//!
//! Both layouts produced by common tooling are accepted:
//!
//! ```yaml
//! names: ['mobil', 'motor']
//! ```
//!
//! ```yaml
//! names:
//!   0: mobil
//!   1: motor
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use greenlight_models::ClassNames;
use serde::Deserialize;
use tracing::info;

use crate::error::{MediaError, MediaResult};

#[derive(Debug, Deserialize)]
struct DatasetConfig {
    names: NamesField,
    #[serde(default)]
    nc: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NamesField {
    List(Vec<String>),
    Map(BTreeMap<usize, String>),
}

/// Read the class-name table once at startup.
pub fn load_class_names(path: impl AsRef<Path>) -> MediaResult<ClassNames> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| MediaError::class_names(path, e))?;
    let names = parse_class_names(&contents).map_err(|msg| MediaError::class_names(path, msg))?;

    info!(
        path = %path.display(),
        classes = names.len(),
        "Loaded class names"
    );

    Ok(names)
}

fn parse_class_names(contents: &str) -> Result<ClassNames, String> {
    let config: DatasetConfig = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;

    let names: Vec<String> = match config.names {
        NamesField::List(list) => list,
        NamesField::Map(map) => {
            if let Some((i, _)) = map.keys().enumerate().find(|(i, k)| i != *k) {
                return Err(format!("class index {} missing from names map", i));
            }
            map.into_values().collect()
        }
    };

    if names.is_empty() {
        return Err("names list is empty".to_string());
    }
    if let Some(nc) = config.nc {
        if nc != names.len() {
            return Err(format!("nc is {} but {} names are listed", nc, names.len()));
        }
    }

    Ok(ClassNames::new(names))
}
