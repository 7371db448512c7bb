use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    actions: HashMap<String, String>,
    offsets: HashMap<String, String>,
    skeletons: HashMap<String, String>,
}

pub fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

macro_rules! fixture_kind {
    ($module:ident, $field:ident, $kind:literal) => {
        pub mod $module {
            use super::*;

            pub fn keys() -> Vec<String> {
                MANIFEST.$field.keys().cloned().collect()
            }

            pub fn path(name: &str) -> Result<PathBuf> {
                lookup(&MANIFEST.$field, $kind, name).map(resolve_path)
            }

            pub fn json(name: &str) -> Result<String> {
                read_to_string(lookup(&MANIFEST.$field, $kind, name)?)
            }

            pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
                load_json(lookup(&MANIFEST.$field, $kind, name)?)
            }
        }
    };
}

fixture_kind!(actions, actions, "action");
fixture_kind!(offsets, offsets, "offset table");
fixture_kind!(skeletons, skeletons, "skeleton");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_manifest_entry_exists() {
        for (kind, map) in [
            ("action", &MANIFEST.actions),
            ("offset table", &MANIFEST.offsets),
            ("skeleton", &MANIFEST.skeletons),
        ] {
            for (name, rel) in map {
                assert!(
                    resolve_path(rel).is_file(),
                    "{kind} fixture '{name}' missing at {rel}"
                );
            }
        }
    }

    #[test]
    fn unknown_fixture_is_an_error() {
        let err = actions::json("no-such-action").unwrap_err();
        assert!(err.to_string().contains("no-such-action"));
    }

    #[test]
    fn load_parses_generic_json() {
        let value: serde_json::Value = skeletons::load("female-t-pose").unwrap();
        assert!(value["bones"]["upperarm_L"]["head"].is_array());
    }
}
