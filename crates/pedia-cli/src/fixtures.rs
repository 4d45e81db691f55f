//! Fixture loading: seeds a storage factory from a JSON file.

use std::path::Path;

use anyhow::Context;
use pedia_core::{GroupVersionKind, Object, PediaConfig};
use pedia_store::{ResourceStorage, StorageFactory};
use serde::Deserialize;
use tracing::{info, warn};

/// One object to create, and the cluster it belongs to.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub cluster: String,
    pub object: Object,
}

pub fn read_fixtures(path: &Path) -> anyhow::Result<Vec<Fixture>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixtures from {}", path.display()))?;
    let fixtures: Vec<Fixture> = serde_json::from_str(&content)
        .with_context(|| format!("parsing fixtures in {}", path.display()))?;
    Ok(fixtures)
}

/// Build a factory from `config` and create every fixture in it. Objects of
/// kinds the config does not register are skipped.
pub fn seed(config: &PediaConfig, fixtures: &[Fixture]) -> anyhow::Result<StorageFactory> {
    let factory = StorageFactory::from_config(config)?;
    let mut created = 0;
    for fixture in fixtures {
        let gvk = fixture.object.group_version_kind();
        if !config.resources.iter().any(|r| r.group_version_kind() == gvk) {
            warn!(kind = %gvk, name = fixture.object.name(), "no storage registered, skipping fixture");
            continue;
        }
        factory
            .create(&fixture.cluster, &fixture.object)
            .with_context(|| {
                format!(
                    "creating {}/{}/{}",
                    fixture.cluster,
                    fixture.object.namespace(),
                    fixture.object.name()
                )
            })?;
        created += 1;
    }
    info!(created, skipped = fixtures.len() - created, "fixtures loaded");
    Ok(factory)
}

/// Load config and fixtures from disk and return the storage for `kind`.
pub fn open_storage(config_path: &str, fixtures_path: &str, kind: &str) -> anyhow::Result<ResourceStorage> {
    let config = PediaConfig::from_file(Path::new(config_path))
        .with_context(|| format!("loading config {config_path}"))?;
    let resource = config
        .resource_for_kind(kind)
        .with_context(|| format!("kind {kind} is not registered in {config_path}"))?;
    let gvk: GroupVersionKind = resource.group_version_kind();

    let fixtures = read_fixtures(Path::new(fixtures_path))?;
    let factory = seed(&config, &fixtures)?;
    Ok(factory.resource_storage(&gvk)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedia_core::ListOptions;
    use pedia_store::ListPage;

    const FIXTURES: &str = r#"[
        {"cluster": "c1", "object": {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "a", "namespace": "default"}}},
        {"cluster": "c2", "object": {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "b", "namespace": "default"}}},
        {"cluster": "c1", "object": {"apiVersion": "batch/v1", "kind": "Job", "metadata": {"name": "nightly"}}}
    ]"#;

    #[test]
    fn seeds_registered_kinds_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.json");
        std::fs::write(&path, FIXTURES).unwrap();

        let fixtures = read_fixtures(&path).unwrap();
        assert_eq!(fixtures.len(), 3);

        let factory = seed(&PediaConfig::scaffold(), &fixtures).unwrap();
        let pods = factory
            .resource_storage(&GroupVersionKind::new("", "v1", "Pod"))
            .unwrap();
        let page: ListPage<Object> = pods.list(&ListOptions::default()).unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn open_storage_reports_unknown_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("pedia.toml");
        let objects = dir.path().join("objects.json");
        std::fs::write(&config, PediaConfig::scaffold().to_toml_string().unwrap()).unwrap();
        std::fs::write(&objects, FIXTURES).unwrap();

        let config = config.to_str().unwrap();
        let objects = objects.to_str().unwrap();
        assert_eq!(open_storage(config, objects, "Pod").unwrap().len().unwrap(), 2);

        let err = open_storage(config, objects, "Job").unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn shipped_fixtures_list_replicaset_pods() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");
        let pods = open_storage(
            &format!("{dir}/pedia.toml"),
            &format!("{dir}/objects.json"),
            "Pod",
        )
        .unwrap();
        let options = pedia_core::ListOptionsBuilder::new()
            .owner_name("web-5d9c")
            .options();
        let page: ListPage<Object> = pods.list(&options).unwrap();
        let mut names: Vec<&str> = page.items.iter().map(Object::name).collect();
        names.sort();
        assert_eq!(names, vec!["web-5d9c-abcde", "web-5d9c-fghij"]);
    }

    #[test]
    fn malformed_fixtures_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.json");
        std::fs::write(&path, r#"{"cluster": "c1"}"#).unwrap();
        assert!(read_fixtures(&path).is_err());
    }
}
