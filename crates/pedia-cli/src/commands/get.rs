use pedia_core::Object;

use crate::fixtures;

pub fn get(
    config: &str,
    fixtures_path: &str,
    kind: &str,
    cluster: &str,
    namespace: &str,
    name: &str,
) -> anyhow::Result<()> {
    let storage = fixtures::open_storage(config, fixtures_path, kind)?;
    let object: Object = storage.get(cluster, namespace, name)?;
    println!("{}", serde_json::to_string_pretty(&object)?);
    Ok(())
}
