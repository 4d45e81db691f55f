use std::path::Path;

use pedia_core::PediaConfig;

pub fn init(path: &str) -> anyhow::Result<()> {
    let output = Path::new(path).join("pedia.toml");
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    std::fs::write(&output, PediaConfig::scaffold().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_loadable_scaffold_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        init(path).unwrap();
        let config = PediaConfig::from_file(&dir.path().join("pedia.toml")).unwrap();
        assert!(config.resource_for_kind("Pod").is_some());

        assert!(init(path).is_err());
    }
}
