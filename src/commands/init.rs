//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// What `init` wrote
#[derive(Debug, Clone, Serialize)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

/// Write a default config file and create the data directory next to it
pub fn cmd_init(config_path: &Path, force: bool) -> Result<InitResult> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    config.save(config_path)?;

    let data_dir = config
        .corpus_path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.base_dir.clone());
    std::fs::create_dir_all(&data_dir)?;
    info!("Initialized data directory {}", data_dir.display());

    Ok(InitResult {
        config_path: config_path.to_path_buf(),
        data_dir,
    })
}

pub fn print_init_result(result: &InitResult) {
    println!("✓ orgqa initialized");
    println!("  Config: {}", result.config_path.display());
    println!("  Data:   {}", result.data_dir.display());
    println!("\nNext steps:");
    println!("  1. Put the crawled site text in data/site.txt and FAQs in data/faq.txt");
    println!("  2. Start the embedding and generation servers (see the config file)");
    println!("  3. Build the index: orgqa build");
    println!("  4. Ask: orgqa ask \"What does the organization do?\"");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);

        let result = cmd_init(&path, false).unwrap();

        assert!(path.exists());
        assert_eq!(result.data_dir, tmp.path().join("data"));
        assert!(result.data_dir.is_dir());
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.retrieval.k, 4);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(matches!(cmd_init(&path, false), Err(Error::Config(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        cmd_init(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[retrieval]"));
    }
}
