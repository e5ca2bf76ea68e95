use anyhow::Result;
use std::fs;
use std::path::PathBuf;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from("smellmap.yaml");

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let default_config = r#"# smellmap application config

repositories:
  - name: main
    path: .

deployment:
  kubernetes:
    repository: main
    glob: "k8s/**/*.yaml"

services:
  - name: orders
    repository: main
    dockerfile: orders/Dockerfile
    openapi: orders/openapi.yaml
    image: registry.local/orders

properties:
  - service: orders
    properties:
      gateway: false
"#;

    fs::write(&config_path, default_config)?;
    println!("Created smellmap.yaml configuration file");

    Ok(())
}
