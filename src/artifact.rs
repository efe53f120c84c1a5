use std::path::{Path, PathBuf};

use ethers::abi::Abi;
use ethers::types::Bytes;
use eyre::Context;
use serde::{Deserialize, Serialize};

/// A compiled contract artifact in the Hardhat output layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

/// Resolves contract names to their compiled artifacts on disk.
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    artifacts_dir: PathBuf,
}

impl ArtifactRegistry {
    pub fn new(artifacts_dir: impl AsRef<Path>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.as_ref().to_owned(),
        }
    }

    /// Probes `<dir>/<Name>.sol/<Name>.json` first, then falls back to the
    /// flat `<dir>/<Name>.json` layout.
    pub async fn resolve(&self, name: &str) -> eyre::Result<ContractArtifact> {
        let nested = self
            .artifacts_dir
            .join(format!("{name}.sol"))
            .join(format!("{name}.json"));
        let flat = self.artifacts_dir.join(format!("{name}.json"));

        let path = if nested.exists() {
            nested
        } else if flat.exists() {
            flat
        } else {
            eyre::bail!(
                "No artifact for {name}: tried {} and {}",
                nested.display(),
                flat.display()
            );
        };

        read_artifact(&path).await
    }
}

async fn read_artifact(path: &Path) -> eyre::Result<ContractArtifact> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Reading from {}", path.display()))?;

    let artifact = serde_json::from_str(&content)
        .with_context(|| format!("Parsing {}", path.display()))?;

    Ok(artifact)
}
