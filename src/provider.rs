use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::prelude::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer, Wallet};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest, TxHash};
use ethers::utils::get_contract_address;
use eyre::{bail, Context, ContextCompat};
use reqwest::Url;
use tracing::{info, instrument};

use crate::artifact::{ArtifactRegistry, ContractArtifact};
use crate::cli::PrivateKey;

/// A pending contract creation returned by
/// [`DeploymentProvider::deploy_contract`].
///
/// `expected_address` is derived from the sender and nonce before the
/// transaction is mined. The authoritative address is the one on the
/// receipt, reported through [`DeployedContractInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    pub tx_hash: TxHash,
    pub expected_address: Address,
}

/// A confirmed contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContractInfo {
    pub address: Address,
}

/// The seam between the deployment logic and the chain. Production code
/// talks to an RPC node through [`RpcDeploymentProvider`]; tests inject
/// a mock.
#[async_trait]
pub trait DeploymentProvider {
    async fn deploy_contract(
        &self,
        artifact_name: &str,
        args: Vec<Token>,
    ) -> eyre::Result<DeploymentHandle>;

    async fn wait_for_deployment(
        &self,
        handle: DeploymentHandle,
    ) -> eyre::Result<DeployedContractInfo>;
}

type RpcSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

pub struct RpcDeploymentProvider {
    signer: Arc<RpcSigner>,
    registry: ArtifactRegistry,
    wallet_address: Address,
    nonce: AtomicU64,
    poll_interval: Duration,
}

impl RpcDeploymentProvider {
    pub async fn connect(
        rpc_url: &Url,
        private_key: &PrivateKey,
        registry: ArtifactRegistry,
    ) -> eyre::Result<Self> {
        let provider = Provider::try_from(rpc_url.as_str())?;
        let chain_id = provider.get_chainid().await?;

        let wallet = Wallet::from(private_key.key.clone())
            .with_chain_id(chain_id.as_u64());

        let wallet_address = wallet.address();

        let signer = SignerMiddleware::new(provider, wallet);

        let nonce = signer.get_transaction_count(wallet_address, None).await?;

        Ok(Self {
            signer: Arc::new(signer),
            registry,
            wallet_address,
            nonce: AtomicU64::new(nonce.as_u64()),
            poll_interval: Duration::from_secs(1),
        })
    }

    fn next_nonce(&self) -> u64 {
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl DeploymentProvider for RpcDeploymentProvider {
    #[instrument(skip(self, args))]
    async fn deploy_contract(
        &self,
        artifact_name: &str,
        args: Vec<Token>,
    ) -> eyre::Result<DeploymentHandle> {
        let artifact = self.registry.resolve(artifact_name).await?;

        let call_data = encode_creation_data(&artifact, &args)?;

        let nonce = self.next_nonce();

        let mut tx = TypedTransaction::Eip1559(
            Eip1559TransactionRequest::new()
                .data(call_data)
                .nonce(nonce),
        );

        self.signer.fill_transaction(&mut tx, None).await?;

        let pending = self
            .signer
            .send_transaction(tx, None)
            .await
            .context("Send deployment transaction")?;

        let tx_hash = pending.tx_hash();

        info!("Submitted {artifact_name} deployment in {tx_hash:?}");

        Ok(DeploymentHandle {
            tx_hash,
            expected_address: get_contract_address(self.wallet_address, nonce),
        })
    }

    #[instrument(skip(self))]
    async fn wait_for_deployment(
        &self,
        handle: DeploymentHandle,
    ) -> eyre::Result<DeployedContractInfo> {
        let receipt = loop {
            let receipt = self
                .signer
                .get_transaction_receipt(handle.tx_hash)
                .await
                .context("Awaiting receipt")?;

            if let Some(receipt) = receipt {
                break receipt;
            }

            tokio::time::sleep(self.poll_interval).await;
        };

        if receipt.status != Some(1.into()) {
            bail!("Deployment transaction {:?} reverted", handle.tx_hash);
        }

        let address = receipt
            .contract_address
            .context("Creation receipt carries no contract address")?;

        if address != handle.expected_address {
            info!(
                "Deployed to {address:?}, expected {:?}",
                handle.expected_address
            );
        }

        Ok(DeployedContractInfo { address })
    }
}

/// Builds the creation payload for a deployment transaction: the contract
/// bytecode with the ABI-encoded constructor arguments appended.
fn encode_creation_data(
    artifact: &ContractArtifact,
    args: &[Token],
) -> eyre::Result<Vec<u8>> {
    match artifact.abi.constructor() {
        Some(constructor) => constructor
            .encode_input(artifact.bytecode.to_vec(), args)
            .with_context(|| {
                format!(
                    "Encoding constructor args for {}",
                    artifact.contract_name
                )
            }),
        None if args.is_empty() => Ok(artifact.bytecode.to_vec()),
        None => bail!(
            "{} has no constructor but {} args were supplied",
            artifact.contract_name,
            args.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::deployer::constructor_args;

    const TOKEN_ARTIFACT_JSON: &str = indoc! {r#"
        {
          "contractName": "ReferenceToken",
          "abi": [
            {
              "type": "constructor",
              "stateMutability": "nonpayable",
              "inputs": [
                { "name": "name_", "type": "string" },
                { "name": "symbol_", "type": "string" },
                { "name": "decimals_", "type": "uint8" },
                { "name": "initialHolders_", "type": "address[]" },
                { "name": "feeRecipient_", "type": "address" },
                { "name": "initialSupply_", "type": "uint256" }
              ]
            }
          ],
          "bytecode": "0x608060405234801561001057600080fd5b50"
        }
    "#};

    const NO_CONSTRUCTOR_ARTIFACT_JSON: &str = indoc! {r#"
        {
          "contractName": "Pairing",
          "abi": [],
          "bytecode": "0x6080"
        }
    "#};

    fn token_artifact() -> ContractArtifact {
        serde_json::from_str(TOKEN_ARTIFACT_JSON).unwrap()
    }

    fn no_constructor_artifact() -> ContractArtifact {
        serde_json::from_str(NO_CONSTRUCTOR_ARTIFACT_JSON).unwrap()
    }

    #[test]
    fn creation_data_starts_with_bytecode() {
        let artifact = token_artifact();

        let data = encode_creation_data(&artifact, &constructor_args()).unwrap();

        assert!(data.starts_with(&artifact.bytecode));
        assert!(data.len() > artifact.bytecode.len());
    }

    #[test]
    fn argument_count_mismatch_is_an_error() {
        let artifact = token_artifact();

        let mut args = constructor_args();
        args.pop();

        assert!(encode_creation_data(&artifact, &args).is_err());
    }

    #[test]
    fn no_constructor_means_bare_bytecode() {
        let artifact = no_constructor_artifact();

        let data = encode_creation_data(&artifact, &[]).unwrap();

        assert_eq!(data, artifact.bytecode.to_vec());
    }

    #[test]
    fn no_constructor_rejects_args() {
        let artifact = no_constructor_artifact();

        assert!(encode_creation_data(&artifact, &constructor_args()).is_err());
    }
}
