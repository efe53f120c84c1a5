use std::io::Write;

use ethers::abi::Token;
use ethers::types::Address;
use tracing::instrument;

use crate::provider::{DeployedContractInfo, DeploymentProvider};
use crate::types::{InitialSupply, TokenDecimals};

pub const TOKEN_ARTIFACT: &str = "ReferenceToken";

pub const TOKEN_NAME: &str = "ReferenceToken_name";
pub const TOKEN_SYMBOL: &str = "ReferenceToken_symbol";
pub const TOKEN_DECIMALS: TokenDecimals = TokenDecimals(1);
pub const INITIAL_SUPPLY: InitialSupply = InitialSupply(1_000_000_000);

/// The token's constructor arguments, in the exact order of the contract's
/// constructor signature:
/// `(name, symbol, decimals, initialHolders, feeRecipient, initialSupply)`.
///
/// No initial holders, and the zero address as fee recipient.
pub fn constructor_args() -> Vec<Token> {
    vec![
        Token::String(TOKEN_NAME.to_string()),
        Token::String(TOKEN_SYMBOL.to_string()),
        Token::Uint(TOKEN_DECIMALS.0.into()),
        Token::Array(vec![]),
        Token::Address(Address::zero()),
        Token::Uint(INITIAL_SUPPLY.0.into()),
    ]
}

/// Deploys the token and reports the confirmed address on `out`.
///
/// Two sequential awaits: submission, then confirmation. Errors from
/// either propagate unchanged; there is no retry.
#[instrument(skip_all)]
pub async fn deploy(
    provider: &impl DeploymentProvider,
    out: &mut impl Write,
) -> eyre::Result<DeployedContractInfo> {
    let handle = provider
        .deploy_contract(TOKEN_ARTIFACT, constructor_args())
        .await?;

    let info = provider.wait_for_deployment(handle).await?;

    // The receipt address, not the pre-mining prediction on the handle.
    writeln!(out, "token deployed to {:?}", info.address)?;

    Ok(info)
}
