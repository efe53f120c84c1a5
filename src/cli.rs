use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use ethers::prelude::k256::SecretKey;
use reqwest::Url;

#[derive(Debug, Clone, Parser)]
#[clap(rename_all = "kebab-case")]
pub struct Args {
    /// The RPC url of the network to deploy to
    #[clap(short, long, env)]
    pub rpc_url: Url,

    /// Private key of the deploying account
    #[clap(short, long, env)]
    pub private_key: PrivateKey,

    /// Directory containing the compiled contract artifacts
    #[clap(short, long, env, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PrivateKey {
    pub key: SecretKey,
}

impl FromStr for PrivateKey {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches("0x");

        let bytes = hex::decode(s)?;

        let key = SecretKey::from_slice(&bytes)?;

        Ok(Self { key })
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.key.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_roundtrip() {
        let s = "4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";

        let key: PrivateKey = s.parse().unwrap();

        assert_eq!(key.to_string(), s);
    }

    #[test]
    fn private_key_accepts_0x_prefix() {
        let bare = "4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";
        let prefixed = format!("0x{bare}");

        let key: PrivateKey = prefixed.parse().unwrap();

        assert_eq!(key.to_string(), bare);
    }

    #[test]
    fn private_key_rejects_garbage() {
        assert!("not-a-key".parse::<PrivateKey>().is_err());
    }
}
