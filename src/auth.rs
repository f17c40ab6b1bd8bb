use std::str::FromStr;

use async_trait::async_trait;
use ethers::types::Address;
use thiserror::Error;
use tracing::info;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no wallet address configured")]
    MissingWallet,
    #[error("configured wallet address is not valid: {0}")]
    InvalidAddress(String),
    #[error("not signed in")]
    NotSignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub address: Address,
    pub display_name: Option<String>,
}

/// Wallet-authentication collaborator. The real signature flow lives in an
/// external provider; this trait is the surface the strategy binaries see.
#[async_trait]
pub trait WalletAuth: Send + Sync {
    fn is_signed_in(&self) -> bool;
    fn user_data(&self) -> Option<UserData>;
    async fn authenticate(&mut self) -> Result<UserData, AuthError>;
    fn sign_out(&mut self);
}

/// Resolves the wallet identity from configuration. Strategy lists are
/// namespaced by this address.
pub struct EnvWalletAuth {
    address: Option<Address>,
    user: Option<UserData>,
}

impl EnvWalletAuth {
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let address = match &config.wallet_address {
            Some(raw) => Some(
                Address::from_str(raw).map_err(|e| AuthError::InvalidAddress(e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            address,
            user: None,
        })
    }
}

#[async_trait]
impl WalletAuth for EnvWalletAuth {
    fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    fn user_data(&self) -> Option<UserData> {
        self.user.clone()
    }

    async fn authenticate(&mut self) -> Result<UserData, AuthError> {
        let address = self.address.ok_or(AuthError::MissingWallet)?;
        let user = UserData {
            address,
            display_name: None,
        };
        self.user = Some(user.clone());
        info!(address = ?address, "Wallet authenticated");
        Ok(user)
    }

    fn sign_out(&mut self) {
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(wallet_address: Option<&str>) -> Config {
        Config {
            redis_url: "redis://localhost:6379".to_string(),
            wallet_address: wallet_address.map(str::to_string),
            protocols_file: "data/protocols.json".to_string(),
            yields_api_url: None,
            refresh_interval_mins: 30,
            collect_interval_secs: 300,
        }
    }

    #[tokio::test]
    async fn authenticate_resolves_the_configured_address() {
        let config = config_with(Some("0x000000000000000000000000000000000000dEaD"));
        let mut auth = EnvWalletAuth::new(&config).unwrap();
        assert!(!auth.is_signed_in());

        let user = auth.authenticate().await.unwrap();
        assert!(auth.is_signed_in());
        assert_eq!(auth.user_data(), Some(user));

        auth.sign_out();
        assert!(!auth.is_signed_in());
        assert_eq!(auth.user_data(), None);
    }

    #[tokio::test]
    async fn missing_wallet_fails_authentication() {
        let mut auth = EnvWalletAuth::new(&config_with(None)).unwrap();
        assert!(matches!(
            auth.authenticate().await,
            Err(AuthError::MissingWallet)
        ));
    }

    #[test]
    fn malformed_address_is_rejected_at_construction() {
        assert!(EnvWalletAuth::new(&config_with(Some("not-an-address"))).is_err());
    }
}
