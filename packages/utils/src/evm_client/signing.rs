use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};

use crate::{credential::Credential, error::EvmClientError};

/// A credential starting with `0x` is a raw private key, anything else is a mnemonic
pub fn make_signer(
    credential: &Credential,
    hd_index: Option<u32>,
) -> Result<PrivateKeySigner, EvmClientError> {
    let hd_index = hd_index.unwrap_or_default();

    match credential.trim().strip_prefix("0x") {
        Some(stripped) => {
            // can't derive additional keys from a raw private key
            if hd_index > 0 {
                return Err(EvmClientError::DerivationWithPrivateKey);
            }
            let private_key =
                const_hex::decode(stripped).map_err(|e| EvmClientError::PrivateKey(e.into()))?;
            PrivateKeySigner::from_slice(&private_key)
                .map_err(|e| EvmClientError::PrivateKey(e.into()))
        }
        None => MnemonicBuilder::<English>::default()
            .phrase(credential.trim())
            .index(hd_index)
            .map_err(|e| EvmClientError::Mnemonic(e.into()))?
            .build()
            .map_err(|e| EvmClientError::Mnemonic(e.into())),
    }
}
