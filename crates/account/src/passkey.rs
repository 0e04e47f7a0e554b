//! WebAuthn owners verified through the shared signer contract.
//!
//! A passkey never yields a recoverable signature. The authenticator signs
//! `authenticatorData ++ sha256(clientDataJSON)` with P-256 and the shared signer rebuilds
//! the client data JSON on chain from the challenge and the remaining fields, so only
//! client data in the exact `{"type":"webauthn.get","challenge":"…",…}` layout can verify.

use alloy_primitives::{B256, Bytes, U256};
use alloy_sol_types::SolValue;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::{
    EncodedPoint,
    ecdsa::{Signature, VerifyingKey, signature::Verifier},
};
use sha2::{Digest, Sha256};

const CLIENT_DATA_PREFIX: &str = r#"{"type":"webauthn.get","challenge":""#;

/// Length of an unpadded base64url encoded 32-byte challenge.
pub const CHALLENGE_LENGTH: usize = 43;

/// Errors raised while obtaining or checking a WebAuthn assertion.
#[derive(Debug, thiserror::Error)]
pub enum PasskeyError {
    #[error("authenticator failed: {0}")]
    Authenticator(String),
    #[error("client data JSON does not have the webauthn.get layout")]
    MalformedClientData,
    #[error("client data challenge `{found}` does not match `{expected}`")]
    ChallengeMismatch { expected: String, found: String },
    #[error("invalid P-256 public key")]
    InvalidPublicKey,
    #[error("invalid P-256 signature: {0}")]
    InvalidSignature(#[from] p256::ecdsa::Error),
}

/// Response of a WebAuthn `navigator.credentials.get` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebAuthnAssertion {
    pub authenticator_data: Bytes,
    pub client_data_json: String,
    /// DER encoded P-256 signature.
    pub signature: Bytes,
}

/// Device or platform holding a passkey credential.
#[async_trait::async_trait]
pub trait PasskeyAuthenticator: Send + Sync {
    /// Request an assertion over `challenge`.
    async fn get_assertion(&self, challenge: B256) -> Result<WebAuthnAssertion, PasskeyError>;
}

/// P-256 public key of a passkey owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PasskeyPublicKey {
    pub x: U256,
    pub y: U256,
}

impl PasskeyPublicKey {
    pub fn from_verifying_key(key: &VerifyingKey) -> Result<Self, PasskeyError> {
        let point = key.to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(PasskeyError::InvalidPublicKey);
        };
        Ok(Self {
            x: U256::from_be_slice(x),
            y: U256::from_be_slice(y),
        })
    }

    pub fn verifying_key(&self) -> Result<VerifyingKey, PasskeyError> {
        let mut uncompressed = [0u8; 65];
        uncompressed[0] = 0x04;
        uncompressed[1..33].copy_from_slice(&self.x.to_be_bytes::<32>());
        uncompressed[33..].copy_from_slice(&self.y.to_be_bytes::<32>());
        let point =
            EncodedPoint::from_bytes(uncompressed).map_err(|_| PasskeyError::InvalidPublicKey)?;
        VerifyingKey::from_encoded_point(&point).map_err(|_| PasskeyError::InvalidPublicKey)
    }
}

/// Check the client data layout and challenge, returning the fields after the challenge.
pub fn client_data_fields(client_data_json: &str, challenge: B256) -> Result<&str, PasskeyError> {
    let rest = client_data_json
        .strip_prefix(CLIENT_DATA_PREFIX)
        .ok_or(PasskeyError::MalformedClientData)?;
    let (found, rest) = rest
        .split_at_checked(CHALLENGE_LENGTH)
        .ok_or(PasskeyError::MalformedClientData)?;
    let fields = rest
        .strip_prefix("\",")
        .and_then(|fields| fields.strip_suffix('}'))
        .ok_or(PasskeyError::MalformedClientData)?;

    let expected = URL_SAFE_NO_PAD.encode(challenge);
    if found != expected {
        return Err(PasskeyError::ChallengeMismatch {
            expected,
            found: found.to_string(),
        });
    }
    Ok(fields)
}

/// The message the authenticator signs: `authenticatorData ++ sha256(clientDataJSON)`.
pub fn signed_message(assertion: &WebAuthnAssertion) -> Vec<u8> {
    let client_data_hash = Sha256::digest(assertion.client_data_json.as_bytes());
    [assertion.authenticator_data.as_ref(), &client_data_hash[..]].concat()
}

/// Validate an assertion for `challenge` and encode it as a shared signer contract
/// signature: `abi.encode(bytes authenticatorData, string clientDataFields, uint256[2] rs)`.
///
/// `s` is normalized to the lower half of the curve order.
pub fn encode_assertion(
    key: &PasskeyPublicKey,
    assertion: &WebAuthnAssertion,
    challenge: B256,
) -> Result<Bytes, PasskeyError> {
    let fields = client_data_fields(&assertion.client_data_json, challenge)?;

    let signature = Signature::from_der(&assertion.signature)?;
    let signature = signature.normalize_s().unwrap_or(signature);
    key.verifying_key()?
        .verify(&signed_message(assertion), &signature)?;

    let (r, s) = signature.split_bytes();
    let rs = [U256::from_be_slice(&r), U256::from_be_slice(&s)];
    Ok((assertion.authenticator_data.clone(), fields.to_string(), rs)
        .abi_encode_params()
        .into())
}
