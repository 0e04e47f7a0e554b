//! Multi-session signing and deployment flows across the account and primitives crates.

use alloy_primitives::{Address, B256, Bytes, U256, hex};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, SolValue};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use eyre::{Result, WrapErr};
use p256::{
    ecdsa::{Signature, SigningKey, signature::Signer},
    elliptic_curve::rand_core::OsRng,
};
use safe_account::{
    ChainReader, Owner, OwnerSet, PasskeyAuthenticator, PasskeyPublicKey, ProxyDeployment,
    SafeAccount, SafeAccountConfig, WebAuthnAssertion,
    passkey::{PasskeyError, signed_message},
    reader::ChainReadError,
};
use safe_contracts::{EntryPointVersion, ISafe, ISafeProxyFactory};
use safe_primitives::{
    AggregatedSignature, PendingOperation, SignatureAggregate, SigningMethod, ValidityWindow,
    signature::{Proof, partial::LegacySignatureEntry},
};
use std::sync::Arc;
use test_case::test_case;

const SHARED_SIGNER: Address = Address::repeat_byte(0xff);
const CREATION_CODE: [u8; 18] = hex!("608060405234801561001057600080fd5b50");

struct StaticReader;

#[async_trait::async_trait]
impl ChainReader for StaticReader {
    async fn code_at(&self, _address: Address) -> Result<Bytes, ChainReadError> {
        Ok(Bytes::new())
    }

    async fn proxy_creation_code(&self, _factory: Address) -> Result<Bytes, ChainReadError> {
        Ok(Bytes::copy_from_slice(&CREATION_CODE))
    }
}

struct SoftwarePasskey(SigningKey);

impl SoftwarePasskey {
    fn public_key(&self) -> PasskeyPublicKey {
        PasskeyPublicKey::from_verifying_key(self.0.verifying_key()).unwrap()
    }
}

#[async_trait::async_trait]
impl PasskeyAuthenticator for SoftwarePasskey {
    async fn get_assertion(&self, challenge: B256) -> Result<WebAuthnAssertion, PasskeyError> {
        let mut assertion = WebAuthnAssertion {
            authenticator_data: Bytes::from(vec![0x49; 37]),
            client_data_json: format!(
                r#"{{"type":"webauthn.get","challenge":"{}","origin":"https://app.safe.global"}}"#,
                URL_SAFE_NO_PAD.encode(challenge)
            ),
            signature: Bytes::new(),
        };
        let signature: Signature = self.0.sign(&signed_message(&assertion));
        assertion.signature = signature.to_der().as_bytes().to_vec().into();
        Ok(assertion)
    }
}

fn config(version: EntryPointVersion) -> SafeAccountConfig {
    SafeAccountConfig {
        webauthn_shared_signer: Some(SHARED_SIGNER),
        ..SafeAccountConfig::new(11155111, version)
    }
}

fn session(owners: Vec<Owner>, threshold: usize) -> Result<SafeAccount<StaticReader>> {
    let resolved = config(EntryPointVersion::V07).resolve()?;
    Ok(SafeAccount::new(resolved, OwnerSet::new(owners, threshold)?, StaticReader)?)
}

fn operation() -> PendingOperation {
    PendingOperation {
        sender: Address::repeat_byte(0x5a),
        nonce: U256::from(1),
        call_data: Bytes::from_static(&[0xde, 0xad]),
        call_gas_limit: U256::from(100_000),
        verification_gas_limit: U256::from(500_000),
        pre_verification_gas: U256::from(60_000),
        max_fee_per_gas: U256::from(2_000_000_000u64),
        max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        validity: ValidityWindow::new(1_700_000_000, 1_800_000_000).unwrap(),
        ..Default::default()
    }
}

/// A and B hold local keys, C is a passkey behind the shared signer. Each signs on a
/// separate device, in the order B, C, A.
#[tokio::test]
async fn test_three_sessions_two_keys_and_a_passkey() -> Result<()> {
    let a = PrivateKeySigner::random();
    let b = PrivateKeySigner::random();
    let passkey = Arc::new(SoftwarePasskey(SigningKey::random(&mut OsRng)));
    let op = operation();

    // B's device
    let device_b = session(
        vec![
            Owner::External(a.address()),
            Owner::local(b.clone()),
            Owner::passkey(passkey.public_key(), None),
        ],
        3,
    )?;
    let AggregatedSignature::Partial(round_one) = device_b.sign_operation(&op, None).await? else {
        eyre::bail!("one of three owners signed");
    };

    // C's device
    let authenticator: Arc<dyn PasskeyAuthenticator> = passkey.clone();
    let device_c = session(
        vec![
            Owner::External(a.address()),
            Owner::External(b.address()),
            Owner::passkey(passkey.public_key(), Some(authenticator)),
        ],
        3,
    )?;
    let AggregatedSignature::Partial(round_two) =
        device_c.sign_operation(&op, Some(&round_one[..])).await?
    else {
        eyre::bail!("two of three owners signed");
    };

    // A's device
    let device_a = session(
        vec![
            Owner::local(a.clone()),
            Owner::External(b.address()),
            Owner::passkey(passkey.public_key(), None),
        ],
        3,
    )?;
    let AggregatedSignature::Final(signature) =
        device_a.sign_operation(&op, Some(&round_two[..])).await?
    else {
        eyre::bail!("every owner signed");
    };

    // the devices agree on the digest and the account
    let digest = device_a.operation_hash(&op)?;
    assert_eq!(digest, device_b.operation_hash(&op)?);
    assert_eq!(device_a.address().await?, device_c.address().await?);

    let (low, high) = if a.address() < b.address() { (&a, &b) } else { (&b, &a) };
    assert_eq!(&signature[..12], &op.validity.encode()?);

    let slots = &signature[12..];
    let passkey_proof_len = U256::from_be_slice(&slots[195..227]).to::<usize>();
    assert_eq!(slots.len(), 3 * 65 + 32 + passkey_proof_len);

    let (_, recovered) = SignatureAggregate::unpack(&signature, 3, digest)?;
    let signers: Vec<_> = recovered.signers().copied().collect();
    assert_eq!(signers, vec![low.address(), high.address(), SHARED_SIGNER]);

    // contract slot: signer word, offset past the three static slots, type 0
    assert_eq!(&slots[130 + 12..130 + 32], SHARED_SIGNER.as_slice());
    assert_eq!(U256::from_be_slice(&slots[162..194]), U256::from(195));
    assert_eq!(slots[194], 0);

    let (auth_data, fields, _rs) =
        <(Bytes, String, [U256; 2])>::abi_decode_params(&slots[227..])?;
    assert_eq!(auth_data.len(), 37);
    assert_eq!(fields, r#""origin":"https://app.safe.global""#);
    Ok(())
}

#[tokio::test]
async fn test_collection_order_does_not_change_the_signature() -> Result<()> {
    let a = PrivateKeySigner::random();
    let b = PrivateKeySigner::random();
    let op = operation();

    let mut signatures = Vec::new();
    for (first, second) in [(&a, &b), (&b, &a)] {
        let first_session = session(
            vec![Owner::local(first.clone()), Owner::External(second.address())],
            2,
        )?;
        let partial = first_session.sign_operation(&op, None).await?.into_bytes();
        let second_session = session(
            vec![Owner::External(first.address()), Owner::local(second.clone())],
            2,
        )?;
        let signature = second_session.sign_operation(&op, Some(&partial[..])).await?;
        assert!(signature.is_final());
        signatures.push(signature);
    }

    // ECDSA signatures from alloy are deterministic (RFC 6979)
    assert_eq!(signatures[0], signatures[1]);
    Ok(())
}

#[tokio::test]
async fn test_legacy_partial_resumes() -> Result<()> {
    let a = PrivateKeySigner::random();
    let b = PrivateKeySigner::random();
    let op = operation();
    let account = session(vec![Owner::External(a.address()), Owner::local(b.clone())], 2)?;
    let digest = account.operation_hash(&op)?;

    // a blob written before contract signatures were supported
    let signature = alloy_signer::SignerSync::sign_hash_sync(&a, &digest)?;
    let proof = Proof::ecdsa(a.address(), &signature, SigningMethod::TypedData);
    let legacy = vec![LegacySignatureEntry {
        signer: a.address(),
        data: Bytes::copy_from_slice(proof.data.as_bytes()),
    }]
    .abi_encode();

    let signature = account.sign_operation(&op, Some(&legacy[..])).await?;
    let AggregatedSignature::Final(packed) = signature else {
        eyre::bail!("both owners signed");
    };
    let (_, recovered) = SignatureAggregate::unpack(&packed, 2, digest)?;
    assert!(recovered.contains(&a.address()));
    assert!(recovered.contains(&b.address()));
    Ok(())
}

#[test_case(EntryPointVersion::V06)]
#[test_case(EntryPointVersion::V07)]
#[tokio::test]
async fn test_factory_data_rederives_the_address(version: EntryPointVersion) -> Result<()> {
    let owners = OwnerSet::new(
        vec![
            Owner::External(Address::repeat_byte(0x01)),
            Owner::External(Address::repeat_byte(0x02)),
        ],
        1,
    )?;
    let account = SafeAccount::new(config(version).resolve()?, owners, StaticReader)?;

    let args = account
        .factory_args()
        .await?
        .ok_or_else(|| eyre::eyre!("fresh account has factory arguments"))?;
    let call = ISafeProxyFactory::createProxyWithNonceCall::abi_decode(&args.factory_data)
        .wrap_err("factory data is createProxyWithNonce")?;
    assert_eq!(call.singleton, account.config().deployment.safe_singleton);

    let setup = ISafe::setupCall::abi_decode(&call.initializer)?;
    assert_eq!(setup.owners, account.owner_addresses()?);
    assert_eq!(setup.threshold, U256::from(1));

    let rederived = ProxyDeployment::from_factory_data(args.factory, &args.factory_data)?
        .address(&CREATION_CODE);
    assert_eq!(rederived, account.address().await?);
    assert_eq!(
        rederived,
        args.factory.create2_from_code(
            safe_account::address::proxy_salt(&call.initializer, call.saltNonce),
            [&CREATION_CODE[..], call.singleton.into_word().as_slice()].concat(),
        )
    );
    Ok(())
}

#[tokio::test]
async fn test_versions_derive_different_addresses() -> Result<()> {
    let owners = || OwnerSet::new(vec![Owner::External(Address::repeat_byte(0x01))], 1);
    let v06 = SafeAccount::new(config(EntryPointVersion::V06).resolve()?, owners()?, StaticReader)?;
    let v07 = SafeAccount::new(config(EntryPointVersion::V07).resolve()?, owners()?, StaticReader)?;
    assert_ne!(v06.address().await?, v07.address().await?);
    Ok(())
}
