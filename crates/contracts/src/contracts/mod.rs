pub mod launchpad;
pub mod safe;
pub mod webauthn;

pub use launchpad::{ISafe7579Launchpad, ModuleInit};
pub use safe::{IMultiSend, ISafe, ISafeModuleSetup, ISafeProxyFactory};
pub use webauthn::{ISafeWebAuthnSharedSigner, p256_verifiers};
