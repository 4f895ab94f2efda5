#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! OpenPGP trust for repository metadata
//!
//! Builds the set of trusted signing keys and checks the detached armored
//! signature published next to `repomd.xml`. Packet and armor decoding plus
//! the cryptographic check itself are delegated to `pgp`.

mod keyring;
mod policy;
mod verify;

pub use keyring::{load_keyring, KeySource, TrustedKey, TrustedKeyring};
pub use policy::TrustPolicy;
pub use verify::{verify_detached, KeyIdentifier, SignatureAssertion, VerifiedSignature};
