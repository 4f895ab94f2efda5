use crate::TrustedKeyring;

/// Whether the repository index must carry a valid signature
///
/// With [`TrustPolicy::Disabled`] the signature verifier is never invoked.
#[derive(Debug, Clone)]
pub enum TrustPolicy {
    Enforced(TrustedKeyring),
    Disabled,
}

impl TrustPolicy {
    #[must_use]
    pub fn is_enforced(&self) -> bool {
        matches!(self, Self::Enforced(_))
    }

    #[must_use]
    pub fn keyring(&self) -> Option<&TrustedKeyring> {
        match self {
            Self::Enforced(keyring) => Some(keyring),
            Self::Disabled => None,
        }
    }
}
