//! The trusted committee and its guardian.
//!
//! While bootstrap mode is enabled the guardian may add and remove members and
//! push pre-agreed payloads directly. Disabling bootstrap is permanent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tide_types::Address;

use crate::error::OracleError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    members: BTreeSet<Address>,
    guardian: Address,
    bootstrap_enabled: bool,
}

impl Committee {
    pub fn new(guardian: Address, members: impl IntoIterator<Item = Address>) -> Self {
        Self {
            members: members.into_iter().collect(),
            guardian,
            bootstrap_enabled: true,
        }
    }

    pub fn guardian(&self) -> Address {
        self.guardian
    }

    pub fn bootstrap_enabled(&self) -> bool {
        self.bootstrap_enabled
    }

    pub fn is_member(&self, who: &Address) -> bool {
        self.members.contains(who)
    }

    pub fn members(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    /// Committee size, as used by every quorum rule.
    pub fn size(&self) -> u32 {
        u32::try_from(self.members.len()).unwrap_or(u32::MAX)
    }

    pub fn require_member(&self, who: &Address) -> Result<(), OracleError> {
        if !self.is_member(who) {
            return Err(OracleError::NotMember(*who));
        }
        Ok(())
    }

    /// The caller must be the guardian and bootstrap must still be enabled.
    pub fn require_bootstrap(&self, caller: &Address) -> Result<(), OracleError> {
        if *caller != self.guardian {
            return Err(OracleError::NotGuardian(*caller));
        }
        if !self.bootstrap_enabled {
            return Err(OracleError::BootstrapDisabled);
        }
        Ok(())
    }

    pub fn bootstrap_add(&mut self, caller: &Address, member: Address) -> Result<(), OracleError> {
        self.require_bootstrap(caller)?;
        if !self.members.insert(member) {
            return Err(OracleError::AlreadyMember(member));
        }
        tracing::info!(%member, size = self.members.len(), "committee member added");
        Ok(())
    }

    pub fn bootstrap_remove(&mut self, caller: &Address, member: &Address) -> Result<(), OracleError> {
        self.require_bootstrap(caller)?;
        if !self.members.remove(member) {
            return Err(OracleError::NotMember(*member));
        }
        tracing::info!(%member, size = self.members.len(), "committee member removed");
        Ok(())
    }

    pub fn disable_bootstrap(&mut self, caller: &Address) -> Result<(), OracleError> {
        self.require_bootstrap(caller)?;
        self.bootstrap_enabled = false;
        tracing::info!("committee bootstrap mode disabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardian_manages_members_until_bootstrap_closes() {
        let guardian = Address::from_low_u64(99);
        let mut c = Committee::new(guardian, [Address::from_low_u64(1)]);
        c.bootstrap_add(&guardian, Address::from_low_u64(2)).unwrap();
        assert_eq!(c.size(), 2);
        assert!(c.bootstrap_add(&Address::from_low_u64(1), Address::from_low_u64(3)).is_err());
        c.disable_bootstrap(&guardian).unwrap();
        let err = c.bootstrap_remove(&guardian, &Address::from_low_u64(2)).unwrap_err();
        assert!(matches!(err, OracleError::BootstrapDisabled));
        assert_eq!(err.kind(), tide_types::ErrorKind::AuthorizationViolation);
    }
}
