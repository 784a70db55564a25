// src/admin/directory.rs
//! Back-office accounts loaded from `ADMIN_EMAILS`
//!
//! Entries are comma separated, each `email[:role[:name]]`. The role
//! defaults to `admin` and the name to the local part of the address.

use std::collections::HashMap;

use crate::auth::models::{AdminPrincipal, AdminRole, Principal};
use crate::common::{derive_id, normalize_email, EntityPrefix};

#[derive(Debug, Clone, PartialEq)]
pub struct AdminAccount {
    pub email: String,
    pub role: AdminRole,
    pub name: String,
}

impl AdminAccount {
    pub fn parse(entry: &str) -> Result<Self, String> {
        let mut fields = entry.splitn(3, ':').map(str::trim);

        let email = normalize_email(fields.next().unwrap_or(""));
        if email.is_empty() || !email.contains('@') {
            return Err(format!("'{}' is not an email address", entry.trim()));
        }

        let role = match fields.next() {
            Some(role) if !role.is_empty() => role.parse::<AdminRole>()?,
            _ => AdminRole::Admin,
        };

        let name = match fields.next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => email.split('@').next().unwrap_or("").to_string(),
        };

        Ok(Self { email, role, name })
    }

    /// Parses the whole list; later duplicates of an email are rejected
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, String> {
        let mut accounts: Vec<Self> = Vec::new();
        for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
            let account = Self::parse(entry)?;
            if accounts.iter().any(|a| a.email == account.email) {
                return Err(format!("duplicate admin email '{}'", account.email));
            }
            accounts.push(account);
        }
        Ok(accounts)
    }

    /// Stable across restarts since accounts are not stored in the database
    pub fn user_id(&self) -> String {
        derive_id(EntityPrefix::Admin, &self.email)
    }

    pub fn to_principal(&self) -> Principal {
        Principal::Admin(AdminPrincipal {
            user_id: self.user_id(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            permissions: self.role.permissions(),
        })
    }
}

#[derive(Debug, Default)]
pub struct AdminDirectory {
    accounts: HashMap<String, AdminAccount>,
}

impl AdminDirectory {
    pub fn new(accounts: Vec<AdminAccount>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.email.clone(), account))
                .collect(),
        }
    }

    pub fn find(&self, email: &str) -> Option<&AdminAccount> {
        self.accounts.get(&normalize_email(email))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::permissions;

    #[test]
    fn test_parse_entry_defaults() {
        let account = AdminAccount::parse(" Ops@Market.example ").unwrap();
        assert_eq!(account.email, "ops@market.example");
        assert_eq!(account.role, AdminRole::Admin);
        assert_eq!(account.name, "ops");
    }

    #[test]
    fn test_parse_entry_full() {
        let account = AdminAccount::parse("root@market.example:super_admin:Root User").unwrap();
        assert_eq!(account.role, AdminRole::SuperAdmin);
        assert_eq!(account.name, "Root User");
    }

    #[test]
    fn test_parse_list_rejects_bad_entries() {
        assert!(AdminAccount::parse_list("root@market.example:owner").is_err());
        assert!(AdminAccount::parse_list("not-an-email").is_err());
        assert!(AdminAccount::parse_list("a@m.example, A@m.example").is_err());
        assert!(AdminAccount::parse_list(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_directory_lookup_is_case_insensitive() {
        let directory = AdminDirectory::new(
            AdminAccount::parse_list("mod@market.example:moderator").unwrap(),
        );
        assert_eq!(directory.len(), 1);

        let account = directory.find("MOD@market.example").unwrap();
        let Principal::Admin(admin) = account.to_principal() else {
            panic!("expected admin principal");
        };
        assert!(admin.has_permission(permissions::SELLERS_READ));
        assert!(!admin.has_permission(permissions::SELLERS_APPROVE));
        assert_eq!(admin.user_id, account.user_id());
        assert!(directory.find("other@market.example").is_none());
    }
}
