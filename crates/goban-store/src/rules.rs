//! Read/write access rules.
//!
//! A rule applies to its path and everything below it. When several rules
//! match a path, the one with the longest prefix wins; paths no rule covers
//! fall back to the defaults.

use crate::error::{Operation, StoreError};
use crate::path::DbPath;

/// Who may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Only signed-in connections.
    Authenticated,
    /// Nobody.
    Denied,
}

impl Access {
    const fn allows(self, authenticated: bool) -> bool {
        match self {
            Self::Public => true,
            Self::Authenticated => authenticated,
            Self::Denied => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    prefix: DbPath,
    read: Access,
    write: Access,
}

/// The access rules a database enforces.
#[derive(Debug, Clone)]
pub struct Rules {
    default_read: Access,
    default_write: Access,
    rules: Vec<Rule>,
}

impl Rules {
    /// Everything is readable and writable by anyone.
    pub const fn open() -> Self {
        Self::with_defaults(Access::Public, Access::Public)
    }

    /// Rules with the given defaults and no path-specific entries.
    pub const fn with_defaults(read: Access, write: Access) -> Self {
        Self {
            default_read: read,
            default_write: write,
            rules: Vec::new(),
        }
    }

    /// Add a rule for `prefix` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if `prefix` does not parse.
    pub fn with_rule(
        mut self,
        prefix: &str,
        read: Access,
        write: Access,
    ) -> Result<Self, StoreError> {
        self.rules.push(Rule {
            prefix: DbPath::parse(prefix)?,
            read,
            write,
        });
        Ok(self)
    }

    /// Whether `operation` at `path` is allowed.
    pub fn allows(&self, operation: Operation, path: &DbPath, authenticated: bool) -> bool {
        let rule = self
            .rules
            .iter()
            .filter(|rule| rule.prefix.contains(path))
            .max_by_key(|rule| rule.prefix.segments().len());
        let access = match (operation, rule) {
            (Operation::Read, Some(rule)) => rule.read,
            (Operation::Write, Some(rule)) => rule.write,
            (Operation::Read, None) => self.default_read,
            (Operation::Write, None) => self.default_write,
        };
        access.allows(authenticated)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::open()
    }
}
