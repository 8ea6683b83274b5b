//! Role and ownership checks.
//!
//! Every guarded operation asks [`check`] with the caller, the capabilities
//! that may perform it, the operation kind and, for object-scoped work, whether
//! the caller owns the object. Nothing here touches storage; callers resolve
//! ownership first and act only on [`Decision::Allow`].

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{Role, User};

/// Snapshot of the authenticated user attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    User(AuthUser),
}

impl Principal {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Principal::Anonymous => None,
            Principal::User(user) => Some(user),
        }
    }

    /// The authenticated user, or `Unauthenticated` for anonymous callers.
    pub fn require_user(&self) -> Result<&AuthUser> {
        self.user()
            .ok_or(Error::Unauthenticated("credentials were not provided"))
    }

    pub fn is_admin(&self) -> bool {
        self.user().map_or(false, |u| u.is_staff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Company,
    Candidate,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Operation::List | Operation::Retrieve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Collection-level or non-object operation.
    NotApplicable,
    Owned,
    NotOwned,
}

impl Ownership {
    pub fn of(owner: Uuid, caller: Uuid) -> Self {
        if owner == caller {
            Ownership::Owned
        } else {
            Ownership::NotOwned
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    WrongRole,
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(Denial::Unauthenticated) => {
                Err(Error::Unauthenticated("credentials were not provided"))
            }
            Decision::Deny(_) => Err(Error::PermissionDenied),
        }
    }
}

fn holds(capability: Capability, user: &AuthUser) -> bool {
    match capability {
        Capability::Company => user.role == Role::Company,
        Capability::Candidate => user.role == Role::Candidate,
        Capability::Admin => user.is_staff,
    }
}

/// Evaluates `any_of` as a logical OR of role predicates, then applies the
/// ownership requirement. Admin passes ownership checks; it is global.
///
/// Anonymous callers pass a company or candidate predicate for list and
/// retrieve only. The admin predicate has no anonymous path.
pub fn check(
    principal: &Principal,
    any_of: &[Capability],
    operation: Operation,
    ownership: Ownership,
) -> Decision {
    let user = match principal {
        Principal::Anonymous => {
            let public = operation.is_read_only()
                && ownership == Ownership::NotApplicable
                && any_of
                    .iter()
                    .any(|c| matches!(c, Capability::Company | Capability::Candidate));
            return if public {
                Decision::Allow
            } else {
                Decision::Deny(Denial::Unauthenticated)
            };
        }
        Principal::User(user) => user,
    };

    let matched: Vec<Capability> = any_of
        .iter()
        .copied()
        .filter(|c| holds(*c, user))
        .collect();
    if matched.is_empty() {
        return Decision::Deny(Denial::WrongRole);
    }

    match ownership {
        Ownership::NotOwned if !matched.contains(&Capability::Admin) => {
            Decision::Deny(Denial::NotOwner)
        }
        _ => Decision::Allow,
    }
}

/// Shorthand for the common "must hold one of these roles" gate.
pub fn require(principal: &Principal, any_of: &[Capability], operation: Operation) -> Result<()> {
    check(principal, any_of, operation, Ownership::NotApplicable).into_result()
}

/// Role gate plus ownership of a specific object.
pub fn require_owner(
    principal: &Principal,
    any_of: &[Capability],
    operation: Operation,
    owner: Uuid,
) -> Result<()> {
    let caller = principal.require_user()?.id;
    check(principal, any_of, operation, Ownership::of(owner, caller)).into_result()
}
