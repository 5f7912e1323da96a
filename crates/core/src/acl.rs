//! Access control lists for annotations.
//!
//! An ACL is an ordered list of allow/deny entries. Evaluation walks the list
//! and the first entry whose principal the caller holds and whose permission
//! covers the requested action decides the outcome. Annotation ACLs are never
//! stored: they are derived from `(shared, groupid, userid)` on demand by
//! [`annotation_acl`].

use std::fmt;

use serde::Serialize;

/// Group id of the implicit public group every user can read.
pub const PUBLIC_GROUP: &str = "__world__";

/// Prefix of group principals.
pub const GROUP_PRINCIPAL_PREFIX: &str = "group:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// An identity an ACL entry can name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// Every caller, logged in or not.
    Everyone,
    /// Every logged-in caller.
    Authenticated,
    /// A single user, by full userid (`acct:name@authority`).
    User(String),
    /// Members of a group, by group id.
    Group(String),
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everyone => f.write_str("system.Everyone"),
            Self::Authenticated => f.write_str("system.Authenticated"),
            Self::User(userid) => f.write_str(userid),
            Self::Group(groupid) => write!(f, "{GROUP_PRINCIPAL_PREFIX}{groupid}"),
        }
    }
}

impl Serialize for Principal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Actions that can be performed on an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Admin,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Admin, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Admin => "admin",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Action(Action),
    /// Matches every action.
    All,
}

impl Permission {
    fn covers(&self, action: Action) -> bool {
        match self {
            Self::Action(a) => *a == action,
            Self::All => true,
        }
    }
}

/// A single access control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    pub effect: Effect,
    pub principal: Principal,
    pub permission: Permission,
}

impl Ace {
    pub fn allow(principal: Principal, action: Action) -> Self {
        Self {
            effect: Effect::Allow,
            principal,
            permission: Permission::Action(action),
        }
    }

    /// The terminal entry denying everything to everyone.
    pub fn deny_all() -> Self {
        Self {
            effect: Effect::Deny,
            principal: Principal::Everyone,
            permission: Permission::All,
        }
    }
}

pub type Acl = Vec<Ace>;

/// Principal that receives read access to shared annotations in `groupid`.
pub fn group_principal(groupid: &str) -> Principal {
    if groupid == PUBLIC_GROUP {
        Principal::Everyone
    } else {
        Principal::Group(groupid.to_string())
    }
}

/// Derive the ACL of an annotation from its sharing state.
pub fn annotation_acl(shared: bool, groupid: &str, userid: &str) -> Acl {
    let owner = Principal::User(userid.to_string());
    let mut acl = Vec::with_capacity(5);

    if shared {
        acl.push(Ace::allow(group_principal(groupid), Action::Read));
    } else {
        acl.push(Ace::allow(owner.clone(), Action::Read));
    }

    for action in [Action::Admin, Action::Update, Action::Delete] {
        acl.push(Ace::allow(owner.clone(), action));
    }

    // Anything not granted above is refused outright.
    acl.push(Ace::deny_all());

    acl
}

/// Evaluate `acl` for a caller holding `principals`.
pub fn permits(acl: &[Ace], principals: &[Principal], action: Action) -> bool {
    acl.iter()
        .find(|ace| ace.permission.covers(action) && principals.contains(&ace.principal))
        .is_some_and(|ace| ace.effect == Effect::Allow)
}

/// Principals held by a caller.
///
/// Anonymous callers only hold [`Principal::Everyone`].
pub fn effective_principals(userid: Option<&str>, groupids: &[String]) -> Vec<Principal> {
    let mut principals = vec![Principal::Everyone];
    if let Some(userid) = userid {
        principals.push(Principal::Authenticated);
        principals.push(Principal::User(userid.to_string()));
        principals.extend(groupids.iter().map(|g| Principal::Group(g.clone())));
    }
    principals
}

/// Principals explicitly allowed `action` by `acl`, in ACL order.
pub fn allowed_principals(acl: &[Ace], action: Action) -> Vec<Principal> {
    acl.iter()
        .filter(|ace| ace.effect == Effect::Allow && ace.permission.covers(action))
        .map(|ace| ace.principal.clone())
        .collect()
}
