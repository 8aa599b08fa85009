//! Group participants.

use std::{collections::HashSet, fmt};

use crate::{EngineError, ResultEngine};

/// Minimum number of members a group must have.
pub const MIN_GROUP_MEMBERS: usize = 2;

/// A named participant in a group.
///
/// Identifiers are trimmed and compared case-sensitively: `"Bob"` and
/// `"bob"` are different members.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Member(String);

impl Member {
    /// Builds a member from user input, trimming surrounding whitespace.
    pub fn parse(value: &str) -> ResultEngine<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidMember(
                "member name must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wraps an already normalized identifier (e.g. loaded from storage).
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Member {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Member {
    /// Infallible conversion used by tests and fixtures; input is trimmed but
    /// not validated.
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// Ordered, duplicate-free set of group members.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberSet(Vec<Member>);

impl MemberSet {
    /// Validates a member list for a new group.
    ///
    /// Blank entries are dropped, the remaining names are trimmed. Duplicates
    /// and lists shorter than [`MIN_GROUP_MEMBERS`] are rejected.
    pub fn try_new<I, S>(names: I) -> ResultEngine<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for name in names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                continue;
            }
            let member = Member::parse(name)?;
            if !seen.insert(member.clone()) {
                return Err(EngineError::InvalidMember(format!(
                    "duplicate member: {member}"
                )));
            }
            members.push(member);
        }

        if members.len() < MIN_GROUP_MEMBERS {
            return Err(EngineError::InvalidMember(format!(
                "at least {MIN_GROUP_MEMBERS} members are required"
            )));
        }

        Ok(Self(members))
    }

    /// Builds a set without the group-size check, keeping first occurrences.
    pub fn from_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Member>,
    {
        let mut seen = HashSet::new();
        Self(
            members
                .into_iter()
                .filter(|member| seen.insert(member.clone()))
                .collect(),
        )
    }

    pub fn contains(&self, member: &Member) -> bool {
        self.0.iter().any(|m| m == member)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a MemberSet {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for MemberSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_members(iter.into_iter().map(|name| Member::from(name.as_ref())))
    }
}
