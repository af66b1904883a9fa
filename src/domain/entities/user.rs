use chrono::{DateTime, Utc};
use std::fmt;

/// Represents a platform user, optionally enriched with guild member details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub nickname: Option<String>,
    pub is_bot: bool,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub member: Option<MemberDetails>,
}

/// Guild-scoped data that only exists when the user is seen as a member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDetails {
    pub joined_at: Option<DateTime<Utc>>,
    /// Role names, lowest first, without the implicit @everyone role
    pub roles: Vec<String>,
    pub colour: Option<u32>,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            nickname: None,
            is_bot: false,
            avatar_url: None,
            created_at: None,
            member: None,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_member(mut self, member: MemberDetails) -> Self {
        self.member = Some(member);
        self
    }

    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }

    /// Mention token as rendered by the platform
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
