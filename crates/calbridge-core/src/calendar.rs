//! Canonical calendar types.
//!
//! A [`Calendar`] is identified by the triple (provider, account, id);
//! the same native calendar listed through two accounts is two distinct
//! canonical calendars.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The calendar backend a resource came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Calendar (Calendar API v3).
    Google,
    /// Microsoft 365 (Graph API).
    Microsoft,
}

impl Provider {
    /// Returns the wire name for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the authenticated account may do with a calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPermissions {
    /// Whether events can be created or modified.
    pub can_edit: bool,
    /// Whether the calendar can be shared with others.
    pub can_share: bool,
    /// Whether private items are visible.
    pub can_view_private_items: bool,
    /// The owning account, when the provider reports one.
    pub owner: Option<String>,
}

impl CalendarPermissions {
    /// Permissions of a calendar the account fully owns.
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            can_edit: true,
            can_share: true,
            can_view_private_items: true,
            owner: Some(owner.into()),
        }
    }

    /// Write access without sharing rights.
    pub fn writer() -> Self {
        Self {
            can_edit: true,
            can_share: false,
            can_view_private_items: true,
            owner: None,
        }
    }

    /// No write access at all.
    pub fn read_only() -> Self {
        Self::default()
    }
}

/// A canonical calendar.
///
/// Identity is the (provider, account_id, id) triple. The `color` field
/// is always populated: either the provider's native color or one
/// assigned from the fallback palette by the listing adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Provider-native calendar identifier.
    pub id: String,
    /// The account this calendar was listed through.
    pub account_id: String,
    /// Which backend the calendar lives in.
    pub provider: Provider,
    /// Human-readable calendar name.
    pub name: String,
    /// Display color, as a hex string. Never empty.
    pub color: String,
    /// Whether this is the account's default calendar.
    pub is_default: bool,
    /// Whether the account lacks write access.
    pub is_read_only: bool,
    /// Fine-grained permissions reported by the provider.
    pub permissions: CalendarPermissions,
}

impl Calendar {
    /// Creates a calendar with the required identity and display fields.
    pub fn new(
        provider: Provider,
        account_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            provider,
            name: name.into(),
            color: color.into(),
            is_default: false,
            is_read_only: false,
            permissions: CalendarPermissions::default(),
        }
    }

    /// Builder method to mark as the default calendar.
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Builder method to mark as read-only.
    pub fn with_read_only(mut self, is_read_only: bool) -> Self {
        self.is_read_only = is_read_only;
        self
    }

    /// Builder method to set permissions.
    pub fn with_permissions(mut self, permissions: CalendarPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Returns the identity triple for this calendar.
    pub fn key(&self) -> (Provider, &str, &str) {
        (self.provider, &self.account_id, &self.id)
    }
}

/// Canonical payload for creating or updating a calendar.
///
/// Provider-agnostic: the adapter maps it to the native shape, dropping
/// fields the provider cannot represent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDraft {
    /// The calendar name.
    pub name: String,
    /// Requested display color, if any.
    pub color: Option<String>,
}

impl CalendarDraft {
    /// Creates a draft with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    /// Builder method to request a display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
