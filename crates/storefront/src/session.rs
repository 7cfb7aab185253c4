use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    #[serde(rename = "GLOBALAPPLICATIONADMIN")]
    GlobalApplicationAdmin,
    #[serde(rename = "DEFAULTGLOBALAPPLICATIONADMIN")]
    DefaultGlobalApplicationAdmin,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        matches!(
            self,
            UserRole::GlobalApplicationAdmin | UserRole::DefaultGlobalApplicationAdmin
        )
    }
}

/// Who is logged in and which business (if any) they are acting as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<u64>,
    acting_as: Option<u64>,
    role: Option<UserRole>,
}

fn parse_id(raw: Option<&str>) -> Option<u64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<u64>().ok())
}

impl Session {
    pub fn new(user_id: Option<u64>, acting_as: Option<u64>) -> Self {
        Self {
            user_id,
            acting_as,
            role: None,
        }
    }

    /// Build from raw cookie-style strings; anything that is not a plain
    /// non-negative integer is treated as absent.
    pub fn from_raw(user_id: Option<&str>, acting_as: Option<&str>) -> Self {
        Self::new(parse_id(user_id), parse_id(acting_as))
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    pub fn acting_as(&self) -> Option<u64> {
        self.acting_as
    }

    pub fn is_acting_as_user(&self) -> bool {
        self.acting_as.is_none()
    }

    pub fn is_acting_as(&self, business_id: u64) -> bool {
        self.acting_as == Some(business_id)
    }

    pub fn reset_acting_as(&mut self) {
        if let Some(id) = self.acting_as.take() {
            tracing::info!(business_id = id, "acting-as cleared");
        }
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = Some(role);
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_some_and(UserRole::is_admin)
    }
}
