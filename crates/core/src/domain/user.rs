use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_professional: bool,
    pub loyalty_points: u64,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Effective role; an admin flag outranks the professional flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Professional,
    Client,
}

impl UserProfile {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            is_admin: false,
            is_professional: false,
            loyalty_points: 0,
            phone: String::new(),
            address: String::new(),
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> UserRole {
        if self.is_admin {
            UserRole::Admin
        } else if self.is_professional {
            UserRole::Professional
        } else {
            UserRole::Client
        }
    }

    pub fn apply_update(&mut self, update: &ProfileUpdate) {
        if let Some(name) = non_empty(update.name.as_deref()) {
            self.name = name.to_string();
        }
        if let Some(phone) = non_empty(update.phone.as_deref()) {
            self.phone = phone.to_string();
        }
        if let Some(address) = non_empty(update.address.as_deref()) {
            self.address = address.to_string();
        }
    }
}

/// Partial profile update; blank values leave the stored field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        non_empty(self.name.as_deref()).is_none()
            && non_empty(self.phone.as_deref()).is_none()
            && non_empty(self.address.as_deref()).is_none()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub profile_image_url: String,
    pub rating: f32,
    pub review_count: u32,
    pub is_verified: bool,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{ProfileUpdate, UserId, UserProfile, UserRole};

    fn user(is_admin: bool, is_professional: bool) -> UserProfile {
        let mut user = UserProfile::new(UserId("u-1".to_string()), "Ana", "ana@example.com");
        user.is_admin = is_admin;
        user.is_professional = is_professional;
        user
    }

    #[test]
    fn admin_flag_outranks_professional_flag() {
        assert_eq!(user(true, true).role(), UserRole::Admin);
        assert_eq!(user(false, true).role(), UserRole::Professional);
        assert_eq!(user(false, false).role(), UserRole::Client);
    }

    #[test]
    fn blank_update_fields_are_ignored() {
        let mut profile = user(false, false);
        profile.phone = "3001234567".to_string();

        profile.apply_update(&ProfileUpdate {
            name: Some("Ana Maria".to_string()),
            phone: Some("   ".to_string()),
            address: None,
        });

        assert_eq!(profile.name, "Ana Maria");
        assert_eq!(profile.phone, "3001234567");
    }

    #[test]
    fn update_with_only_blank_values_is_empty() {
        let update = ProfileUpdate { name: Some(String::new()), phone: None, address: None };
        assert!(update.is_empty());
    }
}
