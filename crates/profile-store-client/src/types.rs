//! Profile record types.

use serde::{Deserialize, Serialize};

/// Application-level profile record, one row per identity.
///
/// The row id equals the identity id assigned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Identity UUID (primary key, equals the provider's identity id).
    pub id: String,
    /// Given name.
    #[serde(default)]
    pub name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub surname: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Avatar/photo URL.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Age, if the user provided it.
    #[serde(default)]
    pub age: Option<i64>,
    /// Account status (e.g., "activo").
    #[serde(default)]
    pub status: Option<String>,
    /// Application role (e.g., "usuario").
    #[serde(default)]
    pub role: Option<String>,
}

/// Partial update for a profile row.
///
/// Only fields set to `Some` are sent; everything else is left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ProfilePatch {
    /// True when no field is set (the patch would be a no-op).
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.photo_url.is_none()
            && self.age.is_none()
            && self.status.is_none()
            && self.role.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_deserializes_with_missing_fields() {
        let profile: Profile = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert_eq!(profile.id, "u1");
        assert!(profile.name.is_none());
        assert!(profile.role.is_none());
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = ProfilePatch {
            name: Some("Ana".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Ana" }));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProfilePatch::default().is_empty());
        let patch = ProfilePatch {
            status: Some("activo".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
