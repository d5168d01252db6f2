//! Core data structures

use serde::{Deserialize, Serialize};

/// An hpfeeds credential: the identity a broker client authenticates as,
/// together with the channels it may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub ident: String,
    pub secret: String,
    #[serde(default)]
    pub sub_channels: Vec<String>,
    #[serde(default)]
    pub pub_channels: Vec<String>,
}

impl Identity {
    pub fn new(ident: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            secret: secret.into(),
            sub_channels: Vec::new(),
            pub_channels: Vec::new(),
        }
    }

    pub fn may_subscribe(&self, channel: &str) -> bool {
        self.sub_channels.iter().any(|c| c == channel)
    }

    pub fn may_publish(&self, channel: &str) -> bool {
        self.pub_channels.iter().any(|c| c == channel)
    }
}

/// Administrative account as persisted in the `users` bucket.
///
/// `hash` is an encoded password digest and must never leave the process;
/// responses use [`UserView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub name: String,
    pub hash: String,
    pub role: String,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }
}

/// Public user information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserView {
    pub name: String,
    pub role: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        user.view()
    }
}

/// Body of a user create/update request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRequest {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "password")]
    pub password: String,
    #[serde(alias = "role")]
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_json_shape() {
        let mut id = Identity::new("test-ident", "test-secret");
        id.sub_channels.push("asdf".to_string());

        let value = serde_json::to_value(&id).unwrap();
        assert_eq!(
            value,
            json!({
                "ident": "test-ident",
                "secret": "test-secret",
                "subChannels": ["asdf"],
                "pubChannels": []
            })
        );

        let decoded: Identity = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, id);
        assert!(decoded.may_subscribe("asdf"));
        assert!(!decoded.may_publish("asdf"));
    }

    #[test]
    fn test_identity_channels_default_to_empty() {
        let id: Identity =
            serde_json::from_str(r#"{"ident":"a","secret":"b"}"#).unwrap();
        assert!(id.sub_channels.is_empty());
        assert!(id.pub_channels.is_empty());
    }

    #[test]
    fn test_user_roundtrip_and_view_hides_hash() {
        let user = User {
            name: "alice".to_string(),
            hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: "user_admin".to_string(),
        };

        let encoded = serde_json::to_string(&user).unwrap();
        let decoded: User = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, user);

        let view = serde_json::to_string(&user.view()).unwrap();
        assert_eq!(view, r#"{"Name":"alice","Role":"user_admin"}"#);
    }

    #[test]
    fn test_user_request_accepts_lowercase_fields() {
        let req: UserRequest = serde_json::from_value(json!({
            "name": "alice",
            "password": "Str0ngPass!",
            "role": "user_admin"
        }))
        .unwrap();
        assert_eq!(req.name, "alice");
        assert_eq!(req.password, "Str0ngPass!");

        let req: UserRequest = serde_json::from_value(json!({
            "Name": "bob",
            "Password": "hunter22",
            "Role": "hpf_reader"
        }))
        .unwrap();
        assert_eq!(req.role, "hpf_reader");
    }
}
