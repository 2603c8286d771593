//! Profile and account management for the signed-in user

use crate::models::{Ack, User};
use crate::validation;
use api_client::descriptor::{MockEnv, RequestDescriptor};
use api_client::{ApiError, ApiRequest, Envelope, RawResponse, Result};
use serde::{Deserialize, Serialize};

const MOCK_EMAIL: &str = "shopper@buylocal.test";

fn mock_user(env: &MockEnv) -> User {
    User {
        id: env.synthetic_id("user"),
        email: MOCK_EMAIL.to_string(),
        first_name: Some("Test".to_string()),
        last_name: Some("Shopper".to_string()),
        phone: None,
        is_verified: true,
    }
}

fn user_from(response: &RawResponse) -> Result<User> {
    let envelope = Envelope::parse(response)?;
    match envelope.optional("/data/user")? {
        Some(user) => Ok(user),
        None => envelope.require_payload(),
    }
}

/// `GET /users/me`
#[derive(Debug, Clone, Copy, Default)]
pub struct GetProfile;

impl RequestDescriptor for GetProfile {
    type Input = ();
    type Output = User;
    const NAME: &'static str = "account.getProfile";

    fn mock(&self, _input: &(), env: &MockEnv) -> Result<User> {
        Ok(mock_user(env))
    }

    fn request(&self, _input: &()) -> Result<ApiRequest> {
        Ok(ApiRequest::get("/users/me"))
    }

    fn normalize(&self, response: &RawResponse) -> Result<User> {
        user_from(response)
    }
}

/// Fields to change; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New contact number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

/// `PATCH /users/me`
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateProfile;

impl RequestDescriptor for UpdateProfile {
    type Input = ProfileUpdate;
    type Output = User;
    const NAME: &'static str = "account.updateProfile";

    fn validate(&self, input: &ProfileUpdate) -> Result<()> {
        if input.is_empty() {
            return Err(ApiError::validation("Nothing to update"));
        }
        if let Some(first_name) = &input.first_name {
            validation::require_non_empty("First name", first_name)?;
        }
        if let Some(last_name) = &input.last_name {
            validation::require_non_empty("Last name", last_name)?;
        }
        Ok(())
    }

    fn mock(&self, input: &ProfileUpdate, env: &MockEnv) -> Result<User> {
        let mut user = mock_user(env);
        if let Some(first_name) = &input.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &input.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(phone) = &input.phone {
            user.phone = Some(phone.clone());
        }
        Ok(user)
    }

    fn request(&self, input: &ProfileUpdate) -> Result<ApiRequest> {
        ApiRequest::patch("/users/me").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> Result<User> {
        user_from(response)
    }
}

/// Current and replacement password
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    /// Password in use now
    pub current_password: String,
    /// Replacement
    pub new_password: String,
}

/// `POST /users/me/password`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangePassword;

impl RequestDescriptor for ChangePassword {
    type Input = ChangePasswordInput;
    type Output = Ack;
    const NAME: &'static str = "account.changePassword";

    fn validate(&self, input: &ChangePasswordInput) -> Result<()> {
        validation::require_non_empty("Current password", &input.current_password)?;
        validation::new_password(&input.new_password)?;
        if input.new_password == input.current_password {
            return Err(ApiError::validation("New password must differ from the current one"));
        }
        Ok(())
    }

    fn mock(&self, _input: &ChangePasswordInput, _env: &MockEnv) -> Result<Ack> {
        Ok(Ack::new("Password changed successfully"))
    }

    fn request(&self, input: &ChangePasswordInput) -> Result<ApiRequest> {
        ApiRequest::post("/users/me/password").json(input)
    }

    fn normalize(&self, response: &RawResponse) -> Result<Ack> {
        Ack::from_response(response, "Password changed successfully")
    }
}

/// `DELETE /users/me`, confirmed with the account password
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteAccount;

impl RequestDescriptor for DeleteAccount {
    /// Account password
    type Input = String;
    type Output = Ack;
    const NAME: &'static str = "account.delete";

    fn validate(&self, password: &String) -> Result<()> {
        validation::require_non_empty("Password", password)
    }

    fn mock(&self, _password: &String, _env: &MockEnv) -> Result<Ack> {
        Ok(Ack::new("Account deleted"))
    }

    fn request(&self, password: &String) -> Result<ApiRequest> {
        ApiRequest::delete("/users/me").json(&serde_json::json!({ "password": password }))
    }

    fn normalize(&self, response: &RawResponse) -> Result<Ack> {
        Ack::from_response(response, "Account deleted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::test_utils::TestHarness;
    use api_client::{HttpMethod, Session};
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_update_applies_fields() {
        let harness = TestHarness::mocked();
        let update = ProfileUpdate { phone: Some("+1 555 0100".into()), ..Default::default() };

        let user = harness.ctx.invoke(&UpdateProfile, update).await.unwrap();
        assert_eq!(user.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(user.first_name.as_deref(), Some("Test"));
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let harness = TestHarness::new();
        let err = harness.ctx.invoke(&UpdateProfile, ProfileUpdate::default()).await.unwrap_err();
        assert_eq!(err, ApiError::validation("Nothing to update"));
    }

    #[tokio::test]
    async fn test_live_update_sends_only_changes() {
        let harness = TestHarness::new();
        harness.session.set_session(Session::new("tok"));
        harness
            .transport
            .respond_json(200, json!({"data": {"user": {"id": "u1", "email": "a@b.com", "lastName": "Byron"}}}));

        let update = ProfileUpdate { last_name: Some("Byron".into()), ..Default::default() };
        let user = harness.ctx.invoke(&UpdateProfile, update).await.unwrap();

        assert_eq!(user.last_name.as_deref(), Some("Byron"));
        let request = harness.transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body, json!({"lastName": "Byron"}));
    }

    #[tokio::test]
    async fn test_change_password_rules() {
        let harness = TestHarness::mocked();
        let same = ChangePasswordInput { current_password: "password1".into(), new_password: "password1".into() };
        assert!(harness.ctx.invoke(&ChangePassword, same).await.is_err());

        let ok = ChangePasswordInput { current_password: "password1".into(), new_password: "password2".into() };
        assert!(harness.ctx.invoke(&ChangePassword, ok).await.is_ok());
    }

    #[tokio::test]
    async fn test_live_profile_from_user_key() {
        let harness = TestHarness::new();
        harness.transport.respond_json(200, json!({"user": {"id": "u2", "email": "c@d.com"}}));

        let user = harness.ctx.invoke(&GetProfile, ()).await.unwrap();
        assert_eq!(user.id, "u2");
    }

    #[tokio::test]
    async fn test_delete_account_request() {
        let harness = TestHarness::new();
        harness.transport.respond_json(200, json!({"message": "Account removed"}));

        let ack = harness.ctx.invoke(&DeleteAccount, "secret".to_string()).await.unwrap();

        assert_eq!(ack.message, "Account removed");
        assert_eq!(harness.transport.last_request().unwrap().method, HttpMethod::Delete);
    }
}
