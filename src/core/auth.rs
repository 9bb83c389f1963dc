//! Form-driven authentication against the relay auth webhooks.

use crate::core::quota::User;
use crate::core::relay::{RelayClient, RelayError, WireUser};
use crate::core::settings::{FREE_PLAN_ID, Settings};

/// Client-side form validation. Nothing is sent while a form is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Enter a valid email address")]
    InvalidEmail,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

fn valid_email(email: &str) -> Result<(), ValidationError> {
    required(email, "Email")?;
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail),
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        valid_email(&self.email)?;
        required(&self.password, "Password")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required(&self.name, "Name")?;
        valid_email(&self.email)?;
        required(&self.password, "Password")
    }
}

/// Build the local user record. Fields the relay omits come from settings: the free
/// plan, zero usage, and the plan's configured limit.
pub fn user_from_wire(wire: WireUser, settings: &Settings) -> User {
    let plan = wire
        .plan
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| FREE_PLAN_ID.to_string());
    let message_limit = wire
        .message_limit
        .filter(|&limit| limit > 0)
        .unwrap_or_else(|| settings.limit_for(&plan));
    let name = if wire.name.trim().is_empty() {
        wire.email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        wire.name
    };
    User {
        id: wire.id,
        email: wire.email,
        name,
        plan,
        messages_used: wire.messages_used.unwrap_or(0),
        message_limit,
    }
}

pub async fn login(
    client: &RelayClient,
    form: &LoginForm,
    settings: &Settings,
) -> Result<User, AuthError> {
    form.validate()?;
    let wire = client.login(form.email.trim(), &form.password).await?;
    log::info!("Signed in as {}", wire.email);
    Ok(user_from_wire(wire, settings))
}

pub async fn register(
    client: &RelayClient,
    form: &RegisterForm,
    settings: &Settings,
) -> Result<User, AuthError> {
    form.validate()?;
    let wire = client
        .register(form.name.trim(), form.email.trim(), &form.password)
        .await?;
    log::info!("Registered {}", wire.email);
    Ok(user_from_wire(wire, settings))
}

/// Ask the relay to send a reset link. Returns the confirmation to show the user.
pub async fn reset_password(client: &RelayClient, email: &str) -> Result<String, AuthError> {
    valid_email(email)?;
    Ok(client.reset_password(email.trim()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{self, Config};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn wire(plan: Option<&str>, limit: Option<u32>) -> WireUser {
        WireUser {
            id: "u1".to_string(),
            email: "dana@example.com".to_string(),
            name: String::new(),
            plan: plan.map(str::to_string),
            messages_used: None,
            message_limit: limit,
        }
    }

    #[test]
    fn login_form_requires_fields() {
        let form = LoginForm {
            email: " ".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(form.validate(), Err(ValidationError::Missing("Email")));
        let form = LoginForm {
            email: "a@example.com".to_string(),
            password: String::new(),
        };
        assert_eq!(form.validate(), Err(ValidationError::Missing("Password")));
        let form = LoginForm {
            email: "not-an-email".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(form.validate(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn register_form_requires_name() {
        let form = RegisterForm {
            name: String::new(),
            email: "a@example.com".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Name is required"
        );
    }

    #[test]
    fn wire_user_defaults_from_settings() {
        let settings = Settings::default();
        let user = user_from_wire(wire(None, None), &settings);
        assert_eq!(user.plan, FREE_PLAN_ID);
        assert_eq!(user.message_limit, settings.limit_for(FREE_PLAN_ID));
        assert_eq!(user.messages_used, 0);
        assert_eq!(user.name, "dana");

        let user = user_from_wire(wire(Some("pro"), Some(0)), &settings);
        assert_eq!(user.message_limit, settings.limit_for("pro"));
        let user = user_from_wire(wire(Some("pro"), Some(5)), &settings);
        assert_eq!(user.message_limit, 5);
    }

    #[tokio::test]
    async fn invalid_form_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let client =
            RelayClient::new(&Config::with_base(config::parse_base(&server.uri()).unwrap()))
                .unwrap();
        let err = login(&client, &LoginForm::default(), &Settings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn register_builds_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"user":{"id":"u9","email":"new@example.com","name":"New"}}"#,
            ))
            .mount(&server)
            .await;
        let client =
            RelayClient::new(&Config::with_base(config::parse_base(&server.uri()).unwrap()))
                .unwrap();
        let form = RegisterForm {
            name: "New".to_string(),
            email: "new@example.com".to_string(),
            password: "pw".to_string(),
        };
        let user = register(&client, &form, &Settings::default()).await.unwrap();
        assert_eq!(user.id, "u9");
        assert_eq!(user.plan, FREE_PLAN_ID);
        assert!(user.check_quota().is_allowed());
    }
}
