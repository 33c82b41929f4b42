use serde::{Deserialize, Serialize};

use crate::models::{Role, User};
use crate::utils::validation::{self, FieldErrors};

/// users.email 列宽
pub const EMAIL_MAX: usize = 80;
const EMAIL_LENGTH_MESSAGE: &str = "L'adresse email ne doit pas dépasser 80 caractères.";
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 18;
const WEAK_PASSWORD_MESSAGE: &str = "Choisissez un mot de passe plus fort.";
const PASSWORD_MISMATCH_MESSAGE: &str = "Les deux mots de passe ne correspondent pas.";

pub fn email_taken_message(email: &str) -> String {
    format!(
        "Cet adresse '{}' est déjà utilisé. Veuillez choisir un autre nom !",
        email.trim().to_lowercase()
    )
}

pub fn unknown_email_message(email: &str) -> String {
    format!(
        "Il n'y a pas de compte avec cet email '{}'. Veuillez-vous inscrire.",
        email.trim().to_lowercase()
    )
}

/// 重置链接的站内路径
pub fn reset_password_path(token: &str) -> String {
    format!("/admin/reset/password/{}", token)
}

fn check_email(errors: &mut FieldErrors, value: &str) {
    if validation::required(errors, "email", value)
        && validation::length(errors, "email", value.trim(), 1, EMAIL_MAX, EMAIL_LENGTH_MESSAGE)
    {
        validation::email(errors, "email", value);
    }
}

/// 新密码 + 确认密码，注册和重置共用
fn check_new_password(errors: &mut FieldErrors, password: &str, confirm_password: &str) {
    if password.is_empty() {
        errors.add("password", validation::REQUIRED_MESSAGE);
    } else {
        validation::length(
            errors,
            "password",
            password,
            PASSWORD_MIN,
            PASSWORD_MAX,
            WEAK_PASSWORD_MESSAGE,
        );
    }
    if confirm_password.is_empty() {
        errors.add("confirm_password", validation::REQUIRED_MESSAGE);
    } else {
        validation::equal_to(
            errors,
            "confirm_password",
            confirm_password,
            password,
            PASSWORD_MISMATCH_MESSAGE,
        );
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Mot de passe incorrecte !");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegistrationForm {
    /// 只做格式校验；邮箱是否已被占用由调用方查库后补充
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        check_new_password(&mut errors, &self.password, &self.confirm_password);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl UpdateProfileForm {
    /// 返回解析出的角色ID；角色是否存在由调用方校验
    pub fn validate(&self) -> (Option<i32>, FieldErrors) {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        let role_id = self.role.trim().parse::<i32>().ok();
        if role_id.is_none() {
            errors.add("role", "Choisissez un rôle valide.");
        }
        (role_id, errors)
    }

    /// 邮箱未改动时不做唯一性检查
    pub fn email_changed(&self, current: &User) -> bool {
        self.email.trim().to_lowercase() != current.email
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_new_password(&mut errors, &self.password, &self.confirm_password);
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub user: User,
    pub gravatar: String,
}

#[derive(Debug, Serialize)]
pub struct AccountPage {
    pub user: User,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordPage {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert!(errors.has("email"));
        assert_eq!(errors.get("password"), Some(&["Mot de passe incorrecte !".to_string()][..]));

        let form = LoginForm {
            email: "admin@example.com".into(),
            password: "x".into(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn registration_checks_password_strength_and_confirmation() {
        let form = RegistrationForm {
            email: "new@example.com".into(),
            password: "abc".into(),
            confirm_password: "abd".into(),
        };
        let errors = form.validate();
        assert_eq!(errors.get("password"), Some(&[WEAK_PASSWORD_MESSAGE.to_string()][..]));
        assert_eq!(
            errors.get("confirm_password"),
            Some(&[PASSWORD_MISMATCH_MESSAGE.to_string()][..])
        );
        assert!(!errors.has("email"));
    }

    #[test]
    fn registration_accepts_matching_passwords() {
        let form = RegistrationForm {
            email: "new@example.com".into(),
            password: "secret12".into(),
            confirm_password: "secret12".into(),
        };
        assert!(form.validate().is_empty());

        let too_long = RegistrationForm {
            password: "a".repeat(19),
            confirm_password: "a".repeat(19),
            ..form
        };
        assert!(too_long.validate().has("password"));
    }

    #[test]
    fn update_profile_parses_role() {
        let form = UpdateProfileForm {
            email: "admin@example.com".into(),
            role: "2".into(),
        };
        let (role_id, errors) = form.validate();
        assert_eq!(role_id, Some(2));
        assert!(errors.is_empty());

        let form = UpdateProfileForm {
            email: "admin@example.com".into(),
            role: "admin".into(),
        };
        let (role_id, errors) = form.validate();
        assert_eq!(role_id, None);
        assert!(errors.has("role"));
    }

    // 本地部分 30 字符，其余长度放在域名标签里
    fn email_of_len(len: usize) -> String {
        format!("{}@{}.com", "a".repeat(30), "b".repeat(len - 35))
    }

    #[test]
    fn email_longer_than_column_is_rejected() {
        let form = RegistrationForm {
            email: email_of_len(EMAIL_MAX + 1),
            password: "secret12".into(),
            confirm_password: "secret12".into(),
        };
        let errors = form.validate();
        assert_eq!(errors.get("email"), Some(&[EMAIL_LENGTH_MESSAGE.to_string()][..]));

        let form = RegistrationForm {
            email: email_of_len(EMAIL_MAX),
            ..form
        };
        assert!(form.validate().is_empty());
    }

    #[test]
    fn profile_update_checks_email_width() {
        let form = UpdateProfileForm {
            email: email_of_len(95),
            role: "1".into(),
        };
        let (_, errors) = form.validate();
        assert!(errors.has("email"));
        assert!(ForgotPasswordForm { email: email_of_len(95) }.validate().has("email"));
    }

    #[test]
    fn reset_path_matches_route() {
        assert_eq!(reset_password_path("tok"), "/admin/reset/password/tok");
    }

    #[test]
    fn messages_use_lowercased_email() {
        assert!(email_taken_message(" Foo@Bar.com").contains("'foo@bar.com'"));
        assert!(unknown_email_message("Foo@Bar.com").contains("'foo@bar.com'"));
    }
}
