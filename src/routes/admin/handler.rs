use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;

use crate::{
    AppState,
    error::AppError,
    mail::reset_password_email,
    middleware::{
        AuthUser, CurrentUser,
        auth::{LOGIN_PATH, end_session, start_session},
    },
    models::{Role, User},
    routes::render,
    utils::{
        flash::{self, FlashCategory},
        validation_error_response,
    },
};

use super::model::{
    AccountPage, DashboardPage, ForgotPasswordForm, LoginForm, RegistrationForm,
    ResetPasswordForm, ResetPasswordPage, UpdateProfileForm, email_taken_message,
    reset_password_path, unknown_email_message,
};

pub const DASHBOARD_PATH: &str = "/admin/dashboard";
pub const REGISTER_PATH: &str = "/admin/register";
pub const UPDATE_PATH: &str = "/admin/update";
pub const RESET_REQUEST_PATH: &str = "/admin/reset/password/request";

const INVALID_CREDENTIALS_MESSAGE: &str = "Combinaison nom d'utilisateur/mot de passe invalide.";
const INVALID_TOKEN_MESSAGE: &str = "Ce jeton est invalide ou a expiré.";

#[axum::debug_handler(state = AppState)]
pub async fn dashboard(
    Extension(AuthUser(user)): Extension<AuthUser>,
    jar: PrivateCookieJar,
) -> impl IntoResponse {
    let gravatar = user.gravatar(256);
    render(jar, "Tableau de board", DashboardPage { user, gravatar })
}

pub async fn login_page(current: CurrentUser, jar: PrivateCookieJar) -> Response {
    if current.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    render(jar, "Connexion", ()).into_response()
}

#[axum::debug_handler(state = AppState)]
pub async fn login(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    if let Err(errors) = form.validate() {
        return Ok(validation_error_response(errors).into_response());
    }

    let user = User::find_by_email(&state.pool, &form.email).await?;
    let user = match user {
        Some(user) if user.verify_password(&form.password)? => user,
        _ => {
            tracing::info!("Failed login attempt for {}", form.email.trim().to_lowercase());
            let jar = flash::push(jar, FlashCategory::Danger, INVALID_CREDENTIALS_MESSAGE);
            return Ok((jar, Redirect::to(LOGIN_PATH)).into_response());
        }
    };

    let jar = start_session(&state, jar, user.id).await?;
    let jar = flash::push(
        jar,
        FlashCategory::Success,
        format!("Bienvenu ! Vous êtes connecté en tant que: {}", user.email),
    );
    tracing::info!("User {} logged in", user.id);
    Ok((jar, Redirect::to(DASHBOARD_PATH)).into_response())
}

pub async fn register_page(current: CurrentUser, jar: PrivateCookieJar) -> Response {
    if current.is_authenticated() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    render(jar, "Inscription", ()).into_response()
}

#[axum::debug_handler(state = AppState)]
pub async fn register(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    if current.is_authenticated() {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }

    let mut errors = form.validate();
    if !errors.has("email") && User::email_exists(&state.pool, &form.email).await? {
        errors.add("email", email_taken_message(&form.email));
    }
    if !errors.is_empty() {
        return Ok(validation_error_response(errors).into_response());
    }

    // 并发注册同一邮箱时由唯一约束兜底
    let user = match User::create(&state.pool, &state.config, &form.email, &form.password).await {
        Ok(user) => user,
        Err(e) => match e.into_conflict(&email_taken_message(&form.email)) {
            AppError::Conflict(msg) => {
                let jar = flash::push(jar, FlashCategory::Danger, msg);
                return Ok((jar, Redirect::to(REGISTER_PATH)).into_response());
            }
            other => return Err(other),
        },
    };

    let jar = flash::push(
        jar,
        FlashCategory::Success,
        format!(
            "Hey {}, votre compte a été créé ! Connectez-vous maintenant !",
            user.email
        ),
    );
    Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
}

pub async fn update_page(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let roles = Role::list(&state.pool).await?;
    Ok(render(jar, "Compte Administrateur", AccountPage { user, roles }))
}

#[axum::debug_handler(state = AppState)]
pub async fn update_account(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    jar: PrivateCookieJar,
    Form(form): Form<UpdateProfileForm>,
) -> Result<Response, AppError> {
    let (role_id, mut errors) = form.validate();

    if let Some(id) = role_id {
        if Role::find_by_id(&state.pool, id).await?.is_none() {
            errors.add("role", "Choisissez un rôle valide.");
        }
    }
    if !errors.has("email")
        && form.email_changed(&user)
        && User::email_exists(&state.pool, &form.email).await?
    {
        errors.add("email", email_taken_message(&form.email));
    }
    let role_id = match (role_id, errors.is_empty()) {
        (Some(id), true) => id,
        _ => return Ok(validation_error_response(errors).into_response()),
    };

    match User::update_profile(&state.pool, user.id, &form.email, role_id).await {
        Ok(updated) => {
            tracing::info!("User {} updated account (role {:?})", updated.id, updated.role_id);
            let jar = flash::push(
                jar,
                FlashCategory::Success,
                "Votre compte a été mise à jour avec succès.",
            );
            Ok((jar, Redirect::to(UPDATE_PATH)).into_response())
        }
        // 邮箱被抢占或角色已被删除
        Err(e) => match AppError::from_write(e, &email_taken_message(&form.email)) {
            AppError::Conflict(msg) => {
                let jar = flash::push(jar, FlashCategory::Danger, msg);
                Ok((jar, Redirect::to(UPDATE_PATH)).into_response())
            }
            other => Err(other),
        },
    }
}

pub async fn reset_request_page(current: CurrentUser, jar: PrivateCookieJar) -> Response {
    if current.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    render(jar, "Réinitialiser votre mot de passe", ()).into_response()
}

#[axum::debug_handler(state = AppState)]
pub async fn reset_request(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    if current.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut errors = form.validate();
    let user = if errors.is_empty() {
        User::find_by_email(&state.pool, &form.email).await?
    } else {
        None
    };
    let Some(user) = user else {
        if errors.is_empty() {
            errors.add("email", unknown_email_message(&form.email));
        }
        return Ok(validation_error_response(errors).into_response());
    };

    let token = user.get_reset_password_token(&state.config, Utc::now())?;
    let reset_url = state.config.public_url(&reset_password_path(&token));
    let email = reset_password_email(&state.config.mail, &user.email, &reset_url);
    // 发信失败只记录日志，页面提示保持一致
    if let Err(e) = state.mailer.send(&email).await {
        tracing::error!("Failed to send reset mail to user {}: {}", user.id, e);
    }

    let jar = flash::push(
        jar,
        FlashCategory::Info,
        "Un courriel a été envoyé avec les instructions pour réinitialiser votre mot de passe.",
    );
    Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
}

/// 令牌无效时的统一处理
fn invalid_token(jar: PrivateCookieJar) -> Response {
    let jar = flash::push(jar, FlashCategory::Warning, INVALID_TOKEN_MESSAGE);
    (jar, Redirect::to(RESET_REQUEST_PATH)).into_response()
}

pub async fn reset_password_page(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    if current.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    if User::verify_reset_password_token(&state.pool, &state.config, &token, Utc::now())
        .await?
        .is_none()
    {
        return Ok(invalid_token(jar));
    }
    Ok(render(jar, "Changer votre mot de passe", ResetPasswordPage { token }).into_response())
}

#[axum::debug_handler(state = AppState)]
pub async fn reset_password(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    if current.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    let Some(user) =
        User::verify_reset_password_token(&state.pool, &state.config, &token, Utc::now()).await?
    else {
        return Ok(invalid_token(jar));
    };
    if let Err(errors) = form.validate() {
        return Ok(validation_error_response(errors).into_response());
    }

    User::update_password(&state.pool, user.id, &form.password).await?;
    tracing::info!("User {} reset their password", user.id);

    let jar = flash::push(
        jar,
        FlashCategory::Success,
        "Votre mot de passe a été mise à jour avec succès !",
    );
    Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    jar: PrivateCookieJar,
) -> impl IntoResponse {
    let jar = end_session(&state, jar).await;
    tracing::info!("User {} logged out", user.id);
    (jar, Redirect::to("/"))
}
