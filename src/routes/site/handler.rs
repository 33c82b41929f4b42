use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{TypedHeader, extract::cookie::PrivateCookieJar, headers::Host};

use crate::{
    AppState,
    error::AppError,
    models::{Category, Client, Contact, LATEST_LIMIT, Project, Storie},
    routes::render,
    utils::{
        flash::{self, FlashCategory},
        validation_error_response,
    },
};

use super::model::{
    ContactForm, HomePage, SiteContext, render_sitemap, robots_txt, sitemap_urls, subject_choices,
};

async fn site_context(state: &AppState) -> Result<SiteContext, AppError> {
    Ok(SiteContext {
        site_name: state.config.site_name.clone(),
        phone_number: state.config.phone_number.clone(),
        phone_number_two: state.config.phone_number_two.clone(),
        categories: Category::list(&state.pool).await?,
        projects: Project::latest(&state.pool, LATEST_LIMIT).await?,
        clients: Client::latest(&state.pool, LATEST_LIMIT).await?,
        stories: Storie::latest(&state.pool, LATEST_LIMIT).await?,
    })
}

pub async fn home(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let page = HomePage {
        site: site_context(&state).await?,
        subjects: subject_choices(),
    };
    Ok(render(jar, format!("{} - Accueil", state.config.site_name), page))
}

/// 首页联系表单提交
pub async fn submit_contact(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let new_contact = match form.validate() {
        Ok(contact) => contact,
        Err(errors) => return Ok(validation_error_response(errors).into_response()),
    };

    let contact = Contact::create(&state.pool, new_contact).await?;
    tracing::info!("Stored contact message {}", contact.id);

    let jar = flash::push(
        jar,
        FlashCategory::Success,
        format!(
            "Hey {}, votre message a été envoyé avec succès. \
             Nous vous contacterons dans un bref délai.",
            contact.fullname
        ),
    );
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn about(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    Ok(render(jar, "Qui sommes-nous", site_context(&state).await?))
}

pub async fn services(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    Ok(render(jar, "Nos Prestations", site_context(&state).await?))
}

pub async fn sitemap(
    TypedHeader(host): TypedHeader<Host>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    let host_base = format!("{}://{}", scheme, host);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        render_sitemap(&sitemap_urls(&host_base)),
    )
}

pub async fn robots() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(),
    )
}
