use axum::{
    Extension,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    models::{
        Category, Client, Contact, Project, Storie,
        client::{ClientChanges, NewClient},
        project::{NewProject, ProjectChanges},
        storie::{NewStorie, StorieChanges},
    },
    routes::render,
    utils::{
        flash::{self, FlashCategory},
        multipart::{MultipartForm, UploadedFile},
        validation::FieldErrors,
        validation_error_response,
    },
};

use super::model::{
    ClientInput, ContactsPage, IMAGE_FIELD, IMAGE_TYPE_MESSAGE, PartnersPage, ProjectInput,
    ProjectsPage, StorieInput, StoriesPage, check_image,
};

pub const PROJECT_PATH: &str = "/admin/edit/project";
pub const STORIE_PATH: &str = "/admin/add/storie";
pub const PARTNER_PATH: &str = "/admin/add/partner";
pub const CONTACTS_PATH: &str = "/admin/contacts";

/// 后台列表页展示的最大条数
const ADMIN_LIST_LIMIT: i64 = 200;
const UNKNOWN_CATEGORY_MESSAGE: &str = "Choisissez une catégorie valide.";
const DUPLICATE_PROJECT_MESSAGE: &str = "Un projet porte déjà ce nom.";
const WRITE_FAILED_MESSAGE: &str = "L'élément n'a pas pu être enregistré.";

/// 保存上传图片，返回生成的文件名
async fn save_image(state: &AppState, file: &UploadedFile) -> Result<String, AppError> {
    match state.uploads.save(&file.filename, &file.bytes).await? {
        Some(filename) => Ok(filename),
        None => {
            let mut errors = FieldErrors::new();
            errors.add(IMAGE_FIELD, IMAGE_TYPE_MESSAGE);
            Err(AppError::Validation(errors))
        }
    }
}

async fn save_optional_image(
    state: &AppState,
    file: Option<&UploadedFile>,
) -> Result<Option<String>, AppError> {
    match file {
        Some(file) => save_image(state, file).await.map(Some),
        None => Ok(None),
    }
}

/// 删除图片文件，失败只记日志
async fn discard_image(state: &AppState, filename: &str) {
    if let Err(e) = state.uploads.remove(filename).await {
        tracing::warn!("Failed to remove upload {}: {}", filename, e);
    }
}

/// 写库失败：清理刚保存的图片；冲突类错误转为提示并跳回
async fn write_failed(
    state: &AppState,
    jar: PrivateCookieJar,
    err: sqlx::Error,
    saved_image: Option<&str>,
    conflict_message: &str,
    back_to: &str,
) -> Result<Response, AppError> {
    if let Some(filename) = saved_image {
        discard_image(state, filename).await;
    }
    match AppError::from_write(err, conflict_message) {
        AppError::Conflict(msg) => {
            let jar = flash::push(jar, FlashCategory::Danger, msg);
            Ok((jar, Redirect::to(back_to)).into_response())
        }
        other => Err(other),
    }
}

fn done(jar: PrivateCookieJar, message: &str, back_to: &str) -> Response {
    let jar = flash::push(jar, FlashCategory::Success, message);
    (jar, Redirect::to(back_to)).into_response()
}

async fn check_category(
    state: &AppState,
    errors: &mut FieldErrors,
    category_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(id) = category_id {
        if Category::find_by_id(&state.pool, id).await?.is_none() {
            errors.add("category", UNKNOWN_CATEGORY_MESSAGE);
        }
    }
    Ok(())
}

// 项目

pub async fn projects_page(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let page = ProjectsPage {
        categories: Category::list(&state.pool).await?,
        projects: Project::latest(&state.pool, ADMIN_LIST_LIMIT).await?,
    };
    Ok(render(jar, "Ajouter un projet réalisé", page))
}

#[axum::debug_handler(state = AppState)]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = MultipartForm::read(multipart, IMAGE_FIELD).await?;
    let (input, mut errors) = ProjectInput::from_form(&form);
    check_image(&mut errors, form.image.as_ref(), true);
    check_category(&state, &mut errors, input.category_id).await?;

    let (Some(category_id), Some(file), true) =
        (input.category_id, form.image.as_ref(), errors.is_empty())
    else {
        return Ok(validation_error_response(errors).into_response());
    };

    let image = save_image(&state, file).await?;
    let new_project = NewProject {
        name: input.name,
        image: image.clone(),
        category_id,
        user_id: user.id,
    };
    match Project::create(&state.pool, new_project).await {
        Ok(project) => {
            tracing::info!("User {} added project {}", user.id, project.id);
            Ok(done(jar, "Projet ajouté avec succès !", PROJECT_PATH))
        }
        Err(e) => {
            let image = Some(image.as_str());
            write_failed(&state, jar, e, image, DUPLICATE_PROJECT_MESSAGE, PROJECT_PATH).await
        }
    }
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let existing = Project::find_by_id(&state.pool, id).await?.ok_or(AppError::NotFound)?;

    let form = MultipartForm::read(multipart, IMAGE_FIELD).await?;
    let (input, mut errors) = ProjectInput::from_form(&form);
    check_image(&mut errors, form.image.as_ref(), false);
    check_category(&state, &mut errors, input.category_id).await?;

    let (Some(category_id), true) = (input.category_id, errors.is_empty()) else {
        return Ok(validation_error_response(errors).into_response());
    };

    let image = save_optional_image(&state, form.image.as_ref()).await?;
    let changes = ProjectChanges {
        name: input.name,
        category_id,
        image: image.clone(),
    };
    match Project::update(&state.pool, id, changes).await {
        Ok(Some(_)) => {
            if image.is_some() {
                discard_image(&state, &existing.image).await;
            }
            Ok(done(jar, "Projet mis à jour avec succès !", PROJECT_PATH))
        }
        Ok(None) => {
            if let Some(filename) = &image {
                discard_image(&state, filename).await;
            }
            Err(AppError::NotFound)
        }
        Err(e) => {
            let image = image.as_deref();
            write_failed(&state, jar, e, image, DUPLICATE_PROJECT_MESSAGE, PROJECT_PATH).await
        }
    }
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: PrivateCookieJar,
) -> Result<Response, AppError> {
    let project = Project::delete(&state.pool, id).await?.ok_or(AppError::NotFound)?;
    discard_image(&state, &project.image).await;
    tracing::info!("Deleted project {}", project.id);
    Ok(done(jar, "Projet supprimé avec succès !", PROJECT_PATH))
}

// 评价

pub async fn stories_page(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let page = StoriesPage {
        stories: Storie::latest(&state.pool, ADMIN_LIST_LIMIT).await?,
    };
    Ok(render(jar, "Ajouter un témoignage", page))
}

#[axum::debug_handler(state = AppState)]
pub async fn create_storie(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = MultipartForm::read(multipart, IMAGE_FIELD).await?;
    let (input, mut errors) = StorieInput::from_form(&form);
    check_image(&mut errors, form.image.as_ref(), true);

    let (Some(file), true) = (form.image.as_ref(), errors.is_empty()) else {
        return Ok(validation_error_response(errors).into_response());
    };

    let image = save_image(&state, file).await?;
    let new_storie = NewStorie {
        fullname: input.fullname,
        status: input.status,
        content: input.content,
        image: image.clone(),
        user_id: user.id,
    };
    match Storie::create(&state.pool, new_storie).await {
        Ok(storie) => {
            tracing::info!("User {} added storie {}", user.id, storie.id);
            Ok(done(jar, "Témoignage ajouté avec succès !", STORIE_PATH))
        }
        Err(e) => {
            write_failed(&state, jar, e, Some(&image), WRITE_FAILED_MESSAGE, STORIE_PATH).await
        }
    }
}

pub async fn update_storie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let existing = Storie::find_by_id(&state.pool, id).await?.ok_or(AppError::NotFound)?;

    let form = MultipartForm::read(multipart, IMAGE_FIELD).await?;
    let (input, mut errors) = StorieInput::from_form(&form);
    check_image(&mut errors, form.image.as_ref(), false);
    if !errors.is_empty() {
        return Ok(validation_error_response(errors).into_response());
    }

    let image = save_optional_image(&state, form.image.as_ref()).await?;
    let changes = StorieChanges {
        fullname: input.fullname,
        status: input.status,
        content: input.content,
        image: image.clone(),
    };
    match Storie::update(&state.pool, id, changes).await {
        Ok(Some(_)) => {
            if image.is_some() {
                discard_image(&state, &existing.image).await;
            }
            Ok(done(jar, "Témoignage mis à jour avec succès !", STORIE_PATH))
        }
        Ok(None) => {
            if let Some(filename) = &image {
                discard_image(&state, filename).await;
            }
            Err(AppError::NotFound)
        }
        Err(e) => {
            write_failed(&state, jar, e, image.as_deref(), WRITE_FAILED_MESSAGE, STORIE_PATH).await
        }
    }
}

pub async fn delete_storie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: PrivateCookieJar,
) -> Result<Response, AppError> {
    let storie = Storie::delete(&state.pool, id).await?.ok_or(AppError::NotFound)?;
    discard_image(&state, &storie.image).await;
    tracing::info!("Deleted storie {}", storie.id);
    Ok(done(jar, "Témoignage supprimé avec succès !", STORIE_PATH))
}

// 合作伙伴

pub async fn partners_page(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let page = PartnersPage {
        clients: Client::latest(&state.pool, ADMIN_LIST_LIMIT).await?,
    };
    Ok(render(jar, "Ajouter un partenaire", page))
}

#[axum::debug_handler(state = AppState)]
pub async fn create_partner(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = MultipartForm::read(multipart, IMAGE_FIELD).await?;
    let (input, mut errors) = ClientInput::from_form(&form);
    check_image(&mut errors, form.image.as_ref(), true);

    let (Some(file), true) = (form.image.as_ref(), errors.is_empty()) else {
        return Ok(validation_error_response(errors).into_response());
    };

    let image = save_image(&state, file).await?;
    let new_client = NewClient {
        name: input.name,
        image: image.clone(),
        user_id: user.id,
    };
    match Client::create(&state.pool, new_client).await {
        Ok(client) => {
            tracing::info!("User {} added partner {}", user.id, client.id);
            Ok(done(jar, "Partenaire ajouté avec succès !", PARTNER_PATH))
        }
        Err(e) => {
            write_failed(&state, jar, e, Some(&image), WRITE_FAILED_MESSAGE, PARTNER_PATH).await
        }
    }
}

pub async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let existing = Client::find_by_id(&state.pool, id).await?.ok_or(AppError::NotFound)?;

    let form = MultipartForm::read(multipart, IMAGE_FIELD).await?;
    let (input, mut errors) = ClientInput::from_form(&form);
    check_image(&mut errors, form.image.as_ref(), false);
    if !errors.is_empty() {
        return Ok(validation_error_response(errors).into_response());
    }

    let image = save_optional_image(&state, form.image.as_ref()).await?;
    let changes = ClientChanges {
        name: input.name,
        image: image.clone(),
    };
    match Client::update(&state.pool, id, changes).await {
        Ok(Some(_)) => {
            if image.is_some() {
                discard_image(&state, &existing.image).await;
            }
            Ok(done(jar, "Partenaire mis à jour avec succès !", PARTNER_PATH))
        }
        Ok(None) => {
            if let Some(filename) = &image {
                discard_image(&state, filename).await;
            }
            Err(AppError::NotFound)
        }
        Err(e) => {
            write_failed(&state, jar, e, image.as_deref(), WRITE_FAILED_MESSAGE, PARTNER_PATH).await
        }
    }
}

pub async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: PrivateCookieJar,
) -> Result<Response, AppError> {
    let client = Client::delete(&state.pool, id).await?.ok_or(AppError::NotFound)?;
    discard_image(&state, &client.image).await;
    tracing::info!("Deleted partner {}", client.id);
    Ok(done(jar, "Partenaire supprimé avec succès !", PARTNER_PATH))
}

// 联系消息

pub async fn contacts_page(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let page = ContactsPage {
        contacts: Contact::latest(&state.pool, ADMIN_LIST_LIMIT).await?,
    };
    Ok(render(jar, "Messages reçus", page))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: PrivateCookieJar,
) -> Result<Response, AppError> {
    if !Contact::delete(&state.pool, id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!("Deleted contact message {}", id);
    Ok(done(jar, "Message supprimé avec succès !", CONTACTS_PATH))
}
