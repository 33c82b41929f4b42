use serde::Serialize;

use crate::models::{Category, Client, Contact, Project, Storie};
use crate::utils::{
    multipart::{MultipartForm, UploadedFile},
    upload::allowed_file,
    validation::{self, FieldErrors},
};

/// 表单中图片文件字段名
pub const IMAGE_FIELD: &str = "image";
pub const IMAGE_TYPE_MESSAGE: &str = "Seules les images png, jpg et jpeg sont acceptées.";

/// 校验图片：新建时必填，更新时可选；有文件就必须是允许的类型
pub fn check_image(errors: &mut FieldErrors, image: Option<&UploadedFile>, required: bool) {
    match image {
        None if required => errors.add(IMAGE_FIELD, validation::REQUIRED_MESSAGE),
        Some(file) if !allowed_file(&file.filename) => errors.add(IMAGE_FIELD, IMAGE_TYPE_MESSAGE),
        _ => {}
    }
}

// 与表结构的列宽一致
pub const PROJECT_NAME_MAX: usize = 80;
pub const STORIE_FULLNAME_MAX: usize = 100;
pub const STORIE_STATUS_MAX: usize = 80;
pub const PARTNER_NAME_MAX: usize = 100;

/// 必填且不超过列宽
fn bounded_text(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if validation::required(errors, field, value) {
        let message = format!("Ce champ ne doit pas dépasser {} caractères.", max);
        validation::length(errors, field, value.trim(), 1, max, &message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInput {
    pub name: String,
    pub category_id: Option<i32>,
}

impl ProjectInput {
    pub fn from_form(form: &MultipartForm) -> (Self, FieldErrors) {
        let mut errors = FieldErrors::new();
        let name = form.text("name");
        bounded_text(&mut errors, "name", &name, PROJECT_NAME_MAX);

        let category_id = form.text("category").trim().parse::<i32>().ok();
        if category_id.is_none() {
            errors.add("category", "Choisissez une catégorie valide.");
        }

        let input = ProjectInput {
            name: name.trim().to_string(),
            category_id,
        };
        (input, errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorieInput {
    pub fullname: String,
    pub status: String,
    pub content: String,
}

impl StorieInput {
    pub fn from_form(form: &MultipartForm) -> (Self, FieldErrors) {
        let mut errors = FieldErrors::new();
        let fullname = form.text("fullname");
        let status = form.text("status");
        let content = form.text("content");
        bounded_text(&mut errors, "fullname", &fullname, STORIE_FULLNAME_MAX);
        bounded_text(&mut errors, "status", &status, STORIE_STATUS_MAX);
        validation::required(&mut errors, "content", &content);

        let input = StorieInput {
            fullname: fullname.trim().to_string(),
            status: status.trim().to_string(),
            content: content.trim().to_string(),
        };
        (input, errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInput {
    pub name: String,
}

impl ClientInput {
    pub fn from_form(form: &MultipartForm) -> (Self, FieldErrors) {
        let mut errors = FieldErrors::new();
        let name = form.text("name");
        bounded_text(&mut errors, "name", &name, PARTNER_NAME_MAX);
        (
            ClientInput {
                name: name.trim().to_string(),
            },
            errors,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectsPage {
    pub categories: Vec<Category>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct StoriesPage {
    pub stories: Vec<Storie>,
}

#[derive(Debug, Serialize)]
pub struct PartnersPage {
    pub clients: Vec<Client>,
}

#[derive(Debug, Serialize)]
pub struct ContactsPage {
    pub contacts: Vec<Contact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)], image: Option<&str>) -> MultipartForm {
        MultipartForm {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image: image.map(|name| UploadedFile {
                filename: name.to_string(),
                bytes: vec![1, 2, 3],
            }),
        }
    }

    #[test]
    fn project_needs_name_category_and_image() {
        let form = form(&[("name", "  "), ("category", "web")], None);
        let (_, mut errors) = ProjectInput::from_form(&form);
        check_image(&mut errors, form.image.as_ref(), true);
        assert!(errors.has("name"));
        assert!(errors.has("category"));
        assert!(errors.has(IMAGE_FIELD));
    }

    #[test]
    fn gif_is_rejected_even_when_optional() {
        let form = form(&[("name", "Acme")], Some("logo.gif"));
        let (input, mut errors) = ClientInput::from_form(&form);
        check_image(&mut errors, form.image.as_ref(), false);
        assert_eq!(input.name, "Acme");
        assert_eq!(errors.get(IMAGE_FIELD), Some(&[IMAGE_TYPE_MESSAGE.to_string()][..]));
    }

    #[test]
    fn missing_image_is_fine_on_update() {
        let form = form(
            &[("fullname", "Awa"), ("status", "CEO"), ("content", "Top")],
            None,
        );
        let (input, mut errors) = StorieInput::from_form(&form);
        check_image(&mut errors, form.image.as_ref(), false);
        assert!(errors.is_empty());
        assert_eq!(input.status, "CEO");
    }

    #[test]
    fn text_fields_respect_column_widths() {
        let at_limit = "p".repeat(PROJECT_NAME_MAX);
        let form_ok = form(&[("name", at_limit.as_str()), ("category", "1")], Some("a.png"));
        assert!(ProjectInput::from_form(&form_ok).1.is_empty());

        let over = "p".repeat(PROJECT_NAME_MAX + 1);
        let form_over = form(&[("name", over.as_str()), ("category", "1")], Some("a.png"));
        assert!(ProjectInput::from_form(&form_over).1.has("name"));

        let fullname = "f".repeat(STORIE_FULLNAME_MAX + 1);
        let status = "s".repeat(STORIE_STATUS_MAX);
        let storie = form(
            &[("fullname", fullname.as_str()), ("status", status.as_str()), ("content", "Top")],
            None,
        );
        let (_, errors) = StorieInput::from_form(&storie);
        assert!(errors.has("fullname"));
        assert!(!errors.has("status"));

        let partner_ok = "n".repeat(PARTNER_NAME_MAX);
        assert!(ClientInput::from_form(&form(&[("name", partner_ok.as_str())], None)).1.is_empty());
        let partner_over = "n".repeat(PARTNER_NAME_MAX + 1);
        let (_, errors) = ClientInput::from_form(&form(&[("name", partner_over.as_str())], None));
        assert!(errors.has("name"));
    }

    #[test]
    fn valid_project_input() {
        let form = form(&[("name", " Site vitrine "), ("category", "3")], Some("shot.JPG"));
        let (input, mut errors) = ProjectInput::from_form(&form);
        check_image(&mut errors, form.image.as_ref(), true);
        assert!(errors.is_empty());
        assert_eq!(
            input,
            ProjectInput {
                name: "Site vitrine".into(),
                category_id: Some(3),
            }
        );
    }
}
