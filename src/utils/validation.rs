//! 表单字段校验
//!
//! 每个表单在 `validate()` 中按字段调用这里的检查函数，
//! 错误按字段名收集后整体返回给提交者。

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// 无错误时返回 Ok(())
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

pub const REQUIRED_MESSAGE: &str = "Ce champ est obligatoire.";
pub const EMAIL_MESSAGE: &str = "Entrer une adresse email valide.";

/// 必填字段（只含空白也视为空）
pub fn required(errors: &mut FieldErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED_MESSAGE);
        false
    } else {
        true
    }
}

pub fn length(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    message: &str,
) -> bool {
    let len = value.chars().count();
    if len < min || len > max {
        errors.add(field, message);
        false
    } else {
        true
    }
}

pub fn email(errors: &mut FieldErrors, field: &'static str, value: &str) -> bool {
    if value.trim().parse::<lettre::Address>().is_err() {
        errors.add(field, EMAIL_MESSAGE);
        false
    } else {
        true
    }
}

pub fn equal_to(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    other: &str,
    message: &str,
) -> bool {
    if value != other {
        errors.add(field, message);
        false
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_errors_per_field() {
        let mut errors = FieldErrors::new();
        required(&mut errors, "email", "  ");
        email(&mut errors, "email", "not-an-email");
        length(&mut errors, "password", "abc", 6, 18, "too short");

        assert_eq!(errors.get("email").map(<[String]>::len), Some(2));
        assert!(errors.has("password"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn valid_values_pass() {
        let mut errors = FieldErrors::new();
        assert!(required(&mut errors, "email", "a@b.com"));
        assert!(email(&mut errors, "email", "a@b.com"));
        assert!(length(&mut errors, "password", "secret1", 6, 18, "x"));
        assert!(equal_to(&mut errors, "confirm_password", "secret1", "secret1", "x"));
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        assert!(length(&mut errors, "fullname", "Zoé", 3, 3, "x"));
    }
}
