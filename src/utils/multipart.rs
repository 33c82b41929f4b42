use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// 解析后的 multipart 表单：普通文本字段 + 可选的图片文件
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub image: Option<UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == file_field {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // 浏览器未选择文件时会提交一个空的文件字段
                if !filename.is_empty() && !bytes.is_empty() {
                    form.image = Some(UploadedFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }
}
