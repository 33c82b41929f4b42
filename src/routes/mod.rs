use axum::Json;
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Serialize;

use crate::utils::{
    ApiResponse,
    flash::{self, FlashMessage},
    success_to_api_response,
};

pub mod admin;
pub mod content;
pub mod site;

/// 页面视图模型：标题 + 待展示的闪现消息 + 页面数据
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub page_title: String,
    pub flashes: Vec<FlashMessage>,
    pub data: T,
}

/// 渲染页面时顺带取出闪现消息
pub fn render<T: Serialize>(
    jar: PrivateCookieJar,
    page_title: impl Into<String>,
    data: T,
) -> (PrivateCookieJar, Json<ApiResponse<Page<T>>>) {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        success_to_api_response(Page {
            page_title: page_title.into(),
            flashes,
            data,
        }),
    )
}
