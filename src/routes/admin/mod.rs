mod handler;
mod model;

pub use handler::{
    DASHBOARD_PATH, REGISTER_PATH, RESET_REQUEST_PATH, UPDATE_PATH, dashboard, login, login_page,
    logout, register, register_page, reset_password, reset_password_page, reset_request,
    reset_request_page, update_account, update_page,
};
