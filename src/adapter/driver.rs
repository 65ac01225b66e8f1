// 駆動する側アダプター（REST API）

pub mod current_user;
pub mod request_dto;
pub mod response_dto;
pub mod rest_api;

pub use current_user::{AdminUser, CurrentUser, ADMIN_ROLE, USER_ID_HEADER, USER_ROLE_HEADER};
pub use rest_api::{create_router, AppState};
