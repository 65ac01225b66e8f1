use crate::adapter::driver::rest_api::ApiError;
use crate::domain::model::UserId;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Json,
};

/// 認証済みユーザーIDを運ぶヘッダー
/// 認証自体は前段のゲートウェイが行い、ここでは識別子の解決のみを行う
pub const USER_ID_HEADER: &str = "x-user-id";

/// ゲートウェイが付与するロールヘッダー
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// 管理操作に必要なロール
pub const ADMIN_ROLE: &str = "ADMIN";

/// 現在のユーザー（`X-User-Id`ヘッダーから解決）
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| UserId::from_string(value.trim()).ok())
            .map(CurrentUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ApiError::new(
                        "ユーザーを特定できません",
                        "UNAUTHENTICATED",
                    )),
                )
            })
    }
}

/// 管理者ユーザー
/// まずユーザーを解決し（できなければ401）、次にロールを確認する（管理者でなければ403）
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user_id) = CurrentUser::from_request_parts(parts, state).await?;

        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|role| role.trim() == ADMIN_ROLE);
        if !is_admin {
            tracing::warn!(user_id = %user_id, "admin operation rejected");
            return Err((
                StatusCode::FORBIDDEN,
                Json(ApiError::new("管理者権限が必要です", "FORBIDDEN")),
            ));
        }
        Ok(AdminUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CurrentUser, (StatusCode, Json<ApiError>)> {
        let (mut parts, _) = request.into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    async fn extract_admin(request: Request<()>) -> Result<AdminUser, (StatusCode, Json<ApiError>)> {
        let (mut parts, _) = request.into_parts();
        AdminUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header_resolves_user() {
        let user_id = UserId::new();
        let request = Request::builder()
            .header(USER_ID_HEADER, user_id.to_string())
            .body(())
            .unwrap();

        let CurrentUser(resolved) = extract(request).await.unwrap();
        assert_eq!(resolved, user_id);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        let (status, Json(error)) = extract(request).await.unwrap_err();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error.code, "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        let (status, _) = extract(request).await.unwrap_err();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_role_resolves_admin() {
        let user_id = UserId::new();
        let request = Request::builder()
            .header(USER_ID_HEADER, user_id.to_string())
            .header(USER_ROLE_HEADER, " ADMIN ")
            .body(())
            .unwrap();

        let AdminUser(resolved) = extract_admin(request).await.unwrap();
        assert_eq!(resolved, user_id);
    }

    #[tokio::test]
    async fn test_admin_without_identity_is_unauthorized() {
        let request = Request::builder()
            .header(USER_ROLE_HEADER, ADMIN_ROLE)
            .body(())
            .unwrap();
        let (status, Json(error)) = extract_admin(request).await.unwrap_err();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error.code, "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_other_roles_are_forbidden() {
        for role in [None, Some("CUSTOMER"), Some("admin"), Some("")] {
            let mut builder = Request::builder().header(USER_ID_HEADER, UserId::new().to_string());
            if let Some(role) = role {
                builder = builder.header(USER_ROLE_HEADER, role);
            }
            let (status, Json(error)) = extract_admin(builder.body(()).unwrap()).await.unwrap_err();

            assert_eq!(status, StatusCode::FORBIDDEN, "role {:?}", role);
            assert_eq!(error.code, "FORBIDDEN");
        }
    }
}
