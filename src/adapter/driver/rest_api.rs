use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::current_user::{AdminUser, CurrentUser};
use crate::adapter::driver::request_dto::{
    AddCartItemRequest, AdminOrdersQueryParams, ChangePriceRequest, CreateOrderRequest,
    RegisterProductRequest, SetActiveRequest, UpdateQuantityRequest,
};
use crate::adapter::driver::response_dto::{
    CartCountResponse, CartResponse, CartTotalResponse, CheckoutSummaryResponse,
    OrderDetailResponse, OrderSummaryResponse, ProductResponse,
};
use crate::application::service::{
    CartApplicationService, CatalogApplicationService, OrderApplicationService, OrderQueryService,
};
use crate::application::{ApplicationError, Resource};
use crate::domain::error::DomainError;
use crate::domain::model::{Money, OrderId, OrderStatus, ProductId};
use crate::domain::port::TransactionalStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    /// エラーの種類ごとの追加情報（例: 在庫不足時の利用可能在庫数）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub cart_service: Arc<CartApplicationService>,
    pub order_service: Arc<OrderApplicationService>,
    pub order_query_service: Arc<OrderQueryService>,
    pub catalog_service: Arc<CatalogApplicationService>,
}

impl AppState {
    /// 1つのストアを共有するすべてのサービスを作成
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self {
            cart_service: Arc::new(CartApplicationService::new(store.clone())),
            order_service: Arc::new(OrderApplicationService::new(store.clone())),
            order_query_service: Arc::new(OrderQueryService::new(store.clone())),
            catalog_service: Arc::new(CatalogApplicationService::new(store)),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        // カート
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/count", get(count_cart_items))
        .route("/cart/total", get(get_cart_total))
        .route("/cart/checkout", get(get_checkout_summary))
        .route("/cart/items", post(add_cart_item))
        .route(
            "/cart/items/:product_id",
            put(update_cart_item).delete(remove_cart_item),
        )
        // 注文
        .route("/orders", post(create_order).get(get_my_orders))
        .route("/orders/:order_id", get(get_order_by_id))
        .route("/orders/:order_id/cancel", post(cancel_order))
        // 管理（AdminUserが必要）
        .route("/admin/orders", get(get_orders_by_status))
        .route("/admin/orders/:order_id/deliver", post(mark_order_as_delivered))
        .route("/products", post(register_product))
        .route("/products/:product_id", get(get_product))
        .route("/products/:product_id/price", put(change_product_price))
        .route("/products/:product_id/active", put(set_product_active))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// カート取得エンドポイント
async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<CartResponse>> {
    let cart = state
        .cart_service
        .get_cart(user_id)
        .await
        .map_err(map_application_error)?;

    match cart {
        Some(cart) => Ok(Json(CartResponse::from_cart(&cart).map_err(map_domain_error)?)),
        None => Ok(Json(CartResponse::empty())),
    }
}

// カート内の商品点数エンドポイント
async fn count_cart_items(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<CartCountResponse>> {
    let count = state
        .cart_service
        .count_items(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(CartCountResponse { count }))
}

// カート合計金額エンドポイント
async fn get_cart_total(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<CartTotalResponse>> {
    let total = state
        .cart_service
        .get_total(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(CartTotalResponse {
        total: total.to_string(),
    }))
}

// 注文確定前の金額プレビューエンドポイント
async fn get_checkout_summary(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<CheckoutSummaryResponse>> {
    let summary = state
        .cart_service
        .checkout_summary(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(CheckoutSummaryResponse::from_summary(&summary)))
}

// カートに商品を追加するエンドポイント
async fn add_cart_item(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<AddCartItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    let cart = state
        .cart_service
        .add_product(user_id, ProductId::from_uuid(request.product_id), request.quantity)
        .await
        .map_err(map_application_error)?;
    Ok(Json(CartResponse::from_cart(&cart).map_err(map_domain_error)?))
}

// カート明細の数量更新エンドポイント
async fn update_cart_item(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<CartResponse>> {
    let cart = state
        .cart_service
        .update_quantity(user_id, ProductId::from_uuid(product_id), request.quantity)
        .await
        .map_err(map_application_error)?;
    Ok(Json(CartResponse::from_cart(&cart).map_err(map_domain_error)?))
}

// カート明細の削除エンドポイント
async fn remove_cart_item(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .cart_service
        .remove_product(user_id, ProductId::from_uuid(product_id))
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// カートを空にするエンドポイント
async fn clear_cart(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<StatusCode> {
    state
        .cart_service
        .clear_cart(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// 注文作成エンドポイント
async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetailResponse>)> {
    let order = state
        .order_service
        .create_from_cart(user_id, request.delivery_address, request.contact_phone)
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(OrderDetailResponse::from_order(&order))))
}

// 自分の注文履歴エンドポイント
async fn get_my_orders(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<OrderSummaryResponse>>> {
    let orders = state
        .order_query_service
        .find_orders_by_user(user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(orders.iter().map(OrderSummaryResponse::from_order).collect()))
}

// 注文詳細取得エンドポイント（所有者のみ）
async fn get_order_by_id(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order_id = OrderId::from_uuid(order_id);
    let order = state
        .order_query_service
        .find_order(order_id)
        .await
        .map_err(map_application_error)?
        .ok_or_else(|| map_application_error(ApplicationError::NotFound(Resource::Order(order_id))))?;

    if !order.is_owned_by(user_id) {
        return Err(map_application_error(ApplicationError::AuthorizationFailure {
            requester: user_id,
            order_id,
        }));
    }
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 注文キャンセルエンドポイント
async fn cancel_order(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let order = state
        .order_service
        .cancel(OrderId::from_uuid(order_id), user_id)
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// ステータス別注文一覧エンドポイント（管理用）
// statusを省略した場合はCREATEDの注文を返す
async fn get_orders_by_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    query: Result<Query<AdminOrdersQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<OrderSummaryResponse>>> {
    let Query(params) = query.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("無効なクエリパラメータです", "INVALID_PARAMETER")),
        )
    })?;

    let status = match params.status {
        Some(status_str) => OrderStatus::from_string(&status_str).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(
                    format!("無効なステータス値: {}", status_str),
                    "INVALID_STATUS",
                )),
            )
        })?,
        None => OrderStatus::Created,
    };

    let orders = state
        .order_query_service
        .find_orders_by_status(status)
        .await
        .map_err(map_application_error)?;
    Ok(Json(orders.iter().map(OrderSummaryResponse::from_order).collect()))
}

// 注文配達完了エンドポイント（管理用）
async fn mark_order_as_delivered(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    tracing::info!(admin_id = %admin_id, order_id = %order_id, "delivery requested by admin");
    let order = state
        .order_service
        .mark_delivered(OrderId::from_uuid(order_id))
        .await
        .map_err(map_application_error)?;
    Ok(Json(OrderDetailResponse::from_order(&order)))
}

// 商品登録エンドポイント（管理用）
async fn register_product(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(request): Json<RegisterProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let price = Money::new(request.price).map_err(map_domain_error)?;
    let product = state
        .catalog_service
        .register_product(request.name, price, request.stock)
        .await
        .map_err(map_application_error)?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from_product(&product))))
}

// 商品取得エンドポイント
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    let product_id = ProductId::from_uuid(product_id);
    let product = state
        .catalog_service
        .find_product(product_id)
        .await
        .map_err(map_application_error)?
        .ok_or_else(|| {
            map_application_error(ApplicationError::NotFound(Resource::Product(product_id)))
        })?;
    Ok(Json(ProductResponse::from_product(&product)))
}

// 価格変更エンドポイント（管理用）
async fn change_product_price(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(product_id): Path<Uuid>,
    Json(request): Json<ChangePriceRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let price = Money::new(request.price).map_err(map_domain_error)?;
    let product = state
        .catalog_service
        .change_price(ProductId::from_uuid(product_id), price)
        .await
        .map_err(map_application_error)?;
    Ok(Json(ProductResponse::from_product(&product)))
}

// 販売状態変更エンドポイント（管理用）
async fn set_product_active(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(product_id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .catalog_service
        .set_active(ProductId::from_uuid(product_id), request.active)
        .await
        .map_err(map_application_error)?;
    Ok(Json(ProductResponse::from_product(&product)))
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::Domain(domain_err) => map_domain_error(domain_err),
        ApplicationError::Repository(repo_err) => {
            tracing::error!(error = %repo_err, "repository failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("内部エラーが発生しました", "REPOSITORY_ERROR")),
            )
        }
        ApplicationError::NotFound(resource) => {
            let code = match resource {
                Resource::Cart(_) => "CART_NOT_FOUND",
                Resource::Product(_) => "PRODUCT_NOT_FOUND",
                Resource::Order(_) => "ORDER_NOT_FOUND",
            };
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new(format!("見つかりません: {}", resource), code)),
            )
        }
        ApplicationError::AuthorizationFailure { .. } => (
            StatusCode::FORBIDDEN,
            Json(ApiError::new("この注文を操作する権限がありません", "FORBIDDEN")),
        ),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let message = domain_err.to_string();
    match domain_err {
        DomainError::InsufficientStock {
            product_id,
            available,
        } => (
            StatusCode::CONFLICT,
            Json(ApiError::new(message, "INSUFFICIENT_STOCK").with_details(serde_json::json!({
                "product_id": product_id.to_string(),
                "available": available,
            }))),
        ),
        DomainError::EmptyCart => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError::new(message, "EMPTY_CART")),
        ),
        DomainError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            Json(ApiError::new(message, "INVALID_TRANSITION").with_details(serde_json::json!({
                "from": from.to_string(),
                "to": to.to_string(),
            }))),
        ),
        DomainError::ProductInactive(_) => (
            StatusCode::CONFLICT,
            Json(ApiError::new(message, "PRODUCT_INACTIVE")),
        ),
        DomainError::ProductNotInCart(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(message, "PRODUCT_NOT_IN_CART")),
        ),
        DomainError::InvalidQuantity => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(message, "INVALID_QUANTITY")),
        ),
        DomainError::InvalidDeliveryDetails(_) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(message, "INVALID_DELIVERY_DETAILS")),
        ),
        DomainError::InvalidValue(_) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(message, "INVALID_VALUE")),
        ),
    }
}

#[cfg(test)]
mod error_handling_tests {
    use super::*;
    use crate::domain::model::UserId;
    use crate::domain::port::RepositoryError;

    #[test]
    fn test_insufficient_stock_maps_to_conflict_with_available() {
        let product_id = ProductId::new();
        let err = ApplicationError::Domain(DomainError::InsufficientStock {
            product_id,
            available: 2,
        });

        let (status, Json(api_error)) = map_application_error(err);

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, "INSUFFICIENT_STOCK");
        let details = api_error.details.unwrap();
        assert_eq!(details["available"], 2);
        assert_eq!(details["product_id"], product_id.to_string());
    }

    #[test]
    fn test_empty_cart_maps_to_unprocessable() {
        let (status, Json(api_error)) = map_domain_error(DomainError::EmptyCart);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api_error.code, "EMPTY_CART");
    }

    #[test]
    fn test_invalid_transition_maps_to_conflict() {
        let (status, Json(api_error)) = map_domain_error(DomainError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        });
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, "INVALID_TRANSITION");
        assert_eq!(api_error.details.unwrap()["from"], "DELIVERED");
    }

    #[test]
    fn test_not_found_codes_per_resource() {
        let (status, Json(api_error)) =
            map_application_error(ApplicationError::NotFound(Resource::Cart(UserId::new())));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "CART_NOT_FOUND");

        let (_, Json(api_error)) =
            map_application_error(ApplicationError::NotFound(Resource::Order(OrderId::new())));
        assert_eq!(api_error.code, "ORDER_NOT_FOUND");
    }

    #[test]
    fn test_authorization_failure_maps_to_forbidden() {
        let err = ApplicationError::AuthorizationFailure {
            requester: UserId::new(),
            order_id: OrderId::new(),
        };
        let (status, Json(api_error)) = map_application_error(err);
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(api_error.code, "FORBIDDEN");
    }

    #[test]
    fn test_repository_error_hides_details() {
        let err = ApplicationError::Repository(RepositoryError::ConnectionFailed(
            "mysql://user:secret@db".to_string(),
        ));
        let (status, Json(api_error)) = map_application_error(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.error.contains("secret"));
    }

    #[test]
    fn test_api_error_structure() {
        let api_error = ApiError::new("テストエラー", "TEST_ERROR");

        let json = serde_json::to_string(&api_error).unwrap();
        assert!(json.contains("テストエラー"));
        assert!(!json.contains("details"));

        let deserialized: ApiError = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error, "テストエラー");
        assert_eq!(deserialized.code, "TEST_ERROR");
        assert!(deserialized.details.is_none());
    }

    #[test]
    fn test_out_of_range_money_maps_to_bad_request() {
        let err = Money::new(rust_decimal::Decimal::MAX).unwrap_err();
        let (status, Json(api_error)) = map_domain_error(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, "INVALID_VALUE");
    }
}
