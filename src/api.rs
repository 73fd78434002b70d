//! HTTP surface of the storefront.
//!
//! Thin axum handlers over the session map: every route resolves one
//! session, applies one domain operation, and returns a localized view.
//! Handlers follow the `Result<Json<_>, (StatusCode, String)>` convention.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{Catalog, Category, Product, Tag};
use crate::clients::assistant::AssistantClient;
use crate::clients::orders::{OrderClient, OrderError, OrderItem};
use crate::domain::cart::CartLine;
use crate::domain::chat::ChatMessage;
use crate::domain::checkout::{
    CheckoutError, CustomerDetails, OrderSnapshot, ShippingZone, Step, Totals,
};
use crate::domain::coupon::{CouponRule, CouponState};
use crate::domain::session::StoreSession;
use crate::i18n::{self, messages, Lang};

/// Vibration hint mirrored to supporting clients on add-to-cart; ignored
/// where unsupported.
const HAPTIC_PULSE_MS: u32 = 50;

/// Shared application state: the immutable catalog, the in-memory session
/// map, and the two external clients.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<RwLock<HashMap<String, StoreSession>>>,
    pub orders: Arc<OrderClient>,
    pub assistant: Arc<AssistantClient>,
    pub coupon_rule: Arc<CouponRule>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/:id", get(get_session))
        .route("/api/v1/sessions/:id/language", put(set_language))
        .route("/api/v1/sessions/:id/cart", get(view_cart).post(add_to_cart))
        .route("/api/v1/sessions/:id/cart/items/:product", put(update_quantity))
        .route("/api/v1/sessions/:id/coupon", post(apply_coupon))
        .route("/api/v1/sessions/:id/checkout/form", post(open_form))
        .route("/api/v1/sessions/:id/checkout/zone", put(select_zone))
        .route("/api/v1/sessions/:id/checkout/submit", post(submit_order))
        .route("/api/v1/sessions/:id/checkout/continue", post(continue_shopping))
        .route("/api/v1/sessions/:id/chat", get(chat_transcript).post(send_chat_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

fn checkout_error(e: CheckoutError) -> ApiError {
    match e {
        CheckoutError::InvalidDetails(_) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        CheckoutError::SubmissionInFlight | CheckoutError::NotInForm => {
            (StatusCode::CONFLICT, e.to_string())
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "sinopec-bd-storefront"}))
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub series: String,
    pub desc: String,
    pub price: u64,
    pub price_display: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    pub color: String,
    pub image: String,
    pub viscosity: String,
    pub specs: String,
    pub application: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_models: Option<Vec<String>>,
}

impl ProductView {
    fn render(product: &Product, lang: Lang) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.resolve(lang).to_string(),
            series: product.series.clone(),
            desc: product.desc.resolve(lang).to_string(),
            price: product.price,
            price_display: i18n::format_price(product.price, lang),
            category: product.category,
            tag: product.tag,
            color: product.color.clone(),
            image: product.image.clone(),
            viscosity: product.viscosity.clone(),
            specs: product.specs.clone(),
            application: product.application.resolve(lang).to_string(),
            features: product.features.resolve(lang).to_vec(),
            recommended_models: product.recommended_models.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TotalsView {
    pub subtotal: u64,
    pub discount: u64,
    pub shipping: u64,
    pub payable: u64,
    pub payable_display: String,
}

impl TotalsView {
    fn render(totals: Totals, lang: Lang) -> Self {
        Self {
            subtotal: totals.subtotal,
            discount: totals.discount,
            shipping: totals.shipping,
            payable: totals.payable,
            payable_display: i18n::format_price(totals.payable, lang),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CouponView {
    pub code: String,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CouponView {
    fn render(coupon: &CouponState) -> Self {
        Self {
            code: coupon.code.clone(),
            applied: coupon.is_applied(),
            error: coupon.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub viscosity: String,
    pub image: String,
    pub color: String,
    pub price: u64,
    pub price_display: String,
    pub qty: u32,
    pub line_total: u64,
}

impl CartLineView {
    fn render(line: &CartLine, lang: Lang) -> Self {
        Self {
            id: line.product.id.clone(),
            name: line.product.name.resolve(lang).to_string(),
            viscosity: line.product.viscosity.clone(),
            image: line.product.image.clone(),
            color: line.product.color.clone(),
            price: line.product.price,
            price_display: i18n::format_price(line.product.price, lang),
            qty: line.qty,
            line_total: line.product.price * u64::from(line.qty),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u32,
    pub totals: TotalsView,
    pub coupon: CouponView,
}

impl CartView {
    fn render(session: &StoreSession) -> Self {
        Self {
            lines: session
                .cart
                .lines()
                .iter()
                .map(|line| CartLineView::render(line, session.lang))
                .collect(),
            count: session.cart.count(),
            totals: TotalsView::render(session.totals(), session.lang),
            coupon: CouponView::render(&session.coupon),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderSnapshotView {
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub total: u64,
    pub total_display: String,
    pub details: CustomerDetails,
    pub shipping_zone: ShippingZone,
    pub discount: u64,
    pub placed_at: DateTime<Utc>,
}

impl OrderSnapshotView {
    fn render(snapshot: &OrderSnapshot, lang: Lang) -> Self {
        Self {
            order_number: snapshot.order_number.clone(),
            items: snapshot.items.clone(),
            total: snapshot.total,
            total_display: i18n::format_price(snapshot.total, lang),
            details: snapshot.details.clone(),
            shipping_zone: snapshot.shipping_zone,
            discount: snapshot.discount,
            placed_at: snapshot.placed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub lang: Lang,
    pub step: Step,
    pub shipping_zone: ShippingZone,
    pub cart: CartView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_order: Option<OrderSnapshotView>,
}

impl SessionView {
    fn render(session: &StoreSession) -> Self {
        Self {
            id: session.id.clone(),
            lang: session.lang,
            step: session.checkout.step(),
            shipping_zone: session.checkout.shipping_zone(),
            cart: CartView::render(session),
            checkout_error: session.checkout.error().map(str::to_string),
            last_order: session
                .checkout
                .last_order()
                .map(|snapshot| OrderSnapshotView::render(snapshot, session.lang)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatMessageView {
    pub role: crate::domain::chat::Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductView>,
}

impl ChatMessageView {
    fn render(message: &ChatMessage, catalog: &Catalog, lang: Lang) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
            product: message
                .recommended(catalog)
                .map(|product| ProductView::render(product, lang)),
        }
    }
}

// =============================================================================
// Catalog handlers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub lang: Option<String>,
}

fn parse_lang(raw: Option<&str>) -> Result<Lang, ApiError> {
    match raw {
        None => Ok(Lang::default()),
        Some(raw) => raw
            .parse()
            .map_err(|()| (StatusCode::BAD_REQUEST, format!("unknown language '{raw}'"))),
    }
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let lang = parse_lang(query.lang.as_deref())?;
    let category = match query.category.as_deref() {
        None | Some("All") => None,
        Some(raw) => Some(raw.parse::<Category>().map_err(|()| {
            (StatusCode::BAD_REQUEST, format!("unknown category '{raw}'"))
        })?),
    };
    Ok(Json(
        state
            .catalog
            .by_category(category)
            .map(|product| ProductView::render(product, lang))
            .collect(),
    ))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ProductView>, ApiError> {
    let lang = parse_lang(query.lang.as_deref())?;
    state
        .catalog
        .get(&id)
        .map(|product| Json(ProductView::render(product, lang)))
        .ok_or_else(|| not_found("product"))
}

// =============================================================================
// Session handlers
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub lang: Lang,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub lang: Lang,
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session = StoreSession::new(request.lang);
    let response = CreateSessionResponse {
        session_id: session.id.clone(),
        lang: session.lang,
    };
    state
        .sessions
        .write()
        .await
        .insert(session.id.clone(), session);
    (StatusCode::CREATED, Json(response))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| not_found("session"))?;
    Ok(Json(SessionView::render(session)))
}

#[derive(Debug, Deserialize)]
pub struct SetLanguageRequest {
    pub lang: Lang,
}

async fn set_language(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetLanguageRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    session.set_lang(request.lang);
    Ok(Json(SessionView::render(session)))
}

// =============================================================================
// Cart handlers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub qty: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub haptic_ms: u32,
    pub cart: CartView,
}

async fn view_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| not_found("session"))?;
    Ok(Json(CartView::render(session)))
}

async fn add_to_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>, ApiError> {
    let product = state
        .catalog
        .get(&request.product_id)
        .ok_or_else(|| not_found("product"))?;
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    session.cart.add(product, request.qty.unwrap_or(1));
    session.touch();
    Ok(Json(AddToCartResponse {
        haptic_ms: HAPTIC_PULSE_MS,
        cart: CartView::render(session),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub delta: i64,
}

async fn update_quantity(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(String, String)>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    session.cart.update_qty(&product_id, request.delta);
    session.touch();
    Ok(Json(CartView::render(session)))
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

async fn apply_coupon(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ApplyCouponRequest>,
) -> Result<Json<CartView>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    let lang = session.lang;
    session.coupon.evaluate(&state.coupon_rule, &request.code, lang);
    session.touch();
    Ok(Json(CartView::render(session)))
}

// =============================================================================
// Checkout handlers
// =============================================================================

async fn open_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    session.checkout.open_form();
    session.touch();
    Ok(Json(SessionView::render(session)))
}

#[derive(Debug, Deserialize)]
pub struct SelectZoneRequest {
    pub shipping_zone: ShippingZone,
}

async fn select_zone(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SelectZoneRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    session.checkout.select_zone(request.shipping_zone);
    session.touch();
    Ok(Json(SessionView::render(session)))
}

#[derive(Debug, Serialize)]
pub struct SubmitOrderResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub order: OrderSnapshotView,
}

async fn submit_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(details): Json<CustomerDetails>,
) -> Result<Json<SubmitOrderResponse>, ApiError> {
    // Freeze the request under the lock, release it for the outbound call,
    // then re-acquire to apply the outcome.
    let request = {
        let mut sessions = state.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
        if session.cart.is_empty() {
            return Err((StatusCode::CONFLICT, "cart is empty".to_string()));
        }
        session
            .checkout
            .prepare_submission(&session.cart, &session.coupon, details)
            .map_err(checkout_error)?
    };

    let outcome = state.orders.submit(&request).await;

    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    match outcome {
        Ok(message) => {
            let lang = session.lang;
            let order = {
                let snapshot =
                    session
                        .checkout
                        .complete(&mut session.cart, &mut session.coupon, request);
                OrderSnapshotView::render(snapshot, lang)
            };
            session.touch();
            Ok(Json(SubmitOrderResponse { message, order }))
        }
        Err(OrderError::Rejected(message)) => {
            session.checkout.fail(message.clone());
            session.touch();
            Err((StatusCode::UNPROCESSABLE_ENTITY, message))
        }
        Err(e) => {
            tracing::warn!("order submission failed: {e}");
            let message = messages::connection_trouble(session.lang).to_string();
            session.checkout.fail(message.clone());
            session.touch();
            Err((StatusCode::BAD_GATEWAY, message))
        }
    }
}

async fn continue_shopping(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    session.checkout.continue_shopping();
    session.touch();
    Ok(Json(SessionView::render(session)))
}

// =============================================================================
// Chat handlers
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ChatView {
    pub messages: Vec<ChatMessageView>,
}

async fn chat_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatView>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| not_found("session"))?;
    Ok(Json(ChatView {
        messages: session
            .chat
            .messages()
            .iter()
            .map(|message| ChatMessageView::render(message, &state.catalog, session.lang))
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

async fn send_chat_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatMessageView>, ApiError> {
    let text = request.text.trim().to_string();
    if text.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "message text is required".to_string(),
        ));
    }

    let lang = {
        let mut sessions = state.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
        session.chat.push_user(text.clone());
        session.touch();
        session.lang
    };

    let reply = state.assistant.recommend(&text, lang, &state.catalog).await;

    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| not_found("session"))?;
    session.chat.push_assistant(reply.text, reply.product_id);
    session.touch();
    let message = session
        .chat
        .messages()
        .last()
        .map(|message| ChatMessageView::render(message, &state.catalog, session.lang))
        .ok_or_else(|| not_found("message"))?;
    Ok(Json(message))
}
