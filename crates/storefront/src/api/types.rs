//! Wire types for the Eden Shop REST API.
//!
//! Field names follow the backend's camelCase JSON. Timestamps and optional
//! collections are tolerant of omission so a partial payload from an older
//! backend still decodes.

use std::collections::BTreeMap;
use std::fmt;

use edenshop_core::{
    CartId, CartItemId, GuestSessionId, Price, ProductId, SellerId, Timestamp, UserId, UserRole,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Users
// =============================================================================

/// A shop account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl User {
    /// Best human-readable label: full name, then email, then phone, then id.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self
                .email
                .clone()
                .or_else(|| self.phone.clone())
                .unwrap_or_else(|| self.id.to_string()),
        }
    }
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Product {
    /// Listed and in stock.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// Whether at least `quantity` units are in stock.
    #[must_use]
    pub const fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Cart {
    /// Sum of line quantities, saturating at `u32::MAX`.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.quantity))
    }

    /// Sum of unit price × quantity, using each line's embedded product price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Find a line by id.
    #[must_use]
    pub fn item(&self, item_id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }
}

/// One line of a cart: a product snapshot and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product: Product,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl CartItem {
    /// Unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Successful login/registration payload.
///
/// Implements `Debug` manually to redact credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: User,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Credentials for `POST /auth/login`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

impl LoginRequest {
    /// Build a request from a single identifier: anything containing `@` is
    /// sent as an email, everything else as a phone number.
    #[must_use]
    pub fn from_identifier(identifier: &str, password: &str) -> Self {
        let identifier = identifier.trim().to_string();
        let (email, phone) = if identifier.contains('@') {
            (Some(identifier), None)
        } else {
            (None, Some(identifier))
        };
        Self {
            email,
            phone,
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Fields for `POST /auth/register`.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Body of `POST /auth/refresh`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response of `POST /auth/refresh`.
#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    pub token: String,
}

// =============================================================================
// Cart requests
// =============================================================================

/// Body of `POST /cart/items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<GuestSessionId>,
}

/// Body of `PUT /cart/items/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

// =============================================================================
// Errors
// =============================================================================

/// Error payload returned by the backend, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Field-level validation messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ApiErrorBody {
    /// Decode a response body, falling back to the raw text as the message.
    #[must_use]
    pub fn from_response_text(status: u16, text: &str) -> Self {
        match serde_json::from_str::<Self>(text) {
            Ok(mut body) => {
                if body.status == 0 {
                    body.status = status;
                }
                body
            }
            Err(_) => Self {
                message: if text.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    text.chars().take(500).collect()
                },
                status,
                timestamp: None,
                errors: None,
            },
        }
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(errors) = &self.errors
            && !errors.is_empty()
        {
            let fields = errors
                .iter()
                .map(|(field, msg)| format!("{field}: {msg}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " ({fields})")?;
        }
        Ok(())
    }
}

const fn default_true() -> bool {
    true
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_fixtures::{cart, line, product, user};
    use super::*;

    #[test]
    fn test_cart_totals() {
        let c = cart(vec![
            line("a", product("p1", 1000, 10), 2),
            line("b", product("p2", 550, 10), 1),
        ]);
        assert_eq!(c.total_items(), 3);
        assert_eq!(c.total_price(), Price::from_cents(2550));
        assert!(c.item(&CartItemId::new("b")).is_some());
        assert!(c.item(&CartItemId::new("z")).is_none());
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let c = cart(vec![]);
        assert_eq!(c.total_items(), 0);
        assert_eq!(c.total_price(), Price::ZERO);
    }

    #[test]
    fn test_total_items_saturates() {
        let c = cart(vec![
            line("a", product("p1", 100, u32::MAX), u32::MAX),
            line("b", product("p2", 100, 10), 2),
        ]);
        assert_eq!(c.total_items(), u32::MAX);
    }

    #[test]
    fn test_decode_backend_cart() {
        let json = r#"{
            "id": "c1",
            "sessionId": "guest_1_abc",
            "items": [{
                "id": "i1",
                "cartId": "c1",
                "quantity": 2,
                "product": {
                    "id": "p1",
                    "sellerId": "s1",
                    "title": "Worm castings 5kg",
                    "price": 12.5,
                    "stock": 40,
                    "imageUrls": [],
                    "isActive": true,
                    "isFeatured": false,
                    "createdAt": "2024-03-01T09:00:00"
                },
                "createdAt": "2024-03-02T09:00:00",
                "updatedAt": "2024-03-02T09:00:00"
            }],
            "createdAt": "2024-03-02T09:00:00",
            "updatedAt": "2024-03-02T09:00:00"
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), Price::from_cents(2500));
        assert_eq!(cart.session_id.as_deref(), Some("guest_1_abc"));
    }

    #[test]
    fn test_product_availability() {
        let mut p = product("p1", 100, 0);
        assert!(!p.is_available());
        p.stock = 3;
        assert!(p.is_available());
        assert!(p.has_stock(3));
        assert!(!p.has_stock(4));
        p.is_active = false;
        assert!(!p.is_available());
    }

    #[test]
    fn test_login_request_from_identifier() {
        let by_email = LoginRequest::from_identifier(" ana@example.com ", "pw");
        assert_eq!(by_email.email.as_deref(), Some("ana@example.com"));
        assert!(by_email.phone.is_none());

        let by_phone = LoginRequest::from_identifier("+56911112222", "pw");
        assert_eq!(by_phone.phone.as_deref(), Some("+56911112222"));
        let json = serde_json::to_value(&by_phone).unwrap();
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_request_debug_redacts_password() {
        let req = LoginRequest::from_identifier("ana@example.com", "s3cret!");
        assert!(!format!("{req:?}").contains("s3cret!"));
        let reg = RegisterRequest {
            password: "s3cret!".to_string(),
            ..RegisterRequest::default()
        };
        assert!(!format!("{reg:?}").contains("s3cret!"));
    }

    #[test]
    fn test_add_item_request_omits_missing_session() {
        let req = AddItemRequest {
            product_id: ProductId::new("p1"),
            quantity: 1,
            session_id: None,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"productId":"p1","quantity":1}"#
        );
    }

    #[test]
    fn test_api_error_body_decodes_backend_payload() {
        let body = ApiErrorBody::from_response_text(
            400,
            r#"{"message":"Validation failed","status":400,"errors":{"quantity":"must be positive"}}"#,
        );
        assert_eq!(body.status, 400);
        assert_eq!(body.to_string(), "Validation failed (quantity: must be positive)");
    }

    #[test]
    fn test_api_error_body_falls_back_to_text() {
        let body = ApiErrorBody::from_response_text(502, "Bad Gateway");
        assert_eq!(body.message, "Bad Gateway");
        assert_eq!(body.status, 502);

        let empty = ApiErrorBody::from_response_text(500, "");
        assert_eq!(empty.message, "HTTP 500");
    }

    #[test]
    fn test_user_display_name() {
        let mut u = user("u1", "ana@example.com");
        assert_eq!(u.display_name(), "ana@example.com");
        u.first_name = Some("Ana".to_string());
        assert_eq!(u.display_name(), "Ana");
        u.last_name = Some("Rojas".to_string());
        assert_eq!(u.display_name(), "Ana Rojas");
    }
}
