//! Shopping cart store.
//!
//! The backend is authoritative: every successful mutation replaces the
//! in-memory cart with the server's response, with no optimistic merge. Only
//! the guest session id is persisted; cart contents are always re-fetched.

use std::sync::Arc;

use edenshop_core::{CartItemId, GuestSessionId, Price};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::api::{AddItemRequest, ApiClient, ApiRequest, Cart, Product, UpdateQuantityRequest};
use crate::error::StorefrontError;
use crate::storage::{PersistedCart, Storage};

/// Whose cart a request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartScope {
    /// The authenticated identity carried by the bearer credential.
    Customer,
    /// An anonymous visitor, identified by the guest session id.
    Guest(GuestSessionId),
}

impl CartScope {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        match self {
            Self::Customer => request,
            Self::Guest(id) => request.query("sessionId", id.as_str()),
        }
    }

    fn guest_id(&self) -> Option<GuestSessionId> {
        match self {
            Self::Customer => None,
            Self::Guest(id) => Some(id.clone()),
        }
    }
}

/// Read-only view of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Last cart returned by the backend.
    pub cart: Option<Cart>,
    /// Guest session id, once generated.
    pub session_id: Option<GuestSessionId>,
    /// A cart request is in flight.
    pub is_loading: bool,
}

#[derive(Default)]
struct CartState {
    cart: Option<Cart>,
    session_id: Option<GuestSessionId>,
    is_loading: bool,
}

/// Cart state container.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    state: RwLock<CartState>,
}

impl CartStore {
    /// Create an empty store with no guest session id yet.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                storage,
                state: RwLock::new(CartState::default()),
            }),
        }
    }

    /// Create a store seeded with the persisted guest session id.
    ///
    /// An unreadable entry is logged and ignored.
    pub async fn restore(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        let store = Self::new(api, storage);

        match PersistedCart::load(store.inner.storage.as_ref()) {
            Ok(Some(persisted)) => {
                store.inner.state.write().await.session_id = persisted.session_id;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable persisted cart"),
        }

        store
    }

    /// Current cart view.
    pub async fn snapshot(&self) -> CartSnapshot {
        let state = self.inner.state.read().await;
        CartSnapshot {
            cart: state.cart.clone(),
            session_id: state.session_id.clone(),
            is_loading: state.is_loading,
        }
    }

    /// Sum of line quantities; zero when there is no cart.
    pub async fn total_items(&self) -> u32 {
        self.inner
            .state
            .read()
            .await
            .cart
            .as_ref()
            .map_or(0, Cart::total_items)
    }

    /// Sum of unit price × quantity; zero when there is no cart.
    pub async fn total_price(&self) -> Price {
        self.inner
            .state
            .read()
            .await
            .cart
            .as_ref()
            .map_or(Price::ZERO, Cart::total_price)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load the cart for the current scope.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection or a transport error; the cached cart is kept.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Cart, StorefrontError> {
        self.begin().await;
        let scope = self.scope().await;
        self.replace_with(scope.apply(ApiRequest::get("/cart")))
            .await
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` for a zero quantity,
    /// `StorefrontError::InsufficientStock` when `quantity` exceeds the
    /// product's stock, or the backend's rejection.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&self, product: &Product, quantity: u32) -> Result<Cart, StorefrontError> {
        validate_quantity(quantity, Some(product))?;

        self.begin().await;
        let scope = self.scope().await;
        let body = AddItemRequest {
            product_id: product.id.clone(),
            quantity,
            session_id: scope.guest_id(),
        };
        let request = match ApiRequest::post("/cart/items").json(&body) {
            Ok(request) => scope.apply(request),
            Err(e) => return Err(self.fail(e.into()).await),
        };

        self.replace_with(request).await
    }

    /// Set the quantity of one line.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` for a zero quantity,
    /// `StorefrontError::InsufficientStock` when the line is cached locally
    /// and `quantity` exceeds its product's stock, or the backend's rejection.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, StorefrontError> {
        let known_product = self
            .inner
            .state
            .read()
            .await
            .cart
            .as_ref()
            .and_then(|cart| cart.item(item_id))
            .map(|item| item.product.clone());
        validate_quantity(quantity, known_product.as_ref())?;

        self.begin().await;
        let scope = self.scope().await;
        let request = match ApiRequest::put("/cart/items")
            .segment(item_id.as_str())
            .json(&UpdateQuantityRequest { quantity })
        {
            Ok(request) => scope.apply(request),
            Err(e) => return Err(self.fail(e.into()).await),
        };

        self.replace_with(request).await
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection or a transport error.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<Cart, StorefrontError> {
        self.begin().await;
        let scope = self.scope().await;
        let request = ApiRequest::delete("/cart/items").segment(item_id.as_str());
        self.replace_with(scope.apply(request)).await
    }

    /// Delete the cart on the backend, then drop the local copy.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection or a transport error; the cached cart is kept.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), StorefrontError> {
        self.begin().await;
        let scope = self.scope().await;

        match self
            .inner
            .api
            .send_empty(scope.apply(ApiRequest::delete("/cart")))
            .await
        {
            Ok(()) => {
                let mut state = self.inner.state.write().await;
                state.cart = None;
                state.is_loading = false;
                debug!("Cart cleared");
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Return the guest session id, generating and persisting it on first use.
    pub async fn ensure_session_id(&self) -> GuestSessionId {
        let mut state = self.inner.state.write().await;
        if let Some(id) = &state.session_id {
            return id.clone();
        }

        let id = GuestSessionId::generate();
        state.session_id = Some(id.clone());
        drop(state);

        let persisted = PersistedCart {
            session_id: Some(id.clone()),
        };
        if let Err(e) = persisted.save(self.inner.storage.as_ref()) {
            warn!(error = %e, "Failed to persist guest session id");
        }
        debug!(session_id = %id, "Generated guest session id");
        id
    }

    /// Resolve the scope for the next request.
    ///
    /// The guest session id is ensured even for signed-in customers so it
    /// exists from the first cart operation on.
    async fn scope(&self) -> CartScope {
        let session_id = self.ensure_session_id().await;
        if self.inner.api.credentials().has_access().await {
            CartScope::Customer
        } else {
            CartScope::Guest(session_id)
        }
    }

    async fn begin(&self) {
        self.inner.state.write().await.is_loading = true;
    }

    /// Reset the loading flag and hand the error back.
    async fn fail(&self, error: StorefrontError) -> StorefrontError {
        self.inner.state.write().await.is_loading = false;
        error
    }

    async fn replace_with(&self, request: ApiRequest) -> Result<Cart, StorefrontError> {
        match self.inner.api.send_json::<Cart>(request).await {
            Ok(cart) => {
                let mut state = self.inner.state.write().await;
                state.cart = Some(cart.clone());
                state.is_loading = false;
                debug!(items = cart.items.len(), "Cart replaced from server");
                Ok(cart)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").finish_non_exhaustive()
    }
}

/// Quantities are positive and, when the product is known, within its stock.
fn validate_quantity(quantity: u32, product: Option<&Product>) -> Result<(), StorefrontError> {
    if quantity == 0 {
        return Err(StorefrontError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    if let Some(product) = product
        && !product.has_stock(quantity)
    {
        return Err(StorefrontError::InsufficientStock {
            requested: quantity,
            available: product.stock,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::test_fixtures::{cart, line, product};
    use crate::api::{CredentialVault, LogRedirect};
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStorage;

    fn store(storage: &MemoryStorage) -> CartStore {
        // Nothing listens here; tests below never reach the network.
        let config = StorefrontConfig::for_api_url("http://127.0.0.1:9").unwrap();
        let vault = Arc::new(CredentialVault::new(Arc::new(storage.clone())));
        let api = ApiClient::new(&config, vault, Arc::new(LogRedirect)).unwrap();
        CartStore::new(api, Arc::new(storage.clone()))
    }

    #[test]
    fn test_validate_quantity() {
        let p = product("p1", 100, 5);
        assert!(matches!(
            validate_quantity(0, Some(&p)),
            Err(StorefrontError::Validation(_))
        ));
        assert!(matches!(
            validate_quantity(6, Some(&p)),
            Err(StorefrontError::InsufficientStock {
                requested: 6,
                available: 5
            })
        ));
        assert!(validate_quantity(5, Some(&p)).is_ok());
        assert!(validate_quantity(99, None).is_ok());
        assert!(matches!(
            validate_quantity(0, None),
            Err(StorefrontError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_quantity_agrees_with_has_stock() {
        let p = product("p1", 100, 3);
        for quantity in 1..=5 {
            assert_eq!(
                validate_quantity(quantity, Some(&p)).is_ok(),
                p.has_stock(quantity),
                "quantity {quantity}"
            );
        }
    }

    #[tokio::test]
    async fn test_totals_are_zero_without_cart() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        assert_eq!(store.total_items().await, 0);
        assert_eq!(store.total_price().await, Price::ZERO);
    }

    #[tokio::test]
    async fn test_totals_over_cached_cart() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        store.inner.state.write().await.cart = Some(cart(vec![
            line("a", product("p1", 1000, 10), 2),
            line("b", product("p2", 550, 10), 1),
        ]));

        assert_eq!(store.total_items().await, 3);
        assert_eq!(store.total_price().await, Price::from_cents(2550));
    }

    #[tokio::test]
    async fn test_total_items_sums_quantities() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        store.inner.state.write().await.cart = Some(cart(vec![
            line("a", product("p1", 100, 10), 2),
            line("b", product("p2", 100, 10), 3),
        ]));
        assert_eq!(store.total_items().await, 5);
    }

    #[tokio::test]
    async fn test_session_id_generated_once_and_persisted() {
        let storage = MemoryStorage::new();
        let store = store(&storage);

        let first = store.ensure_session_id().await;
        let second = store.ensure_session_id().await;
        assert_eq!(first, second);
        assert_eq!(
            PersistedCart::load(&storage).unwrap().unwrap().session_id,
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_restore_reuses_persisted_session_id() {
        let storage = MemoryStorage::new();
        let id = GuestSessionId::parse("guest_1700000000000_k3j4h5g6f").unwrap();
        PersistedCart {
            session_id: Some(id.clone()),
        }
        .save(&storage)
        .unwrap();

        let config = StorefrontConfig::for_api_url("http://127.0.0.1:9").unwrap();
        let vault = Arc::new(CredentialVault::new(Arc::new(storage.clone())));
        let api = ApiClient::new(&config, vault, Arc::new(LogRedirect)).unwrap();
        let restored = CartStore::restore(api, Arc::new(storage)).await;

        assert_eq!(restored.ensure_session_id().await, id);
        assert!(restored.snapshot().await.cart.is_none());
    }

    #[tokio::test]
    async fn test_update_quantity_checks_cached_stock_before_sending() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        store.inner.state.write().await.cart =
            Some(cart(vec![line("a", product("p1", 100, 2), 1)]));

        let result = store.update_quantity(&CartItemId::new("a"), 3).await;
        assert!(matches!(
            result,
            Err(StorefrontError::InsufficientStock { available: 2, .. })
        ));
        assert!(!store.snapshot().await.is_loading);
    }

    #[tokio::test]
    async fn test_add_item_rejects_zero_quantity() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        let result = store.add_item(&product("p1", 100, 5), 0).await;
        assert!(matches!(result, Err(StorefrontError::Validation(_))));
        assert!(store.snapshot().await.session_id.is_none());
    }

    #[tokio::test]
    async fn test_guest_scope_adds_session_query() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        let scope = store.scope().await;
        let CartScope::Guest(id) = &scope else {
            panic!("expected guest scope, got {scope:?}");
        };
        let request = scope.apply(ApiRequest::get("/cart"));
        assert_eq!(
            request.query,
            vec![("sessionId".to_string(), id.as_str().to_string())]
        );
    }
}
