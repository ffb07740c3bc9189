//! Shopping cart operations. All of these require a session.

use crate::client::{ApiClient, ApiRequest};
use crate::config::endpoints;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};

use super::StatusMessage;

/// One line of the cart. `total` is `precio * cantidad`, computed
/// server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    pub id: u64,
    pub producto_id: u64,
    pub nombre: String,
    pub precio: u32,
    pub cantidad: u32,
    #[serde(default)]
    pub imagen: Option<String>,
    /// Product category (`proteina`, `snack`, `creatina`, `aminoacido`,
    /// `vitamina`)
    pub tipo: String,
    pub total: u64,
}

/// The full cart as returned by `GET /api/carrito/`.
#[derive(Debug, Clone, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: u64,
}

/// Payload for adding a product to the cart.
///
/// The backend keys cart lines on `(producto_id, tipo)`: adding an existing
/// combination increments its quantity instead of creating a new line.
#[derive(Debug, Clone, Serialize)]
pub struct AddToCart {
    pub producto_id: u64,
    pub nombre: String,
    pub precio: u32,
    pub tipo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cantidad: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
}

/// Acknowledgement of a cart mutation.
///
/// `nueva_cantidad` is present when an existing line's quantity changed;
/// `total_item` accompanies quantity updates.
#[derive(Debug, Clone, Deserialize)]
pub struct CartMutation {
    pub mensaje: String,
    #[serde(default)]
    pub nueva_cantidad: Option<u32>,
    #[serde(default)]
    pub total_item: Option<u64>,
}

/// Lightweight cart badge data from `GET /api/carrito/resumen/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CartSummary {
    pub cantidad_items: u32,
    pub total: u64,
}

/// Confirmation of a completed purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    pub mensaje: String,
    pub folio: u64,
    pub total: u64,
    /// ISO date of the sale
    pub fecha: String,
}

impl ApiClient {
    /// Fetch the cart contents.
    pub async fn cart(&self) -> Result<Cart, ApiError> {
        self.execute_json(ApiRequest::get(endpoints::CARRITO)).await
    }

    /// Add a product to the cart, or bump its quantity if already present.
    pub async fn add_to_cart(&self, item: &AddToCart) -> Result<CartMutation, ApiError> {
        self.execute_json(ApiRequest::post(endpoints::CARRITO_AGREGAR).body(item)?)
            .await
    }

    /// Set the quantity of a cart line.
    pub async fn update_cart_item(
        &self,
        item_id: u64,
        cantidad: u32,
    ) -> Result<CartMutation, ApiError> {
        let body = serde_json::json!({ "id": item_id, "cantidad": cantidad });
        self.execute_json(ApiRequest::post(endpoints::CARRITO_ACTUALIZAR).body(&body)?)
            .await
    }

    /// Remove one line from the cart.
    pub async fn remove_cart_item(&self, item_id: u64) -> Result<StatusMessage, ApiError> {
        let path = format!("{}{item_id}/", endpoints::CARRITO);
        self.execute_json(ApiRequest::delete(path)).await
    }

    /// Remove every line from the cart.
    pub async fn empty_cart(&self) -> Result<StatusMessage, ApiError> {
        self.execute_json(ApiRequest::post(endpoints::CARRITO_VACIAR))
            .await
    }

    /// Fetch the item count and total without the full line list.
    pub async fn cart_summary(&self) -> Result<CartSummary, ApiError> {
        self.execute_json(ApiRequest::get(endpoints::CARRITO_RESUMEN))
            .await
    }

    /// Convert the cart into a sale. The backend validates stock, creates
    /// the sale with its line details, decrements stock, and empties the
    /// cart.
    pub async fn checkout(&self) -> Result<Receipt, ApiError> {
        self.execute_json(ApiRequest::post(endpoints::CARRITO_PAGAR))
            .await
    }
}
