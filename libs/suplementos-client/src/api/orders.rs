//! Purchase history for the signed-in user.

use crate::client::{ApiClient, ApiRequest};
use crate::config::endpoints;
use crate::error::ApiError;
use serde::Deserialize;

/// A completed sale.
#[derive(Debug, Clone, Deserialize)]
pub struct Purchase {
    pub folio: u64,
    /// ISO date of the sale
    pub fecha: String,
    pub total: u64,
    #[serde(default)]
    pub detalles: Vec<PurchaseLine>,
}

/// One line of a sale.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseLine {
    pub cantidad: u32,
    pub precio_unitario: u32,
    #[serde(rename = "subTotal")]
    pub subtotal: u64,
}

impl ApiClient {
    /// List the signed-in user's purchases, newest first.
    pub async fn my_purchases(&self) -> Result<Vec<Purchase>, ApiError> {
        self.execute_json(ApiRequest::get(endpoints::MIS_COMPRAS))
            .await
    }
}
