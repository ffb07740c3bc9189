//! Product catalog: list and fetch are public, mutations require an admin
//! session.

use crate::client::{ApiClient, ApiRequest};
use crate::config::endpoints;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// The five product categories, each served by its own router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Proteina,
    Snack,
    Creatina,
    Aminoacido,
    Vitamina,
}

impl ProductKind {
    pub(crate) fn path(self) -> &'static str {
        match self {
            ProductKind::Proteina => endpoints::PROTEINAS,
            ProductKind::Snack => endpoints::SNACKS,
            ProductKind::Creatina => endpoints::CREATINAS,
            ProductKind::Aminoacido => endpoints::AMINOACIDOS,
            ProductKind::Vitamina => endpoints::VITAMINAS,
        }
    }

    fn item_path(self, id: u64) -> String {
        format!("{}{id}/", self.path())
    }
}

/// A catalog product.
///
/// `sabor` and `peso` only exist for some categories; image fields hold
/// CDN URLs. Prices are integer CLP.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: u64,
    pub nombre: String,
    #[serde(default)]
    pub sabor: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub peso: Option<String>,
    #[serde(default)]
    pub fecha_vencimiento: Option<String>,
    pub precio: u32,
    pub stock: i32,
    #[serde(default)]
    pub imagen: Option<String>,
    #[serde(default)]
    pub imagen_nutricional: Option<String>,
}

/// Fields for creating or replacing a product (admin only).
#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sabor: Option<String>,
    pub tipo: String,
    /// ISO date, e.g. `2027-01-31`
    pub fecha_vencimiento: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peso: Option<String>,
    pub precio: u32,
    pub stock: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen_nutricional: Option<String>,
}

impl ApiClient {
    /// List all products of a category. Public.
    pub async fn products(&self, kind: ProductKind) -> Result<Vec<Product>, ApiError> {
        self.execute_json(ApiRequest::get(kind.path()).public())
            .await
    }

    /// Fetch one product. Public.
    pub async fn product(&self, kind: ProductKind, id: u64) -> Result<Product, ApiError> {
        self.execute_json(ApiRequest::get(kind.item_path(id)).public())
            .await
    }

    /// Create a product. Requires an admin session.
    pub async fn create_product(
        &self,
        kind: ProductKind,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        self.execute_json(ApiRequest::post(kind.path()).body(input)?)
            .await
    }

    /// Replace a product. Requires an admin session.
    pub async fn update_product(
        &self,
        kind: ProductKind,
        id: u64,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        self.execute_json(ApiRequest::put(kind.item_path(id)).body(input)?)
            .await
    }

    /// Delete a product. Requires an admin session.
    pub async fn delete_product(&self, kind: ProductKind, id: u64) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(kind.item_path(id))).await?;
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_router_path() {
        assert_eq!(ProductKind::Proteina.path(), "/api/proteinas/");
        assert_eq!(ProductKind::Vitamina.path(), "/api/vitaminas/");
        assert_eq!(ProductKind::Snack.item_path(7), "/api/snacks/7/");
    }

    #[test]
    fn product_deserializes_without_optional_fields() {
        let json = r#"{
            "id": 1,
            "nombre": "Creatina Monohidrato",
            "precio": 19990,
            "stock": 12
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.nombre, "Creatina Monohidrato");
        assert!(product.sabor.is_none());
        assert!(product.imagen.is_none());
    }

    #[test]
    fn product_input_omits_absent_fields() {
        let input = ProductInput {
            nombre: "Whey 2lb".into(),
            sabor: Some("Vainilla".into()),
            tipo: "Whey".into(),
            fecha_vencimiento: "2027-01-31".into(),
            peso: None,
            precio: 29990,
            stock: 5,
            imagen: None,
            imagen_nutricional: None,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["sabor"], "Vainilla");
        assert!(value.get("peso").is_none());
        assert!(value.get("imagen").is_none());
    }
}
