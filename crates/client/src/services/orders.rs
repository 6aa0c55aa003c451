use crate::client::ApiClient;
use crate::error::ApiError;
use crate::services::dto::{BarcodeQuery, BarcodeRecord, Order, OrderDetail, OrderQuery, Page};

#[derive(Debug, Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<Page<Order>, ApiError> {
        self.client.get("/orders", query).await
    }

    pub async fn detail(&self, order_id: &str) -> Result<OrderDetail, ApiError> {
        self.client.get(&format!("/orders/{order_id}"), &()).await
    }
}

/// Barcode record search.
#[derive(Debug, Clone)]
pub struct BarcodeService {
    client: ApiClient,
}

impl BarcodeService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn search(&self, query: &BarcodeQuery) -> Result<Page<BarcodeRecord>, ApiError> {
        self.client.get("/barcodes", query).await
    }
}
