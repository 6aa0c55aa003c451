use crate::client::ApiClient;
use crate::error::ApiError;
use crate::services::dto::{NewUser, Page, PageQuery, User, UserUpdate};

#[derive(Debug, Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<User>, ApiError> {
        self.client.get("/users", query).await
    }

    pub async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        self.client.post("/users", user).await
    }

    pub async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<User, ApiError> {
        self.client.put(&format!("/users/{user_id}"), update).await
    }

    pub async fn delete(&self, user_id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/users/{user_id}")).await?;
        Ok(())
    }
}
