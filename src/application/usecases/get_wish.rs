use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{errors::DispatchError, models::Wish, repositories::WishRepository};

pub struct GetWishUseCase {
    repo: Arc<dyn WishRepository>,
}

impl GetWishUseCase {
    pub fn new(repo: Arc<dyn WishRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, wish_id: Uuid) -> Result<Wish, DispatchError> {
        self.repo
            .get(wish_id)
            .await?
            .ok_or(DispatchError::NotFound(wish_id))
    }
}
