//! Product catalog maintenance

use super::{CoordinatorError, CoordinatorResult, LifecycleCoordinator, require_management};
use crate::orders::money::{normalize_price, validate_price};
use crate::store::{Filter, WriteBatch, fetch, find};
use shared::models::{Actor, Product, ProductUpsert};

impl LifecycleCoordinator {
    /// Create or replace a catalog entry.
    ///
    /// Existing order lines keep the name and price they were added with.
    pub async fn upsert_product(
        &self,
        input: ProductUpsert,
        actor: &Actor,
    ) -> CoordinatorResult<Product> {
        require_management(actor, "edit catalog")?;
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CoordinatorError::validation("product name is required"));
        }
        validate_price(input.price).map_err(CoordinatorError::Validation)?;

        let existing = match input.id {
            Some(id) => fetch::<Product>(self.store.as_ref(), id).await?,
            None => None,
        };
        let mut batch = WriteBatch::new();
        let product = match existing {
            Some(current) => {
                let product = Product {
                    name,
                    price: normalize_price(input.price),
                    product_type: input.product_type,
                    available: input.available,
                    ..current
                };
                batch.save(&product)?;
                product
            }
            None => {
                let product = Product {
                    id: input.id.unwrap_or_else(|| self.next_id()),
                    name,
                    price: normalize_price(input.price),
                    product_type: input.product_type,
                    available: input.available,
                    version: 0,
                };
                batch.insert(&product)?;
                product
            }
        };
        self.commit(batch).await?;

        tracing::info!(
            product_id = product.id,
            name = %product.name,
            price = %product.price,
            available = product.available,
            "Product saved"
        );
        Ok(Product {
            version: product.version + 1,
            ..product
        })
    }

    pub async fn list_products(&self, only_available: bool) -> CoordinatorResult<Vec<Product>> {
        let filter = if only_available {
            Filter::all().eq("available", true)
        } else {
            Filter::all()
        };
        let mut products: Vec<Product> = find(self.store.as_ref(), &filter).await?;
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}
