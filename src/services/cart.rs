use std::collections::HashMap;
use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::{Cart, CartError, CartView, Product};
use crate::error::{MarketError, Result};

impl Marketplace {
    pub(crate) async fn load_cart(&self, user_id: Uuid) -> Result<(Cart, HashMap<Uuid, Product>)> {
        let lines = self.store.cart_lines(user_id).await?;
        let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let products = self.store.products_by_ids(&ids).await?.into_iter().map(|p| (p.id, p)).collect();
        Ok((Cart::new(user_id, lines), products))
    }

    pub async fn cart(&self, user_id: Uuid) -> Result<CartView> {
        let (cart, products) = self.load_cart(user_id).await?;
        Ok(CartView::build(&cart, &products))
    }

    pub async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: Option<i64>) -> Result<CartView> {
        let quantity = quantity.unwrap_or(1);
        let quantity = u32::try_from(quantity).ok().filter(|q| *q > 0).ok_or(MarketError::from(CartError::InvalidQuantity))?;
        let product = self.store.product(product_id).await?.ok_or(MarketError::ProductNotFound)?;
        let (mut cart, _) = self.load_cart(user_id).await?;
        let line = cart.add_item(&product, quantity)?;
        let stored = self.store.add_cart_line(&line, quantity).await?;
        tracing::info!(%user_id, %product_id, quantity = stored.quantity.value(), "cart updated");
        self.cart(user_id).await
    }

    pub async fn update_cart_quantity(&self, user_id: Uuid, line_id: Uuid, quantity: i64) -> Result<CartView> {
        let (mut cart, products) = self.load_cart(user_id).await?;
        let line = cart.line(line_id).ok_or(MarketError::CartItemNotFound)?;
        if quantity <= 0 {
            self.store.delete_cart_line(user_id, line_id).await?;
            return self.cart(user_id).await;
        }
        let product = products.get(&line.product_id).cloned().ok_or(MarketError::ProductNotFound)?;
        match cart.update_quantity(line_id, quantity, &product)? {
            Some(line) => self.store.save_cart_line(&line).await?,
            None => { self.store.delete_cart_line(user_id, line_id).await?; }
        }
        Ok(CartView::build(&cart, &products))
    }

    pub async fn remove_from_cart(&self, user_id: Uuid, line_id: Uuid) -> Result<CartView> {
        if !self.store.delete_cart_line(user_id, line_id).await? {
            return Err(MarketError::CartItemNotFound);
        }
        self.cart(user_id).await
    }

    pub async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        self.store.clear_cart(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{market, product_id};
    use super::*;
    use crate::domain::aggregates::CartLine;
    use crate::domain::value_objects::{Money, Quantity};
    use chrono::Utc;

    #[tokio::test]
    async fn test_add_merges_and_totals() {
        let m = market();
        let user = Uuid::new_v4();
        m.add_to_cart(user, product_id(2), None).await.unwrap();
        let view = m.add_to_cart(user, product_id(2), Some(2)).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total_items, 3);
        assert_eq!(view.total_price, Money::from_major(37500));
        let view = m.add_to_cart(user, product_id(4), Some(1)).await.unwrap();
        assert_eq!(view.total_price, Money::from_major(41000));
    }

    #[tokio::test]
    async fn test_stock_and_quantity_rules() {
        let m = market();
        let user = Uuid::new_v4();
        // HP laptop has 8 in stock
        let err = m.add_to_cart(user, product_id(3), Some(9)).await.unwrap_err();
        assert!(matches!(err, MarketError::InsufficientStock { available: 8 }));
        assert!(m.add_to_cart(user, product_id(3), Some(0)).await.is_err());
        assert!(matches!(m.add_to_cart(user, Uuid::new_v4(), None).await, Err(MarketError::ProductNotFound)));
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let m = market();
        let user = Uuid::new_v4();
        let view = m.add_to_cart(user, product_id(5), None).await.unwrap();
        let line = view.items[0].id;
        let view = m.update_cart_quantity(user, line, 4).await.unwrap();
        assert_eq!(view.total_items, 4);
        let view = m.update_cart_quantity(user, line, 0).await.unwrap();
        assert!(view.items.is_empty());
        assert!(m.cart(user).await.unwrap().items.is_empty());
        assert!(matches!(m.remove_from_cart(user, line).await, Err(MarketError::CartItemNotFound)));
        assert!(matches!(m.update_cart_quantity(user, line, 2).await, Err(MarketError::CartItemNotFound)));
    }

    #[tokio::test]
    async fn test_concurrent_adds_merge_into_one_line() {
        let m = market();
        let user = Uuid::new_v4();
        let (a, b) = tokio::join!(m.add_to_cart(user, product_id(2), Some(1)), m.add_to_cart(user, product_id(2), Some(2)));
        a.unwrap();
        b.unwrap();
        let view = m.cart(user).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total_items, 3);
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line_of_vanished_product() {
        let m = market();
        let user = Uuid::new_v4();
        let orphan = CartLine { id: Uuid::new_v4(), user_id: user, product_id: Uuid::new_v4(), quantity: Quantity::new(2), created_at: Utc::now() };
        m.store.save_cart_line(&orphan).await.unwrap();
        let view = m.update_cart_quantity(user, orphan.id, 0).await.unwrap();
        assert!(view.items.is_empty());
        assert!(m.store.cart_lines(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_carts_are_private() {
        let m = market();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let view = m.add_to_cart(alice, product_id(6), None).await.unwrap();
        assert!(matches!(m.remove_from_cart(bob, view.items[0].id).await, Err(MarketError::CartItemNotFound)));
        m.clear_cart(alice).await.unwrap();
        assert!(m.cart(alice).await.unwrap().items.is_empty());
    }
}
