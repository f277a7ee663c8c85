use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Product, ProductId};
use crate::domain::order::OrderItem;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

/// Client-local shopping cart. Lines keep insertion order and never hold a zero quantity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from stored lines, dropping any with a zero quantity.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines: lines.into_iter().filter(|line| line.quantity > 0).collect() }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn add_item(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }

        match self.lines.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine { product, quantity }),
        }
    }

    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product.id != product_id);
    }

    /// Sets a line's quantity; zero or below removes the line.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|line| &line.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn total_price(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| line.product.price.saturating_mul(u64::from(line.quantity)))
            .sum()
    }

    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product.id.clone(),
                name: line.product.name.clone(),
                price: line.product.price,
                quantity: line.quantity,
            })
            .collect()
    }
}
