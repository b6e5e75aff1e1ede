//! Core data model: products, stock records, and the cart itself.

use serde::{Deserialize, Serialize};

/// Catalog product as returned by the product lookup endpoint.
///
/// Carries no quantity; a quantity is attached when the product becomes a
/// [`CartItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub image: String,
}

/// A single cart line: a product plus the quantity currently selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub image: String,
    pub amount: u32,
}

impl CartItem {
    /// Build a cart line from a catalog product and a quantity.
    #[must_use]
    pub fn new(product: Product, amount: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
        }
    }

    /// Line total (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.amount)
    }
}

/// Remote-authoritative available quantity for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: u64,
    pub amount: u32,
}

/// Ordered collection of cart lines.
///
/// Invariants: at most one line per product id, and every line's amount is at
/// least 1. The serialized form is the bare sequence of lines; this is also
/// the shape persisted to the blob store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(Vec<CartItem>);

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Look up the line for a product id.
    #[must_use]
    pub fn get(&self, product_id: u64) -> Option<&CartItem> {
        self.0.iter().find(|item| item.id == product_id)
    }

    /// Number of distinct lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.0.iter()
    }

    /// The lines as a slice, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.0
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.0.iter().map(|item| item.amount).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.0.iter().map(CartItem::line_total).sum()
    }

    /// Append a new line. The caller is responsible for ensuring no line with
    /// the same product id already exists.
    pub fn push(&mut self, item: CartItem) {
        debug_assert!(self.get(item.id).is_none(), "duplicate cart line");
        self.0.push(item);
    }

    /// Set the quantity of the line matching `product_id`, leaving all other
    /// lines untouched. Returns whether a line matched.
    pub fn set_amount(&mut self, product_id: u64, amount: u32) -> bool {
        match self.0.iter_mut().find(|item| item.id == product_id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove the line for `product_id`, returning it if present.
    pub fn remove(&mut self, product_id: u64) -> Option<CartItem> {
        let index = self.0.iter().position(|item| item.id == product_id)?;
        Some(self.0.remove(index))
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
