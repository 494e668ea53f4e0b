//! Cart line items submitted from the Mini App.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::price::Price;

/// A single cart line as sent by the web app on checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Line subtotal (`price * quantity`).
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::new(self.price.amount() * Decimal::from(self.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_defaults_to_one() {
        let item: CartItem =
            serde_json::from_str(r#"{"id": 5, "name": "Tea", "price": 10}"#).expect("deserialize");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.subtotal(), Price::from(10));
    }

    #[test]
    fn subtotal_multiplies_by_quantity() {
        let item = CartItem {
            id: ProductId::new(5),
            name: "Tea".to_owned(),
            price: Price::from(10),
            quantity: 2,
        };
        assert_eq!(item.subtotal(), Price::from(20));
    }
}
