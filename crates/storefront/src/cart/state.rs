//! Local cart contents.

use doghouse_core::{LineItem, Price, ProductId, Quantity};

/// Client-side cart.
///
/// Lines keep insertion order and there is at most one line per product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<LineItem>,
    is_open: bool,
    is_loading: bool,
}

/// What [`CartState::merge`] did with an incoming line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Merge {
    Added,
    Increased(Quantity),
}

impl CartState {
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the cart panel is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Whether a fetch or checkout is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity.get())).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: ProductId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Add `item`, or fold its quantity into the existing line for the same product.
    pub(crate) fn merge(&mut self, item: LineItem) -> Merge {
        if let Some(existing) = self.get_mut(item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            return Merge::Increased(existing.quantity);
        }
        self.items.push(item);
        Merge::Added
    }

    pub(crate) fn remove(&mut self, id: ProductId) -> Option<LineItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity of an existing line. Returns the line's name.
    pub(crate) fn set_quantity(&mut self, id: ProductId, quantity: Quantity) -> Option<String> {
        let line = self.get_mut(id)?;
        line.quantity = quantity;
        Some(line.name.clone())
    }

    /// Replace all lines, folding duplicate products together.
    pub(crate) fn replace(&mut self, items: Vec<LineItem>) {
        self.items.clear();
        for item in items {
            self.merge(item);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub(crate) const fn set_open(&mut self, open: bool) -> bool {
        let changed = self.is_open != open;
        self.is_open = open;
        changed
    }

    pub(crate) const fn set_loading(&mut self, loading: bool) -> bool {
        let changed = self.is_loading != loading;
        self.is_loading = loading;
        changed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hotdog(quantity: u32) -> LineItem {
        LineItem::new(
            ProductId::new(1),
            "Hotdog",
            Price::from_centavos(7900).unwrap(),
            Quantity::new(quantity).unwrap(),
        )
    }

    fn soda(quantity: u32) -> LineItem {
        LineItem::new(
            ProductId::new(2),
            "Soda",
            Price::from_centavos(2500).unwrap(),
            Quantity::new(quantity).unwrap(),
        )
    }

    #[test]
    fn test_merge_sums_quantities() {
        let mut cart = CartState::default();
        assert_eq!(cart.merge(hotdog(1)), Merge::Added);
        assert_eq!(
            cart.merge(hotdog(2)),
            Merge::Increased(Quantity::new(3).unwrap())
        );

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity.get(), 3);
    }

    #[test]
    fn test_totals() {
        let mut cart = CartState::default();
        cart.merge(hotdog(3));
        cart.merge(soda(2));

        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.total().to_string(), "₱287.00");
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = CartState::default();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut cart = CartState::default();
        cart.merge(hotdog(1));
        cart.merge(soda(1));
        cart.merge(LineItem::new(
            ProductId::new(3),
            "Fries",
            Price::from_centavos(4500).unwrap(),
            Quantity::ONE,
        ));

        let removed = cart.remove(ProductId::new(2)).unwrap();
        assert_eq!(removed.name, "Soda");
        let ids: Vec<i32> = cart.items().iter().map(|i| i.id.into()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(cart.remove(ProductId::new(2)).is_none());
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = CartState::default();
        assert!(cart.set_quantity(ProductId::new(9), Quantity::ONE).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_replace_folds_duplicates() {
        let mut cart = CartState::default();
        cart.merge(soda(4));
        cart.replace(vec![hotdog(1), hotdog(2)]);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert!(cart.get(ProductId::new(2)).is_none());
    }

    #[test]
    fn test_flags_report_changes() {
        let mut cart = CartState::default();
        assert!(cart.set_open(true));
        assert!(!cart.set_open(true));
        assert!(cart.is_open());
        assert!(cart.set_loading(true));
        assert!(cart.is_loading());
    }
}
