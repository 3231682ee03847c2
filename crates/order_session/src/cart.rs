use std::collections::BTreeMap;

use shared::domain::DishId;

/// Selected quantity per dish. Never stores a zero quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    entries: BTreeMap<DishId, u32>,
}

impl Cart {
    pub fn quantity(&self, dish_id: DishId) -> u32 {
        self.entries.get(&dish_id).copied().unwrap_or(0)
    }

    /// Adds `delta` (possibly negative) and returns the new quantity, floored at zero.
    pub fn apply_delta(&mut self, dish_id: DishId, delta: i64) -> u32 {
        let current = i64::from(self.quantity(dish_id));
        let next = current
            .saturating_add(delta)
            .clamp(0, i64::from(u32::MAX)) as u32;
        if next == 0 {
            self.entries.remove(&dish_id);
        } else {
            self.entries.insert(dish_id, next);
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct dishes selected.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_items(&self) -> u64 {
        self.entries.values().map(|&qty| u64::from(qty)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DishId, u32)> + '_ {
        self.entries.iter().map(|(&id, &qty)| (id, qty))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_at_zero_is_a_noop() {
        let mut cart = Cart::default();
        assert_eq!(cart.apply_delta(DishId(1), -1), 0);
        assert!(cart.is_empty());
        assert_eq!(cart, Cart::default());
    }

    #[test]
    fn reaching_zero_removes_the_entry() {
        let mut cart = Cart::default();
        cart.apply_delta(DishId(1), 2);
        cart.apply_delta(DishId(1), -1);
        assert_eq!(cart.quantity(DishId(1)), 1);
        cart.apply_delta(DishId(1), -5);
        assert_eq!(cart.len(), 0);
    }

    #[test]
    fn random_walk_never_stores_non_positive_quantities() {
        let mut cart = Cart::default();
        let mut seed: u64 = 0x5eed;
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let dish = DishId((seed >> 33) as i64 % 5);
            let delta = ((seed >> 40) % 7) as i64 - 3;
            let before = cart.quantity(dish);
            let after = cart.apply_delta(dish, delta);
            assert_eq!(i64::from(after), (i64::from(before) + delta).max(0));
            assert!(cart.iter().all(|(_, qty)| qty > 0));
        }
    }

    #[test]
    fn total_items_sums_quantities() {
        let mut cart = Cart::default();
        cart.apply_delta(DishId(1), 2);
        cart.apply_delta(DishId(2), 3);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.len(), 2);
    }
}
