use std::fmt;

use shared::domain::DishRecord;

use crate::cart::Cart;

/// Sum of known prices; `approximate` means at least one selected dish had no
/// numeric price, so `amount` is only a lower bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderTotal {
    pub amount: u64,
    pub approximate: bool,
}

impl fmt::Display for OrderTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "¥{}", format_yen(self.amount))?;
        if self.approximate {
            f.write_str("+?")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub dish: DishRecord,
    pub quantity: u32,
    pub line_total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSummary {
    pub lines: Vec<OrderLine>,
    pub item_count: u64,
    pub total: OrderTotal,
}

pub fn order_total(dishes: &[DishRecord], cart: &Cart) -> OrderTotal {
    summarize(dishes, cart).total
}

/// Selected dishes in menu order with their line totals.
pub fn summarize(dishes: &[DishRecord], cart: &Cart) -> OrderSummary {
    let mut summary = OrderSummary::default();

    for dish in dishes {
        let quantity = cart.quantity(dish.id);
        if quantity == 0 {
            continue;
        }

        let line_total = dish
            .price
            .amount()
            .and_then(|price| price.checked_mul(u64::from(quantity)));
        match line_total.and_then(|line| summary.total.amount.checked_add(line)) {
            Some(amount) => summary.total.amount = amount,
            None => summary.total.approximate = true,
        }

        summary.item_count += u64::from(quantity);
        summary.lines.push(OrderLine {
            dish: dish.clone(),
            quantity,
            line_total,
        });
    }

    summary
}

/// `1600` -> `"1,600"`.
pub fn format_yen(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
