//! Value Objects for the marketplace

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every listing, order and donation on the marketplace is priced in rupees.
pub const CURRENCY: &str = "PKR";

/// Money value object (Pakistani rupees)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn zero() -> Self { Self(Decimal::ZERO) }
    pub fn from_major(rupees: i64) -> Self { Self(Decimal::from(rupees)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }
    pub fn is_negative(&self) -> bool { self.0.is_sign_negative() && !self.0.is_zero() }
    pub fn add(&self, other: Money) -> Money { Money(self.0 + other.0) }
    pub fn sub(&self, other: Money) -> Money { Money(self.0 - other.0) }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }

    /// `percent` of this amount, e.g. `percent(10)` of Rs. 1,500 is Rs. 150.
    pub fn percent(&self, percent: Decimal) -> Money { Money(self.0 * percent / Decimal::ONE_HUNDRED) }

    pub fn clamp_non_negative(self) -> Money { if self.0 < Decimal::ZERO { Money::zero() } else { self } }

    pub fn min(self, other: Money) -> Money { if other.0 < self.0 { other } else { self } }

    /// Storefront rendering: `Rs. 12,500`, `Rs. 99.5`.
    pub fn display(&self) -> String {
        let rounded = self.0.round_dp(2).normalize();
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i.to_string(), Some(f.to_string())),
            None => (text, None),
        };
        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 { grouped.push(','); }
            grouped.push(ch);
        }
        let sign = if negative { "-" } else { "" };
        match frac_part {
            Some(f) => format!("Rs. {sign}{grouped}.{f}"),
            None => format!("Rs. {sign}{grouped}"),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.display()) }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::zero(), |acc, m| acc.add(m)) }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self { Money(d) }
}

/// Quantity value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    /// `None` when fewer than `other` are left.
    pub fn subtract(&self, other: u32) -> Option<Self> { self.0.checked_sub(other).map(Self) }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add() {
        let a = Money::from_major(100);
        let b = Money::from_major(50);
        assert_eq!(a.add(b).amount(), Decimal::new(150, 0));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_major(89999).display(), "Rs. 89,999");
        assert_eq!(Money::from_major(145000).display(), "Rs. 145,000");
        assert_eq!(Money::from_major(500).display(), "Rs. 500");
        assert_eq!(Money::new(Decimal::new(99950, 2)).display(), "Rs. 999.5");
        assert_eq!(Money::from_major(1234567).to_string(), "Rs. 1,234,567");
        assert_eq!(Money::zero().display(), "Rs. 0");
    }

    #[test]
    fn test_percent_and_clamp() {
        assert_eq!(Money::from_major(1500).percent(Decimal::from(10)), Money::from_major(150));
        assert_eq!(Money::from_major(100).sub(Money::from_major(300)).clamp_non_negative(), Money::zero());
    }

    #[test]
    fn test_quantity() {
        let q = Quantity::new(3);
        assert_eq!(q.add(2).value(), 5);
        assert_eq!(Quantity::new(u32::MAX).add(1).value(), u32::MAX);
        assert!(q.subtract(4).is_none());
        assert_eq!(q.subtract(1), Some(Quantity::new(2)));
        assert!(q.subtract(3).is_some_and(|left| left.is_zero()));
        assert!(!q.is_zero());
        assert!(Quantity::default().is_zero());
    }
}
