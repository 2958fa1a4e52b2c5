//! Demand: how many values a subscriber currently permits.

use std::{
  fmt::{Display, Formatter},
  ops::{Add, AddAssign},
};

/// Number of values a subscriber permits its publisher to emit.
///
/// Demand is either a finite count or unlimited. Adding demand saturates and
/// an unlimited demand absorbs every addition, so a subscriber that once asks
/// for everything keeps receiving everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Demand(Option<usize>);

impl Demand {
  /// No further values.
  pub const NONE: Demand = Demand(Some(0));

  /// As many values as the publisher can produce.
  pub const UNLIMITED: Demand = Demand(None);

  /// At most `n` values.
  #[inline]
  pub const fn max(n: usize) -> Self { Demand(Some(n)) }

  #[inline]
  pub fn is_unlimited(&self) -> bool { self.0.is_none() }

  #[inline]
  pub fn is_zero(&self) -> bool { self.0 == Some(0) }

  /// Consume one unit of demand, returning `false` when none was left.
  pub(crate) fn take_one(&mut self) -> bool {
    match &mut self.0 {
      None => true,
      Some(0) => false,
      Some(n) => {
        *n -= 1;
        true
      }
    }
  }
}

impl Default for Demand {
  fn default() -> Self { Demand::NONE }
}

impl Add for Demand {
  type Output = Demand;

  fn add(self, rhs: Demand) -> Demand {
    match (self.0, rhs.0) {
      (Some(a), Some(b)) => Demand(Some(a.saturating_add(b))),
      _ => Demand::UNLIMITED,
    }
  }
}

impl AddAssign for Demand {
  fn add_assign(&mut self, rhs: Demand) { *self = *self + rhs; }
}

impl Display for Demand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.0 {
      None => write!(f, "unlimited"),
      Some(n) => write!(f, "max({n})"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn unlimited_absorbs() {
    assert_eq!(Demand::UNLIMITED + Demand::max(3), Demand::UNLIMITED);
    assert_eq!(Demand::max(3) + Demand::UNLIMITED, Demand::UNLIMITED);
    assert_eq!(Demand::max(usize::MAX) + Demand::max(1), Demand::max(usize::MAX));
  }

  #[rxcombine_macro::test]
  fn take_one_counts_down() {
    let mut demand = Demand::max(2);
    assert!(demand.take_one());
    assert!(demand.take_one());
    assert!(!demand.take_one());
    assert!(demand.is_zero());

    let mut unlimited = Demand::UNLIMITED;
    for _ in 0..100 {
      assert!(unlimited.take_one());
    }
    assert!(unlimited.is_unlimited());
  }

  #[rxcombine_macro::test]
  fn display() {
    assert_eq!(Demand::max(4).to_string(), "max(4)");
    assert_eq!(Demand::UNLIMITED.to_string(), "unlimited");
  }
}
