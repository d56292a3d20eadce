//! Business policy constants.

use crate::DomainError;

/// Tax rate applied to the order subtotal at checkout, in percent.
pub const TAX_RATE_PERCENT: u32 = 10;

/// Default minimum quantity accepted per cart line.
///
/// Unusually high for a retail storefront; the rule predates this
/// implementation and is kept overridable rather than silently changed.
pub const DEFAULT_MIN_LINE_QUANTITY: u32 = 11;

/// Acceptance policy for cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPolicy {
    /// Smallest quantity a single cart line may order.
    pub min_line_quantity: u32,
}

impl CartPolicy {
    /// Creates a policy with an explicit minimum line quantity.
    pub fn with_min_line_quantity(min_line_quantity: u32) -> Self {
        Self { min_line_quantity }
    }

    /// A policy that accepts any positive quantity.
    pub fn permissive() -> Self {
        Self {
            min_line_quantity: 1,
        }
    }

    /// Checks a requested line quantity against the policy.
    pub fn check_quantity(&self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }
        if quantity < self.min_line_quantity {
            return Err(DomainError::Validation(format!(
                "quantity must be at least {} per line item",
                self.min_line_quantity
            )));
        }
        Ok(())
    }
}

impl Default for CartPolicy {
    fn default() -> Self {
        Self {
            min_line_quantity: DEFAULT_MIN_LINE_QUANTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_rejects_small_lines() {
        let policy = CartPolicy::default();
        assert!(policy.check_quantity(2).is_err());
        assert!(policy.check_quantity(10).is_err());
        assert!(policy.check_quantity(11).is_ok());
    }

    #[test]
    fn permissive_policy_accepts_single_units() {
        let policy = CartPolicy::permissive();
        assert!(policy.check_quantity(1).is_ok());
        assert!(policy.check_quantity(0).is_err());
    }

    #[test]
    fn zero_is_always_rejected() {
        assert!(CartPolicy::with_min_line_quantity(0).check_quantity(0).is_err());
    }
}
