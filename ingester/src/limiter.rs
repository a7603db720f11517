//! Admission control for new traces.
//!
//! The limiter is consulted once per trace, at creation time: appends to
//! an existing live trace are never limited. It fails closed — a tenant
//! at or over its configured limit cannot create new traces until the
//! next cut pass drains the live map.

use shared::config::LimitOverrides;
use thiserror::Error;

/// Errors returned by admission checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitError {
    /// The tenant is at or over its live-trace limit.
    #[error("max live traces per tenant ({limit}) exceeded for tenant {tenant}")]
    MaxTracesPerTenantExceeded {
        /// The tenant that hit the limit.
        tenant: String,
        /// The limit in effect for that tenant.
        limit: usize,
    },
}

/// Per-tenant admission check backed by a limit overrides table.
///
/// In a sharded deployment the effective limit may be derived from a
/// global quota divided across healthy replicas; here the limit is read
/// directly from the overrides.
#[derive(Debug, Clone)]
pub struct Limiter {
    overrides: LimitOverrides,
}

impl Limiter {
    /// Creates a new limiter reading from the given overrides.
    #[must_use]
    pub fn new(overrides: LimitOverrides) -> Self {
        Self { overrides }
    }

    /// Asserts that the tenant may create one more live trace.
    ///
    /// `live_count` is the tenant's current number of live traces; the
    /// check fails when it is at or over the configured limit.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::MaxTracesPerTenantExceeded`] when the tenant
    /// is at capacity.
    pub fn assert_max_traces_per_tenant(
        &self,
        tenant: &str,
        live_count: usize,
    ) -> Result<(), LimitError> {
        let limit = self.overrides.limits_for(tenant).max_traces_per_tenant;
        if live_count >= limit {
            return Err(LimitError::MaxTracesPerTenantExceeded {
                tenant: tenant.to_string(),
                limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::config::TenantLimits;

    fn limiter(limit: usize) -> Limiter {
        Limiter::new(LimitOverrides::new(TenantLimits {
            max_traces_per_tenant: limit,
        }))
    }

    #[test]
    fn test_under_limit_is_admitted() {
        assert!(limiter(3).assert_max_traces_per_tenant("fake", 2).is_ok());
    }

    #[test]
    fn test_at_limit_is_rejected() {
        let err = limiter(3)
            .assert_max_traces_per_tenant("fake", 3)
            .unwrap_err();
        assert_eq!(
            err,
            LimitError::MaxTracesPerTenantExceeded {
                tenant: "fake".to_string(),
                limit: 3,
            }
        );
    }

    #[test]
    fn test_override_applies_per_tenant() {
        let limiter = Limiter::new(
            LimitOverrides::new(TenantLimits {
                max_traces_per_tenant: 100,
            })
            .with_tenant_override(
                "fake",
                TenantLimits {
                    max_traces_per_tenant: 1,
                },
            ),
        );

        assert!(limiter.assert_max_traces_per_tenant("fake", 1).is_err());
        assert!(limiter.assert_max_traces_per_tenant("other", 1).is_ok());
    }
}
