//! Per-tenant admission limits.
//!
//! Defines the limits the ingester's admission check reads: a global
//! default plus optional per-tenant overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Limits applied to a single tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantLimits {
    /// Maximum number of live (not yet cut) traces a tenant may hold.
    pub max_traces_per_tenant: usize,
}

impl Default for TenantLimits {
    fn default() -> Self {
        Self {
            max_traces_per_tenant: 10_000,
        }
    }
}

/// Per-tenant limit overrides with a global default.
///
/// # Examples
///
/// ```
/// use shared::config::{LimitOverrides, TenantLimits};
///
/// let overrides = LimitOverrides::new(TenantLimits {
///     max_traces_per_tenant: 100,
/// })
/// .with_tenant_override("noisy-tenant", TenantLimits {
///     max_traces_per_tenant: 10,
/// });
///
/// assert_eq!(overrides.limits_for("noisy-tenant").max_traces_per_tenant, 10);
/// assert_eq!(overrides.limits_for("quiet-tenant").max_traces_per_tenant, 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOverrides {
    /// Limits applied to tenants without an explicit override.
    pub defaults: TenantLimits,

    /// Per-tenant overrides, keyed by tenant ID.
    #[serde(default)]
    pub per_tenant: HashMap<String, TenantLimits>,
}

impl LimitOverrides {
    /// Creates a new overrides table with the given defaults.
    #[must_use]
    pub fn new(defaults: TenantLimits) -> Self {
        Self {
            defaults,
            per_tenant: HashMap::new(),
        }
    }

    /// Adds an override for a specific tenant.
    #[must_use]
    pub fn with_tenant_override(mut self, tenant: impl Into<String>, limits: TenantLimits) -> Self {
        self.per_tenant.insert(tenant.into(), limits);
        self
    }

    /// Returns the limits in effect for the given tenant.
    #[must_use]
    pub fn limits_for(&self, tenant: &str) -> TenantLimits {
        self.per_tenant
            .get(tenant)
            .copied()
            .unwrap_or(self.defaults)
    }

    /// Validates the configured limits.
    ///
    /// # Errors
    ///
    /// Returns an error if any limit (default or override) is zero, which
    /// would reject every push for the affected tenants.
    pub fn validate(&self) -> Result<(), String> {
        if self.defaults.max_traces_per_tenant == 0 {
            return Err("default max_traces_per_tenant must be greater than zero".to_string());
        }
        for (tenant, limits) in &self.per_tenant {
            if limits.max_traces_per_tenant == 0 {
                return Err(format!(
                    "max_traces_per_tenant for tenant {tenant} must be greater than zero"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_for_falls_back_to_default() {
        let overrides = LimitOverrides::new(TenantLimits {
            max_traces_per_tenant: 50,
        });

        assert_eq!(overrides.limits_for("anyone").max_traces_per_tenant, 50);
    }

    #[test]
    fn test_limits_for_uses_override() {
        let overrides = LimitOverrides::new(TenantLimits {
            max_traces_per_tenant: 50,
        })
        .with_tenant_override(
            "fake",
            TenantLimits {
                max_traces_per_tenant: 1,
            },
        );

        assert_eq!(overrides.limits_for("fake").max_traces_per_tenant, 1);
        assert_eq!(overrides.limits_for("other").max_traces_per_tenant, 50);
    }

    #[test]
    fn test_validate_rejects_zero_default() {
        let overrides = LimitOverrides::new(TenantLimits {
            max_traces_per_tenant: 0,
        });

        assert!(overrides.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_override() {
        let overrides = LimitOverrides::default().with_tenant_override(
            "fake",
            TenantLimits {
                max_traces_per_tenant: 0,
            },
        );

        assert!(overrides.validate().is_err());
    }
}
