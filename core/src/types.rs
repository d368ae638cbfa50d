//! Shared primitive types used across the engine.

/// A tenant identifier — one tenant per retail chain snapshot.
pub type TenantId = String;

/// A stable customer identifier within a tenant.
pub type CustomerId = String;

/// A stable product identifier within a tenant.
pub type ProductId = String;
