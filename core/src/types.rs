//! Shared primitive types used across the planner.

/// Identifier of the user who owns accounts, strategies and tasks.
pub type UserId = String;

/// A stable, unique identifier for any stored entity.
pub type EntityId = String;

/// Account group label. The empty string means "all accounts".
pub type GroupLabel = String;

/// Cycle number. Cycles are numbered from 1 per (user, group) scope.
pub type Cycle = u32;
