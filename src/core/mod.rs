/// Checkout, order deletion with restock, and status changes
pub mod order;

/// The `{ok, ...}` result shape shared by storefront and admin operations
pub mod outcome;

/// Product catalog management and stock mutations
pub mod product;

/// Order status set and transition table
pub mod status;
