//! Aggregates module
pub mod analytics;
pub mod cart;
pub mod customer;
pub mod inventory;
pub mod order;
pub mod product;
pub mod wishlist;

pub use analytics::{AnalyticsEvent, AnalyticsReport, DashboardStats, EventType};
pub use cart::{AbandonedCart, AbandonedCartStats, Cart, CartItem, CartLine};
pub use customer::{Customer, CustomerStats, Segment};
pub use inventory::{AlertType, InventoryAlert, InventorySummary, InventoryTransaction, StockChange, TransactionType};
pub use order::{CheckoutDetails, Contact, Order, OrderStats, OrderStatus, PaymentStatus, ShippingAddress};
pub use product::{Category, Product, Variant};
pub use wishlist::{Wishlist, WishlistEntry};
