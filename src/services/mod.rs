//! Storefront managers
//!
//! Each manager owns one area of behaviour and talks to storage only through
//! the repository traits. [`Storefront`] wires them together over one set of
//! repositories and one event publisher.

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod customer;
pub mod inventory;
pub mod order;
pub mod wishlist;

use std::sync::Arc;
use crate::domain::events::EventPublisher;
use crate::domain::repositories::{
    AnalyticsRepository, CartRepository, CatalogRepository, CustomerRepository,
    InventoryRepository, OrderRepository, WishlistRepository,
};

pub use analytics::AnalyticsService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use customer::CustomerService;
pub use inventory::InventoryService;
pub use order::OrderService;
pub use wishlist::WishlistService;

#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub wishlists: Arc<dyn WishlistRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
}

impl Repositories {
    /// Every repository served by the same backing store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: CatalogRepository
            + CartRepository
            + WishlistRepository
            + InventoryRepository
            + OrderRepository
            + CustomerRepository
            + AnalyticsRepository
            + 'static,
    {
        Self {
            catalog: store.clone(),
            carts: store.clone(),
            wishlists: store.clone(),
            inventory: store.clone(),
            orders: store.clone(),
            customers: store.clone(),
            analytics: store,
        }
    }
}

#[derive(Clone)]
pub struct Storefront {
    pub catalog: CatalogService,
    pub cart: CartService,
    pub wishlist: WishlistService,
    pub inventory: InventoryService,
    pub orders: OrderService,
    pub customers: CustomerService,
    pub analytics: AnalyticsService,
}

impl Storefront {
    pub fn new(repositories: Repositories, publisher: Arc<dyn EventPublisher>) -> Self {
        let Repositories { catalog, carts, wishlists, inventory, orders, customers, analytics } = repositories;
        let cart = CartService::new(catalog.clone(), carts);
        let inventory = InventoryService::new(catalog.clone(), inventory, publisher.clone());
        let customers = CustomerService::new(customers);
        let analytics = AnalyticsService::new(analytics);
        let orders = OrderService::new(orders, cart.clone(), inventory.clone(), customers.clone(), analytics.clone(), publisher);
        Self {
            catalog: CatalogService::new(catalog.clone()),
            wishlist: WishlistService::new(catalog, wishlists),
            cart,
            inventory,
            orders,
            customers,
            analytics,
        }
    }
}
