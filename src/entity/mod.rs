pub mod addresses;
pub mod cart_items;
pub mod categories;
pub mod favorites;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod stock_logs;
pub mod users;
pub mod wishlist;

pub use addresses::Entity as Addresses;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use favorites::Entity as Favorites;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use stock_logs::Entity as StockLogs;
pub use users::Entity as Users;
pub use wishlist::Entity as Wishlist;
