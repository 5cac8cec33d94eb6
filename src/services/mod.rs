pub mod carts;
pub mod categories;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod users;

pub use carts::CartService;
pub use categories::CategoryService;
pub use invoices::InvoiceService;
pub use orders::OrderService;
pub use products::ProductService;
pub use users::UserService;
