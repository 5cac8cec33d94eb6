pub mod cart_item;
pub mod category;
pub mod invoice;
pub mod order;
pub mod order_detail;
pub mod product;
pub mod user;

pub use cart_item::Entity as CartItem;
pub use category::Entity as Category;
pub use invoice::Entity as Invoice;
pub use order::Entity as Order;
pub use order_detail::Entity as OrderDetail;
pub use product::Entity as Product;
pub use user::Entity as User;
