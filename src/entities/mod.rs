pub mod product;
pub mod purchase_request;
pub mod purchase_request_item;
pub mod stock;
pub mod warehouse;

pub use purchase_request::PurchaseRequestStatus;
