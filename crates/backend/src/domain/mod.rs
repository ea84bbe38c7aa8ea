pub mod a001_uzum_order_item;
pub mod a002_local_product;
