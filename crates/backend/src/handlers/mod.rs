pub mod a001_uzum_order_item;
pub mod a002_local_product;
pub mod d001_unit_economics;
pub mod u001_sync_uzum;
