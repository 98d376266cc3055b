pub mod state;
pub mod summary;
pub mod work_item;
