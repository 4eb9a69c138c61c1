pub mod get;
pub mod set;
pub mod delete;
pub mod passthrough;
pub mod health;

pub use get::get_dict_handler;
pub use set::set_entry_handler;
pub use delete::delete_entry_handler;
pub use passthrough::{delete_record_handler, list_records_handler, put_record_handler};
pub use health::health_handler;
