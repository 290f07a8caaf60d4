mod health;
mod page;
mod url;

pub use health::health_handler;
pub use page::{index_page_handler, shorten_form_handler};
pub use url::{create_url_handler, get_url_handler, redirect_handler};
