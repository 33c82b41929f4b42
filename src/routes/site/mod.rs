mod handler;
mod model;

pub use handler::{about, home, robots, services, sitemap, submit_contact};
pub use model::{ContactForm, PUBLIC_PAGES, render_sitemap, robots_txt, sitemap_urls};
