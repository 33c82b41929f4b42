mod handler;
mod model;

pub use handler::{
    CONTACTS_PATH, PARTNER_PATH, PROJECT_PATH, STORIE_PATH, contacts_page, create_partner,
    create_project, create_storie, delete_contact, delete_partner, delete_project, delete_storie,
    partners_page, projects_page, stories_page, update_partner, update_project, update_storie,
};
