use serde::{Deserialize, Serialize};

use crate::models::{
    Category, Client, Project, Storie,
    contact::{NewContact, SUBJECT_CHOICES, subject_label},
};
use crate::utils::validation::{self, FieldErrors};

/// 所有公开页面共用的数据
#[derive(Debug, Serialize)]
pub struct SiteContext {
    pub site_name: String,
    pub phone_number: Option<String>,
    pub phone_number_two: Option<String>,
    pub categories: Vec<Category>,
    pub projects: Vec<Project>,
    pub clients: Vec<Client>,
    pub stories: Vec<Storie>,
}

#[derive(Debug, Serialize)]
pub struct SubjectChoice {
    pub id: i32,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    #[serde(flatten)]
    pub site: SiteContext,
    pub subjects: Vec<SubjectChoice>,
}

pub fn subject_choices() -> Vec<SubjectChoice> {
    SUBJECT_CHOICES
        .iter()
        .map(|(id, label)| SubjectChoice { id: *id, label: *label })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<NewContact, FieldErrors> {
        let mut errors = FieldErrors::new();

        if validation::required(&mut errors, "fullname", &self.fullname) {
            validation::length(
                &mut errors,
                "fullname",
                self.fullname.trim(),
                4,
                80,
                "Le nom doit contenir entre 4 et 80 caractères.",
            );
        }
        if validation::required(&mut errors, "email", &self.email)
            && validation::length(
                &mut errors,
                "email",
                self.email.trim(),
                4,
                80,
                "L'adresse email doit contenir entre 4 et 80 caractères.",
            )
        {
            validation::email(&mut errors, "email", &self.email);
        }
        if validation::required(&mut errors, "phone", &self.phone) {
            validation::length(
                &mut errors,
                "phone",
                self.phone.trim(),
                4,
                15,
                "Le numéro doit contenir entre 4 et 15 caractères.",
            );
        }
        let subject = self.subject.trim().parse::<i32>().ok().and_then(subject_label);
        if subject.is_none() {
            errors.add("subject", "Choisissez un sujet valide.");
        }
        validation::required(&mut errors, "message", &self.message);

        errors.into_result()?;

        Ok(NewContact {
            fullname: self.fullname.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.trim().to_string(),
            subject: subject.unwrap_or_default().to_string(),
            message: self.message.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SitemapUrl {
    pub loc: String,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// 公开页面（不带参数的 GET 路由）
pub const PUBLIC_PAGES: [&str; 3] = ["/", "/at-etablissement", "/at-services"];

pub fn sitemap_urls(host_base: &str) -> Vec<SitemapUrl> {
    PUBLIC_PAGES
        .iter()
        .map(|path| SitemapUrl {
            loc: format!("{}{}", host_base, path),
            changefreq: "weekly",
            priority: "0.9",
        })
        .collect()
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render_sitemap(urls: &[SitemapUrl]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <changefreq>{}</changefreq>\n    \
             <priority>{}</priority>\n  </url>\n",
            escape_xml(&url.loc),
            url.changefreq,
            url.priority
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn robots_txt() -> String {
    let disallow = ["/contact/", "/admin/"]
        .iter()
        .map(|path| format!("Disallow: {}", path))
        .collect::<Vec<_>>()
        .join("\n");
    format!("User-Agent: *\n{}\n", disallow)
}
