use serde::Deserialize;

/// Everything on the home page that is not a blog post, from `portfolio.toml`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Portfolio {
    pub hero: Hero,
    pub about: About,
    pub projects: Vec<Project>,
    pub experience: Vec<Experience>,
    pub contact: Contact,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Hero {
    pub name: String,
    pub headline: String,
    pub tagline: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct About {
    pub paragraphs: Vec<String>,
    pub skills: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub link: Option<String>,
    pub github: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    #[default]
    Work,
    Education,
}

impl ExperienceKind {
    pub fn as_str(&self) -> &str {
        match self {
            ExperienceKind::Work => "work",
            ExperienceKind::Education => "education",
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Experience {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    pub period: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: ExperienceKind,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Contact {
    pub email: Option<String>,
    pub location: Option<String>,
    pub links: Vec<ContactLink>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ContactLink {
    pub label: String,
    pub url: String,
}
