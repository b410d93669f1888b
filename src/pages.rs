//! HTML for the portfolio and blog pages.
//!
//! Pages are plain strings spliced into `layout.html`. Anything that comes
//! from posts or `portfolio.toml` goes through [`esc`] or [`attr`] first.

use std::fmt::Write;

use htmlescape::{encode_attribute, encode_minimal};

use crate::content_loader::SiteContent;
use crate::helpers::{estimate_read, format_display_date};
use crate::hot_reload::HOT_RELOAD_SCRIPT;
use crate::markdown::{render_article_html, Highlighter};
use crate::models::{Post, PostMeta};
use crate::portfolio::{Experience, Portfolio, Project};

fn esc(text: &str) -> String {
    encode_minimal(text)
}

fn attr(text: &str) -> String {
    encode_attribute(text)
}

/// Replaces `{{ key }}` placeholders in one pass, so substituted values are
/// never scanned again. Unknown placeholders are kept as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

pub fn render_with_layout(site: &SiteContent, title: &str, content: &str, is_development: bool) -> String {
    let page = fill_template(
        &site.layout_html,
        &[
            ("title", &esc(title)),
            ("banner", &site.banner_html),
            ("content", content),
        ],
    );

    if is_development {
        page.replacen("</body>", &format!("{}</body>", HOT_RELOAD_SCRIPT), 1)
    } else {
        page
    }
}

pub fn not_found_body(site: &SiteContent, slug: &str) -> String {
    fill_template(&site.not_found_html, &[("slug", &esc(slug))])
}

fn tag_list(tags: &[String]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut html = String::from("<ul class=\"tags\">");
    for tag in tags {
        let _ = write!(html, "<li class=\"tag\">{}</li>", esc(tag));
    }
    html.push_str("</ul>");
    html
}

/// Card used by the home page and the blog index. Read time is estimated
/// from the summary, since listings never load post bodies.
fn post_card(post: &PostMeta, class: &str) -> String {
    format!(
        "<a class=\"{class}\" href=\"/blog/{slug}\">\
<div class=\"post-meta\"><time datetime=\"{datetime}\">{date}</time><span class=\"read-time\">{read}</span></div>\
<h3>{title}</h3><p>{summary}</p>{tags}</a>",
        slug = esc(&post.slug),
        datetime = esc(&post.date),
        date = esc(&format_display_date(&post.date)),
        read = esc(&estimate_read(&post.summary)),
        title = esc(&post.title),
        summary = esc(&post.summary),
        tags = tag_list(&post.tags),
    )
}

fn project_card(project: &Project) -> String {
    let mut links = String::new();
    if let Some(link) = &project.link {
        let _ = write!(links, "<a href=\"{}\" rel=\"noopener\">Visit</a>", attr(link));
    }
    if let Some(github) = &project.github {
        let _ = write!(links, "<a href=\"{}\" rel=\"noopener\">Source</a>", attr(github));
    }
    format!(
        "<article class=\"project\"><h3>{}</h3><p>{}</p>{}<div class=\"project-links\">{}</div></article>",
        esc(&project.title),
        esc(&project.description),
        tag_list(&project.tags),
        links
    )
}

fn timeline_entry(entry: &Experience) -> String {
    format!(
        "<li class=\"timeline-entry {kind}\"><h3>{title}</h3>\
<p class=\"timeline-org\">{company}</p><p class=\"timeline-when\">{period}{location}</p><p>{description}</p></li>",
        kind = entry.kind.as_str(),
        title = esc(&entry.title),
        company = esc(&entry.company),
        period = esc(&entry.period),
        location = if entry.location.is_empty() {
            String::new()
        } else {
            format!(" · {}", esc(&entry.location))
        },
        description = esc(&entry.description),
    )
}

fn hero_section(portfolio: &Portfolio) -> String {
    let hero = &portfolio.hero;
    format!(
        "<section id=\"hero\"><h1>{}</h1><p class=\"headline\">{}</p><p class=\"tagline\">{}</p>\
<a class=\"button\" href=\"#projects\">View projects</a></section>",
        esc(&hero.name),
        esc(&hero.headline),
        esc(&hero.tagline)
    )
}

fn about_section(portfolio: &Portfolio) -> String {
    let mut html = String::from("<section id=\"about\"><h2>About</h2>");
    for paragraph in &portfolio.about.paragraphs {
        let _ = write!(html, "<p>{}</p>", esc(paragraph));
    }
    if !portfolio.about.skills.is_empty() {
        html.push_str("<h3>Skills</h3>");
        html.push_str(&tag_list(&portfolio.about.skills));
    }
    html.push_str("</section>");
    html
}

fn contact_section(portfolio: &Portfolio) -> String {
    let contact = &portfolio.contact;
    let mut html = String::from("<section id=\"contact\"><h2>Contact</h2>");
    if let Some(email) = &contact.email {
        let _ = write!(
            html,
            "<p><a href=\"mailto:{}\">{}</a></p>",
            attr(email),
            esc(email)
        );
    }
    if let Some(location) = &contact.location {
        let _ = write!(html, "<p class=\"location\">{}</p>", esc(location));
    }
    if !contact.links.is_empty() {
        html.push_str("<ul class=\"social\">");
        for link in &contact.links {
            let _ = write!(
                html,
                "<li><a href=\"{}\" rel=\"noopener\">{}</a></li>",
                attr(&link.url),
                esc(&link.label)
            );
        }
        html.push_str("</ul>");
    }
    html.push_str("</section>");
    html
}

/// The latest posts, the first one featured. Empty when there are no posts.
fn blog_section(latest: &[PostMeta]) -> String {
    let Some((featured, rest)) = latest.split_first() else {
        return String::new();
    };
    let mut html = String::from(
        "<section id=\"blog\"><h2>Blog &amp; Notes</h2><a class=\"all-posts\" href=\"/blog\">All posts</a><div class=\"post-grid\">",
    );
    html.push_str(&post_card(featured, "post-card featured"));
    for post in rest {
        html.push_str(&post_card(post, "post-card"));
    }
    html.push_str("</div></section>");
    html
}

pub fn home_body(portfolio: &Portfolio, latest: &[PostMeta]) -> String {
    let mut html = String::new();
    html.push_str(&hero_section(portfolio));
    html.push_str(&about_section(portfolio));

    html.push_str("<section id=\"projects\"><h2>Projects</h2><div class=\"project-grid\">");
    for project in &portfolio.projects {
        html.push_str(&project_card(project));
    }
    html.push_str("</div></section>");

    html.push_str("<section id=\"experience\"><h2>Experience</h2><ol class=\"timeline\">");
    for entry in &portfolio.experience {
        html.push_str(&timeline_entry(entry));
    }
    html.push_str("</ol></section>");

    html.push_str(&blog_section(latest));
    html.push_str(&contact_section(portfolio));
    html
}

pub fn blog_index_body(posts: &[PostMeta]) -> String {
    let mut html = String::from(
        "<section class=\"blog-index\"><h1>Blog</h1><a href=\"/#blog\">Home page</a><div class=\"post-grid\">",
    );
    for post in posts {
        html.push_str(&post_card(post, "post-card"));
    }
    html.push_str("</div></section>");
    html
}

pub fn post_body(post: &Post, highlighter: &Highlighter) -> String {
    let meta = &post.meta;
    format!(
        "<article class=\"post\"><a href=\"/blog\">All posts</a><header><h1>{title}</h1>\
<div class=\"post-meta\"><time datetime=\"{datetime}\">{date}</time><span class=\"read-time\">{read}</span>{tags}</div></header>\
<div class=\"prose\">{body}</div></article>",
        title = esc(&meta.title),
        datetime = esc(&meta.date),
        date = esc(&format_display_date(&meta.date)),
        read = esc(&estimate_read(&post.content)),
        tags = tag_list(&meta.tags),
        body = render_article_html(&post.content, highlighter),
    )
}
