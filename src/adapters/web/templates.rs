//! HTML templates using Askama.

use askama::Template;

/// Full-page layout around a page fragment.
#[derive(Template)]
#[template(path = "base.html")]
pub struct BasePage<'a> {
    pub title: &'a str,
    pub nav: &'a str,
    pub sidebar: &'a str,
    pub content: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
