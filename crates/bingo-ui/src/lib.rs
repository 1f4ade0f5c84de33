use askama::Template;
use bingo_core::board::Board;

/// One entry of the viewer's mode switcher.
#[derive(Debug, Clone)]
pub struct ModeLink {
    pub name: String,
    pub href: String,
    pub current: bool,
}

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate<'a> {
    pub heading: &'a str,
    pub board: &'a Board,
    pub has_tooltips: bool,
    pub modes: &'a [ModeLink],
    pub new_card_href: &'a str,
    pub external_link: &'a str,
    pub external_link_text: &'a str,
}

#[derive(Template)]
#[template(path = "missing.html")]
pub struct MissingTemplate<'a> {
    pub slug: &'a str,
    pub can_create: bool,
}

#[derive(Template)]
#[template(path = "denied.html")]
pub struct DeniedTemplate<'a> {
    pub slug: &'a str,
    pub owner: &'a str,
}
