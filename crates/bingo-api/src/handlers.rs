//! # bingo-api Handlers
//!
//! This module coordinates the flow between HTTP requests and core logic.
//! Store failures on the read path are logged and shown as a missing page.

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use bingo_core::access::ensure_can_manage;
use bingo_core::edit::{self, group_usage, option_usage};
use bingo_core::rng::fresh_seed;
use bingo_core::traits::{AuthUser, IdentityProvider};
use bingo_core::viewer::build_viewer;
use bingo_core::{AppError, EditCommand, EditSession, PageData, PageRepo};
use bingo_ui::{BoardTemplate, DeniedTemplate, MissingTemplate, ModeLink};
use serde::{Deserialize, Serialize};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub pages: PageRepo,
    pub auth: Box<dyn IdentityProvider>,
    pub super_admins: Vec<String>,
    pub free_space_label: String,
}

/// The viewer path segment: `{slug}[&seed={seed}][&mode={modeId}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerPath {
    pub slug: String,
    pub seed: Option<String>,
    pub mode: Option<String>,
}

impl ViewerPath {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split('&');
        let slug = parts.next().unwrap_or_default().to_owned();
        let mut seed = None;
        let mut mode = None;
        for part in parts {
            match part.split_once('=') {
                Some(("seed", value)) if !value.is_empty() => seed = Some(value.to_owned()),
                Some(("mode", value)) if !value.is_empty() => mode = Some(value.to_owned()),
                _ => {}
            }
        }
        Self { slug, seed, mode }
    }

    pub fn href(slug: &str, seed: &str, mode: Option<&str>) -> String {
        match mode {
            Some(mode) => format!("/{slug}&seed={seed}&mode={mode}"),
            None => format!("/{slug}&seed={seed}"),
        }
    }
}

/// Maps a core error onto a JSON error response.
pub fn error_response(err: &AppError) -> HttpResponse {
    let status = match err {
        AppError::NotFound(..) => StatusCode::NOT_FOUND,
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Internal(_) => {
            log::error!("{}", err);
            return HttpResponse::InternalServerError().json(ErrorBody {
                error: "internal error".into(),
            });
        }
    };
    HttpResponse::build(status).json(ErrorBody { error: err.to_string() })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn render<T: Template>(status: StatusCode, template: T) -> HttpResponse {
    match template.render() {
        Ok(html) => HttpResponse::build(status).content_type("text/html; charset=utf-8").body(html),
        Err(err) => {
            log::error!("template rendering failed: {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// The bearer token of the request, if any.
pub fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub(crate) async fn signed_in_user(data: &AppState, req: &HttpRequest) -> Option<AuthUser> {
    match bearer(req) {
        Some(token) => data.auth.current_user(token).await,
        None => None,
    }
}

async fn load_page(data: &AppState, slug: &str) -> Option<PageData> {
    match data.pages.find_by_root(slug).await {
        Ok(page) => page,
        Err(err) => {
            log::error!("failed to load page {}: {}", slug, err);
            None
        }
    }
}

/// Renders the viewer board (e.g., /lydlbutton&seed=123).
/// A visit without a seed is redirected to a fresh one.
pub async fn view_page(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let target = ViewerPath::parse(&path.into_inner());

    let Some(seed) = target.seed else {
        return HttpResponse::Found()
            .insert_header((
                header::LOCATION,
                ViewerPath::href(&target.slug, &fresh_seed(), target.mode.as_deref()),
            ))
            .finish();
    };

    let Some(page) = load_page(&data, &target.slug).await else {
        return render(
            StatusCode::NOT_FOUND,
            MissingTemplate {
                slug: &target.slug,
                can_create: false,
            },
        );
    };

    let viewer = build_viewer(&page, target.mode.as_deref(), &seed, &data.free_space_label);
    let current = viewer.mode.as_ref().map(|m| m.id.as_str());
    let modes: Vec<ModeLink> = viewer
        .modes
        .iter()
        .map(|m| ModeLink {
            name: m.display_name.clone(),
            href: ViewerPath::href(&target.slug, &seed, Some(&m.id)),
            current: Some(m.id.as_str()) == current,
        })
        .collect();
    let new_card_href = ViewerPath::href(&target.slug, &fresh_seed(), target.mode.as_deref());

    render(
        StatusCode::OK,
        BoardTemplate {
            heading: &viewer.title,
            board: &viewer.board,
            has_tooltips: viewer.board.has_tooltips(),
            modes: &modes,
            new_card_href: &new_card_href,
            external_link: &page.external_link,
            external_link_text: &page.external_link_text,
        },
    )
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeListing {
    pub id: String,
    pub display_name: String,
    pub disabled: bool,
    pub is_default: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageListing {
    pub id: String,
    pub display_name: String,
    pub disabled: bool,
    /// How many parents include this entity.
    pub usage: usize,
}

/// The page as the manage UI shows it: the full tree plus sorted listings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageView {
    pub page: PageData,
    pub modes: Vec<ModeListing>,
    pub option_groups: Vec<UsageListing>,
    pub options: Vec<UsageListing>,
}

impl ManageView {
    pub fn of(page: PageData) -> Self {
        let modes = page
            .modes_by_name()
            .into_iter()
            .filter(|m| !m.deleted)
            .map(|m| ModeListing {
                id: m.id.clone(),
                display_name: m.display_name.clone(),
                disabled: m.disabled,
                is_default: m.id == page.default_mode,
            })
            .collect();
        let option_groups = page
            .option_groups_by_name()
            .into_iter()
            .filter(|g| !g.deleted)
            .map(|g| UsageListing {
                id: g.id.clone(),
                display_name: g.display_name.clone(),
                disabled: g.disabled,
                usage: group_usage(&page, &g.id),
            })
            .collect();
        let mut options: Vec<UsageListing> = page
            .options
            .values()
            .filter(|o| !o.deleted)
            .map(|o| UsageListing {
                id: o.id.clone(),
                display_name: o.display_name.clone(),
                disabled: o.disabled,
                usage: option_usage(&page, &o.id),
            })
            .collect();
        options.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        Self {
            page,
            modes,
            option_groups,
            options,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ManageRequest {
    pub commands: Vec<EditCommand>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManageResponse {
    /// Ids of entities the commands created, in order.
    pub created: Vec<String>,
    pub view: ManageView,
}

/// Loads the page behind `slug` and checks that the caller may manage it.
async fn authorize(data: &AppState, req: &HttpRequest, slug: &str) -> Result<PageData, HttpResponse> {
    let user = signed_in_user(data, req).await;
    let Some(page) = load_page(data, slug).await else {
        return Err(render(
            StatusCode::NOT_FOUND,
            MissingTemplate {
                slug,
                can_create: user.is_some(),
            },
        ));
    };
    if ensure_can_manage(user.as_ref(), &page.owner, &data.super_admins).is_err() {
        return Err(render(
            StatusCode::FORBIDDEN,
            DeniedTemplate {
                slug,
                owner: &page.owner,
            },
        ));
    }
    Ok(page)
}

/// Shows the admin view of a page (e.g., GET /lydlbutton/manage).
pub async fn manage_page(data: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    match authorize(&data, &req, &path.into_inner()).await {
        Ok(page) => HttpResponse::Ok().json(ManageView::of(page)),
        Err(denied) => denied,
    }
}

/// Applies a batch of edit commands in order and saves the result.
/// A rejected command aborts the batch before anything is written.
pub async fn apply_edits(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ManageRequest>,
) -> impl Responder {
    let page = match authorize(&data, &req, &path.into_inner()).await {
        Ok(page) => page,
        Err(denied) => return denied,
    };
    let old_root = page.root.to_lowercase();

    let mut session = EditSession::new(page);
    let created = match session.apply_all(body.into_inner().commands) {
        Ok(created) => created,
        Err(err) => return error_response(&err),
    };

    let new_root = session.page().root.to_lowercase();
    if new_root != old_root {
        match data.pages.find_by_root(&new_root).await {
            Ok(Some(existing)) if existing.owner != session.page().owner => {
                return error_response(&AppError::Conflict(format!("/{new_root} is already taken")));
            }
            Ok(_) => {}
            Err(err) => return error_response(&AppError::from(err)),
        }
    }

    if let Err(err) = session.commit(&data.pages).await {
        return error_response(&err);
    }
    log::info!("saved page {} ({} new entities)", new_root, created.len());

    HttpResponse::Ok().json(ManageResponse {
        created,
        view: ManageView::of(session.page().clone()),
    })
}

/// Creates a fresh page at `slug` owned by the signed-in user.
pub async fn create_page(data: web::Data<AppState>, req: HttpRequest, path: web::Path<String>) -> impl Responder {
    let slug = path.into_inner();
    let Some(user) = signed_in_user(&data, &req).await else {
        return error_response(&AppError::Unauthorized("sign in to create a page".into()));
    };
    if slug.trim().is_empty() {
        return error_response(&AppError::ValidationError("page URL cannot be empty".into()));
    }
    if !edit::is_valid_root(&slug) {
        return error_response(&AppError::ValidationError(format!(
            "page URL {slug:?} may only use letters, digits, '_' and '-'"
        )));
    }

    match data.pages.find_by_root(&slug).await {
        Ok(Some(_)) => return error_response(&AppError::Conflict(format!("/{slug} is already taken"))),
        Ok(None) => {}
        Err(err) => return error_response(&AppError::from(err)),
    }
    match data.pages.get_page(&user.display_name).await {
        Ok(Some(existing)) => {
            return error_response(&AppError::Conflict(format!(
                "{} already owns /{}",
                user.display_name, existing.root
            )))
        }
        Ok(None) => {}
        Err(err) => return error_response(&AppError::from(err)),
    }

    let page = edit::new_page(&user.display_name, &slug.to_lowercase());
    if let Err(err) = data.pages.write_page(&page).await {
        return error_response(&AppError::from(err));
    }
    log::info!("{} created page /{}", user.display_name, page.root);
    HttpResponse::Created().json(ManageView::of(page))
}
