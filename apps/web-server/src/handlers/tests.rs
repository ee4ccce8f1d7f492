use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Set};

use blog_core::domain::{Category, NewUser, Post, PostDraft, ProfileChanges, User};
use blog_core::policy::Viewer;
use blog_core::ports::PasswordService;
use blog_infra::database::entity::category;
use blog_shared::PUB_DATE_FORMAT;
use blog_infra::{Argon2PasswordService, DatabaseConfig, JwtConfig, JwtTokenService, connect};

use super::{configure_routes, pages};
use crate::config::AppConfig;
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::csrf::{CSRF_COOKIE, CsrfMiddleware};
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

const CSRF: &str = "test-csrf-token";
const PASSWORD: &str = "war-and-peace";

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(CsrfMiddleware::new(false))
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes)
                .default_service(web::to(pages::not_found)),
        )
        .await
    };
}

fn media_root() -> PathBuf {
    std::env::temp_dir().join(format!("blogicum-test-{}", uuid::Uuid::new_v4().simple()))
}

async fn setup() -> AppState {
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::in_memory(),
        run_migrations: true,
        media_root: media_root(),
        media_url: "/media".to_string(),
        cookie_secure: false,
    };
    let db = connect(&config.database).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let tokens = JwtTokenService::new(JwtConfig {
        secret: "handler-tests".to_string(),
        expiration_hours: 1,
        issuer: "blogicum-tests".to_string(),
    });
    AppState::new(db, &config, Arc::new(tokens))
}

/// Argon2 is slow in debug builds; hash the shared password once.
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| Argon2PasswordService::new().hash(PASSWORD).unwrap())
        .clone()
}

async fn user(state: &AppState, username: &str) -> User {
    state
        .users
        .create(NewUser {
            username: username.to_string(),
            email: String::new(),
            password_hash: password_hash(),
        })
        .await
        .unwrap()
}

async fn category(state: &AppState, slug: &str, is_published: bool) -> Category {
    category::ActiveModel {
        id: sea_orm::NotSet,
        title: Set(slug.to_uppercase()),
        description: Set(format!("About {slug}")),
        slug: Set(slug.to_string()),
        is_published: Set(is_published),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await
    .unwrap()
    .into()
}

async fn post(state: &AppState, author: &User, title: &str, offset: Duration) -> Post {
    let draft = PostDraft {
        title: title.to_string(),
        text: format!("{title} text"),
        pub_date: Utc::now() + offset,
        location_id: None,
        category_id: None,
        image: None,
    };
    state.posts.create(author.id, draft, Utc::now()).await.unwrap()
}

fn session(state: &AppState, user: &User) -> Cookie<'static> {
    let token = state.tokens.generate_token(user.id, &user.username).unwrap();
    Cookie::new(SESSION_COOKIE, token)
}

fn csrf_cookie() -> Cookie<'static> {
    Cookie::new(CSRF_COOKIE, CSRF)
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

fn multipart(fields: &[(&str, &str)]) -> (String, Vec<u8>) {
    multipart_with_image(fields, None)
}

fn multipart_with_image(fields: &[(&str, &str)], image: Option<&[u8]>) -> (String, Vec<u8>) {
    let boundary = "blogicum-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some(data) = image {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn png_bytes() -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::new(8, 6))
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[actix_web::test]
async fn index_shows_public_posts_only() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    post(&state, &leo, "Sevastopol in May", Duration::hours(-1)).await;
    post(&state, &leo, "Scheduled story", Duration::days(1)).await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Sevastopol in May"));
    assert!(!body.contains("Scheduled story"));
}

#[actix_web::test]
async fn first_visit_receives_csrf_cookie() {
    let state = setup().await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert!(resp.response().cookies().any(|c| c.name() == CSRF_COOKIE));
}

#[actix_web::test]
async fn out_of_range_pages_are_not_found() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    post(&state, &leo, "Only post", Duration::hours(-1)).await;
    let app = app!(state);

    for uri in ["/?page=0", "/?page=abc", "/?page=2"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    for uri in ["/?page=last", "/?page="] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[actix_web::test]
async fn unknown_routes_and_malformed_ids_are_not_found() {
    let state = setup().await;
    let app = app!(state);

    for uri in ["/nowhere/", "/posts/abc/", "/posts/999/", "/profile/ghost/", "/category/none/"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn unpublished_category_page_is_not_found() {
    let state = setup().await;
    category(&state, "travel", true).await;
    category(&state, "drafts", false).await;
    let app = app!(state);

    let shown = test::call_service(&app, test::TestRequest::get().uri("/category/travel/").to_request()).await;
    let hidden = test::call_service(&app, test::TestRequest::get().uri("/category/drafts/").to_request()).await;

    assert_eq!(shown.status(), StatusCode::OK);
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn hidden_post_is_visible_to_its_author_only() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let anna = user(&state, "anna").await;
    let scheduled = post(&state, &leo, "Tomorrow", Duration::days(1)).await;
    let uri = format!("/posts/{}/", scheduled.id);
    let app = app!(state);

    let anonymous = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    let other = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).cookie(session(&state, &anna)).to_request(),
    )
    .await;
    let author = test::call_service(
        &app,
        test::TestRequest::get().uri(&uri).cookie(session(&state, &leo)).to_request(),
    )
    .await;

    assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);
    assert_eq!(other.status(), StatusCode::NOT_FOUND);
    assert_eq!(author.status(), StatusCode::OK);
    assert!(body_text(author).await.contains("only you can see this post"));
}

#[actix_web::test]
async fn anonymous_visitor_is_sent_to_login() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let public = post(&state, &leo, "Public", Duration::hours(-1)).await;
    let app = app!(state);

    let create = test::call_service(&app, test::TestRequest::get().uri("/posts/create/").to_request()).await;
    let edit_uri = format!("/posts/{}/edit/", public.id);
    let edit = test::call_service(&app, test::TestRequest::get().uri(&edit_uri).to_request()).await;

    assert_eq!(create.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&create), "/auth/login/?next=%2Fposts%2Fcreate%2F");
    assert_eq!(edit.status(), StatusCode::SEE_OTHER);
    assert!(location(&edit).starts_with("/auth/login/?next="));
}

#[actix_web::test]
async fn non_author_is_sent_back_to_the_post() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let anna = user(&state, "anna").await;
    let public = post(&state, &leo, "Public", Duration::hours(-1)).await;
    let app = app!(state);

    for action in ["edit", "delete"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/posts/{}/{action}/", public.id))
                .cookie(session(&state, &anna))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{action}");
        assert_eq!(location(&resp), format!("/posts/{}/", public.id));
    }

    let delete = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/delete/", public.id))
            .cookie(session(&state, &anna))
            .cookie(csrf_cookie())
            .set_form([("csrf_token", CSRF)])
            .to_request(),
    )
    .await;
    assert_eq!(delete.status(), StatusCode::SEE_OTHER);
    assert!(state.posts.find_detail(public.id).await.unwrap().is_found());
}

#[actix_web::test]
async fn edit_form_is_prefilled_for_the_author() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let public = post(&state, &leo, "Public", Duration::hours(-1)).await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/edit/", public.id))
            .cookie(session(&state, &leo))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Public text"));
    assert!(body.contains(&public.pub_date.format(PUB_DATE_FORMAT).to_string()));
}

#[actix_web::test]
async fn non_author_edit_submission_changes_nothing() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let anna = user(&state, "anna").await;
    let public = post(&state, &leo, "Public", Duration::hours(-1)).await;
    let app = app!(state);
    let (content_type, body) = multipart(&[
        ("title", "Rewritten by anna"),
        ("text", "Someone else's words"),
        ("pub_date", "2024-05-01T09:30"),
        ("csrf_token", CSRF),
    ]);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", public.id))
            .cookie(session(&state, &anna))
            .cookie(csrf_cookie())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{}/", public.id));
    let stored = state.posts.find_detail(public.id).await.unwrap().found().unwrap();
    assert_eq!(stored.post.title, "Public");
    assert_eq!(stored.post.text, "Public text");
}

#[actix_web::test]
async fn comment_is_added_and_shown() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let anna = user(&state, "anna").await;
    let public = post(&state, &leo, "Public", Duration::hours(-1)).await;
    let uri = format!("/posts/{}/", public.id);
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("{uri}comment/"))
            .cookie(session(&state, &anna))
            .cookie(csrf_cookie())
            .set_form([("text", "Lovely read"), ("csrf_token", CSRF)])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), uri);

    let page = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    let body = body_text(page).await;
    assert!(body.contains("Lovely read"));
    assert!(body.contains("Comments (1)"));
}

#[actix_web::test]
async fn comment_without_matching_csrf_token_is_forbidden() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let public = post(&state, &leo, "Public", Duration::hours(-1)).await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", public.id))
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .set_form([("text", "Sneaky"), ("csrf_token", "forged")])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(state.comments.for_post(public.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn comment_on_hidden_post_is_not_found() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let anna = user(&state, "anna").await;
    let scheduled = post(&state, &leo, "Tomorrow", Duration::days(1)).await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", scheduled.id))
            .cookie(session(&state, &anna))
            .cookie(csrf_cookie())
            .set_form([("text", "Too early"), ("csrf_token", CSRF)])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_the_comment_author_may_delete_it() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let anna = user(&state, "anna").await;
    let public = post(&state, &leo, "Public", Duration::hours(-1)).await;
    let comment = state
        .comments
        .create_if_visible(
            &Viewer::user(anna.id, anna.username.clone()),
            public.id,
            "Mine".to_string(),
            Utc::now(),
        )
        .await
        .unwrap()
        .found()
        .unwrap();
    let uri = format!("/posts/{}/delete_comment/{}/", public.id, comment.id);
    let app = app!(state);

    let by_post_author = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .set_form([("csrf_token", CSRF)])
            .to_request(),
    )
    .await;
    assert_eq!(by_post_author.status(), StatusCode::SEE_OTHER);
    assert_eq!(state.comments.for_post(public.id).await.unwrap().len(), 1);

    let by_comment_author = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .cookie(session(&state, &anna))
            .cookie(csrf_cookie())
            .set_form([("csrf_token", CSRF)])
            .to_request(),
    )
    .await;
    assert_eq!(by_comment_author.status(), StatusCode::SEE_OTHER);
    assert!(state.comments.for_post(public.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn comment_must_belong_to_the_post_in_the_url() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let first = post(&state, &leo, "First", Duration::hours(-1)).await;
    let second = post(&state, &leo, "Second", Duration::hours(-1)).await;
    let comment = state
        .comments
        .create_if_visible(
            &Viewer::user(leo.id, leo.username.clone()),
            first.id,
            "On the first".to_string(),
            Utc::now(),
        )
        .await
        .unwrap()
        .found()
        .unwrap();
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/edit_comment/{}/", second.id, comment.id))
            .cookie(session(&state, &leo))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn author_creates_post_from_multipart_form() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let travel = category(&state, "travel", true).await;
    let category_id = travel.id.to_string();
    let app = app!(state);
    let (content_type, body) = multipart(&[
        ("title", "Sevastopol in December"),
        ("text", "The morning glow is just beginning."),
        ("pub_date", "2024-05-01T09:30"),
        ("category", category_id.as_str()),
        ("location", ""),
        ("csrf_token", CSRF),
    ]);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/leo/");

    let listing = test::call_service(&app, test::TestRequest::get().uri("/category/travel/").to_request()).await;
    assert!(body_text(listing).await.contains("Sevastopol in December"));
}

#[actix_web::test]
async fn uploaded_image_is_shown_on_the_post() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let app = app!(state);
    let png = png_bytes();
    let (content_type, body) = multipart_with_image(
        &[
            ("title", "Sevastopol at dawn"),
            ("text", "The bay in the first light."),
            ("pub_date", "2024-05-01T09:30"),
            ("csrf_token", CSRF),
        ],
        Some(&png),
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let profile = test::call_service(&app, test::TestRequest::get().uri("/profile/leo/").to_request()).await;
    let page = body_text(profile).await;
    assert!(page.contains("Sevastopol at dawn"));
    assert!(page.contains("src=\"/media/post_images/"));
}

#[actix_web::test]
async fn non_image_upload_is_a_form_error() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let app = app!(state);
    let (content_type, body) = multipart_with_image(
        &[
            ("title", "Not a picture"),
            ("text", "Body"),
            ("pub_date", "2024-05-01T09:30"),
            ("csrf_token", CSRF),
        ],
        Some(b"plain text pretending to be a png"),
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Unsupported image"));
}

#[actix_web::test]
async fn invalid_post_form_is_shown_again_with_errors() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let app = app!(state);
    let (content_type, body) = multipart(&[
        ("title", ""),
        ("text", "Body"),
        ("pub_date", "2024-05-01T09:30"),
        ("category", "999"),
        ("csrf_token", CSRF),
    ]);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("This field is required."));
}

#[actix_web::test]
async fn login_sets_session_and_follows_next() {
    let state = setup().await;
    user(&state, "leo").await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/?next=%2Fposts%2Fcreate%2F")
            .cookie(csrf_cookie())
            .set_form([("username", "leo"), ("password", PASSWORD), ("csrf_token", CSRF)])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/posts/create/");
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cookie.http_only(), Some(true));

    let claims = state.tokens.validate_token(cookie.value()).unwrap();
    assert_eq!(claims.username, "leo");
}

#[actix_web::test]
async fn wrong_password_is_rejected_on_the_form() {
    let state = setup().await;
    user(&state, "leo").await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .cookie(csrf_cookie())
            .set_form([("username", "leo"), ("password", "wrong-one"), ("csrf_token", CSRF)])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.response().cookies().any(|c| c.name() == SESSION_COOKIE));
    assert!(body_text(resp).await.contains("Please enter a correct username and password."));
}

#[actix_web::test]
async fn registration_rejects_taken_username() {
    let state = setup().await;
    user(&state, "leo").await;
    let app = app!(state);

    let taken = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/registration/")
            .cookie(csrf_cookie())
            .set_form([
                ("username", "leo"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
                ("csrf_token", CSRF),
            ])
            .to_request(),
    )
    .await;
    let fresh = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/registration/")
            .cookie(csrf_cookie())
            .set_form([
                ("username", "anna"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
                ("csrf_token", CSRF),
            ])
            .to_request(),
    )
    .await;

    assert_eq!(taken.status(), StatusCode::OK);
    assert!(body_text(taken).await.contains("A user with that username already exists."));
    assert_eq!(fresh.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&fresh), "/auth/login/");
    assert!(state.users.find_by_username("anna").await.unwrap().is_found());
}

#[actix_web::test]
async fn logout_expires_the_session_cookie() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/logout/")
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .set_form([("csrf_token", CSRF)])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cookie.value(), "");
}

#[actix_web::test]
async fn profile_edit_renames_user_and_reissues_session() {
    let state = setup().await;
    let leo = user(&state, "leo").await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/edit_profile/")
            .cookie(session(&state, &leo))
            .cookie(csrf_cookie())
            .set_form([
                ("first_name", "Lev"),
                ("last_name", "Tolstoy"),
                ("username", "lev"),
                ("email", "lev@example.com"),
                ("csrf_token", CSRF),
            ])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/lev/");
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(state.tokens.validate_token(cookie.value()).unwrap().username, "lev");

    let profile = test::call_service(&app, test::TestRequest::get().uri("/profile/lev/").to_request()).await;
    assert_eq!(profile.status(), StatusCode::OK);
    assert!(body_text(profile).await.contains("Lev Tolstoy"));
}

#[actix_web::test]
async fn stale_session_after_rename_does_not_own_the_old_username() {
    let state = setup().await;
    let anna = user(&state, "anna").await;
    let old_session = session(&state, &anna);
    state
        .users
        .update_profile(
            anna.id,
            ProfileChanges {
                first_name: String::new(),
                last_name: String::new(),
                username: "anna2".to_string(),
                email: String::new(),
            },
        )
        .await
        .unwrap();
    let newcomer = user(&state, "anna").await;
    post(&state, &newcomer, "Plans for the spring", Duration::days(3)).await;
    let app = app!(state);

    let stale = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/anna/")
            .cookie(old_session)
            .to_request(),
    )
    .await;
    assert_eq!(stale.status(), StatusCode::OK);
    assert!(!body_text(stale).await.contains("Plans for the spring"));

    let own = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/anna/")
            .cookie(session(&state, &newcomer))
            .to_request(),
    )
    .await;
    assert!(body_text(own).await.contains("Plans for the spring"));
}

#[actix_web::test]
async fn health_reports_database_status() {
    let state = setup().await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}
