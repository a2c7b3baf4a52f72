#![expect(clippy::unwrap_used)]

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::LevelFilter;
use memefactory::{
    common::{
        comment::Comment,
        meme::{Meme, MemeText},
        newtypes::{CommentId, MemeId, UserId},
        user::{LoginResponse, LoginUserParams, User},
        ListResponse,
    },
    config::{MemeFactoryConfig, MemeFactoryConfigApi},
    session::Session,
    MemeFactoryContext,
};
use serde::Deserialize;
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Once},
};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "password";
/// Logging in with this username makes the server fail.
pub const BROKEN_USER: &str = "broken";

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct ServerState {
    pub page_size: usize,
    pub users: Vec<User>,
    pub memes: Vec<Meme>,
    pub comments: Vec<Comment>,
    pub tokens: HashMap<String, UserId>,
    pub requests: Vec<RecordedRequest>,
    pub meme_form: Vec<(String, String)>,
}

impl ServerState {
    fn comments_of(&self, meme_id: &MemeId) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|c| &c.meme_id == meme_id)
            .cloned()
            .collect()
    }

    fn with_comments_count(&self, meme: &Meme) -> Meme {
        let mut meme = meme.clone();
        meme.comments_count = self.comments_of(&meme.id).len().to_string();
        meme
    }

    fn authorized(&self, headers: &HeaderMap) -> Result<UserId, StatusCode> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

type Shared = Arc<Mutex<ServerState>>;

/// A MemeFactory API running in the test process, on an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    state: Shared,
}

pub fn token_for(user_id: &str) -> String {
    encode(
        &Header::default(),
        &json!({ "id": user_id }),
        &EncodingKey::from_secret(b"test secret"),
    )
    .unwrap()
}

pub fn user(id: &str) -> User {
    User {
        id: UserId::from(id),
        username: id.to_string(),
        picture_url: format!("https://dummy.url/user/{id}"),
    }
}

pub fn meme(n: usize, author: &str) -> Meme {
    Meme {
        id: MemeId(format!("dummy_meme_id_{n}")),
        author_id: UserId::from(author),
        picture_url: format!("https://dummy.url/meme/{n}"),
        description: format!("dummy meme {n}"),
        comments_count: "0".to_string(),
        texts: vec![],
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn comment(n: usize, meme_id: &str, author: &str) -> Comment {
    Comment {
        id: CommentId(format!("dummy_comment_id_{n}")),
        author_id: UserId::from(author),
        meme_id: MemeId::from(meme_id),
        content: format!("dummy comment {n}"),
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, n as u32).unwrap(),
    }
}

impl TestServer {
    /// One meme by dummy_user_1 with two captions and three comments, page size 10.
    pub async fn start() -> Self {
        let mut state = ServerState {
            page_size: 10,
            users: (1..=3).map(|i| user(&format!("dummy_user_{i}"))).collect(),
            ..Default::default()
        };
        let mut first = meme(1, "dummy_user_1");
        first.texts = vec![
            MemeText {
                content: "dummy text 1".to_string(),
                x: 0.0,
                y: 0.0,
            },
            MemeText {
                content: "dummy text 2".to_string(),
                x: 100.0,
                y: 100.0,
            },
        ];
        state.memes.push(first);
        for i in 1..=3 {
            state
                .comments
                .push(comment(i, "dummy_meme_id_1", &format!("dummy_user_{i}")));
        }
        Self::start_with(state).await
    }

    pub async fn start_with(state: ServerState) -> Self {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            env_logger::builder()
                .filter_level(LevelFilter::Warn)
                .is_test(true)
                .init();
        });

        let state = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/authentication/login", post(login))
            .route("/users/:id", get(get_user))
            .route("/memes", get(get_memes).post(create_meme))
            .route(
                "/memes/:id/comments",
                get(get_comments).post(create_comment),
            )
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn config(&self) -> MemeFactoryConfig {
        MemeFactoryConfig {
            api: MemeFactoryConfigApi {
                base_url: self.base_url.clone(),
                timeout_secs: 5,
            },
            ..Default::default()
        }
    }

    /// A context whose session already holds a valid token for `user_id`.
    pub fn context_for(&self, user_id: &str) -> MemeFactoryContext {
        let token = token_for(user_id);
        self.state()
            .tokens
            .insert(token.clone(), UserId::from(user_id));
        let session = Session::in_memory();
        session.replace(&token).unwrap();
        MemeFactoryContext::with_session(self.config(), session).unwrap()
    }
}

async fn record(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let recorded = {
        let header_str = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(ToString::to_string)
        };
        RecordedRequest {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            content_type: header_str(header::CONTENT_TYPE),
            authorization: header_str(header::AUTHORIZATION),
        }
    };
    state.lock().unwrap().requests.push(recorded);
    next.run(req).await
}

async fn login(
    State(state): State<Shared>,
    Json(params): Json<LoginUserParams>,
) -> Result<Json<LoginResponse>, StatusCode> {
    if params.username == BROKEN_USER {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut state = state.lock().unwrap();
    let known = state.users.iter().any(|u| u.username == params.username);
    if !known || params.password != PASSWORD {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let token = token_for(&params.username);
    state
        .tokens
        .insert(token.clone(), UserId(params.username.clone()));
    Ok(Json(LoginResponse { jwt: token }))
}

async fn get_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<User>, StatusCode> {
    let state = state.lock().unwrap();
    state.authorized(&headers)?;
    state
        .users
        .iter()
        .find(|u| u.id.0 == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct PageQuery {
    page: usize,
}

fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> ListResponse<T> {
    let results = items
        .iter()
        .skip((page.max(1) - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();
    ListResponse {
        total: items.len() as i64,
        page_size: page_size as i64,
        results,
        // the client must compute this itself
        next_page: Some(9999),
    }
}

async fn get_memes(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<Meme>>, StatusCode> {
    let state = state.lock().unwrap();
    state.authorized(&headers)?;
    let memes: Vec<Meme> = state
        .memes
        .iter()
        .map(|m| state.with_comments_count(m))
        .collect();
    Ok(Json(paginate(&memes, query.page, state.page_size)))
}

async fn get_comments(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<Comment>>, StatusCode> {
    let state = state.lock().unwrap();
    state.authorized(&headers)?;
    let meme_id = MemeId(id);
    if !state.memes.iter().any(|m| m.id == meme_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let comments = state.comments_of(&meme_id);
    Ok(Json(paginate(&comments, query.page, state.page_size)))
}

#[derive(Deserialize)]
struct CreateComment {
    content: String,
}

async fn create_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(params): Json<CreateComment>,
) -> Result<Json<Comment>, StatusCode> {
    let mut state = state.lock().unwrap();
    let author = state.authorized(&headers)?;
    let meme_id = MemeId(id);
    if !state.memes.iter().any(|m| m.id == meme_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let n = state.comments.len() + 1;
    let mut comment = comment(n, &meme_id.0, &author.0);
    comment.content = params.content;
    state.comments.push(comment.clone());
    Ok(Json(comment))
}

async fn create_meme(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Meme>, StatusCode> {
    let author = state.lock().unwrap().authorized(&headers)?;
    let mut fields = vec![];
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name() {
            Some(file_name) => format!("file:{file_name}"),
            None => field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?,
        };
        fields.push((name, value));
    }

    let field = |name: &str| {
        fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    };
    let mut texts = vec![];
    while let Some(content) = field(&format!("Texts[{}][Content]", texts.len())) {
        let i = texts.len();
        let coordinate = |axis: &str| -> Result<f64, StatusCode> {
            field(&format!("Texts[{i}][{axis}]"))
                .and_then(|v| v.parse().ok())
                .ok_or(StatusCode::BAD_REQUEST)
        };
        texts.push(MemeText {
            content,
            x: coordinate("X")?,
            y: coordinate("Y")?,
        });
    }
    if field("Picture").is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut state = state.lock().unwrap();
    let mut meme = meme(state.memes.len() + 1, &author.0);
    meme.description = field("Description").unwrap_or_default();
    meme.texts = texts;
    // newest first
    state.memes.insert(0, meme.clone());
    state.meme_form = fields;
    Ok(Json(meme))
}
