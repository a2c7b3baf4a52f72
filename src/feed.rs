//! Paginated feeds of enriched items.
//!
//! A [Feed] holds the pages fetched so far for one query key, in fetch order. Pages are
//! produced by a [PageSource], which takes care of calling the API and resolving authors.

use crate::{
    api::ApiClient,
    common::{comment::CommentView, meme::MemeView, newtypes::MemeId, ListResponse},
    enrich::AuthorResolver,
    errors::{ApiError, ApiResult},
};
use async_trait::async_trait;
use log::debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const FIRST_PAGE: i32 = 1;

#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Clone + Send + Sync;

    fn key(&self) -> String;

    async fn fetch_page(&self, page: i32) -> ApiResult<ListResponse<Self::Item>>;
}

/// The main feed of memes, with authors attached.
#[derive(Clone, Debug)]
pub struct MemeFeedSource {
    client: ApiClient,
    resolver: AuthorResolver,
}

impl MemeFeedSource {
    pub fn new(client: ApiClient, resolver: AuthorResolver) -> Self {
        Self { client, resolver }
    }
}

#[async_trait]
impl PageSource for MemeFeedSource {
    type Item = MemeView;

    fn key(&self) -> String {
        "memes".to_string()
    }

    async fn fetch_page(&self, page: i32) -> ApiResult<ListResponse<MemeView>> {
        let memes = self.client.get_memes(page).await?;
        self.resolver.enrich_memes(memes).await
    }
}

/// Comments of a single meme, with authors attached.
#[derive(Clone, Debug)]
pub struct CommentFeedSource {
    client: ApiClient,
    resolver: AuthorResolver,
    meme_id: MemeId,
}

impl CommentFeedSource {
    pub fn new(client: ApiClient, resolver: AuthorResolver, meme_id: MemeId) -> Self {
        Self {
            client,
            resolver,
            meme_id,
        }
    }
}

#[async_trait]
impl PageSource for CommentFeedSource {
    type Item = CommentView;

    fn key(&self) -> String {
        format!("comments:{}", self.meme_id)
    }

    async fn fetch_page(&self, page: i32) -> ApiResult<ListResponse<CommentView>> {
        let comments = self.client.get_meme_comments(&self.meme_id, page).await?;
        self.resolver.enrich_comments(comments).await
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedState {
    /// Disabled until [Feed::activate] is called, nothing is fetched.
    Dormant,
    Idle,
    /// Fetching the first page.
    Loading,
    Ready { has_next_page: bool },
    LoadingMore,
    /// A fetch failed, its `Display` is the message to show. Only [Feed::refetch] leaves
    /// this state.
    Error(ApiError),
}

#[derive(Debug)]
struct FeedInner<T> {
    state: FeedState,
    pages: Vec<ListResponse<T>>,
    /// Incremented on every refetch, so that results of older fetches can be dropped.
    generation: u64,
}

pub struct Feed<S: PageSource> {
    source: S,
    inner: Mutex<FeedInner<S::Item>>,
}

impl<S: PageSource> Feed<S> {
    pub fn new(source: S) -> Self {
        Self::with_state(source, FeedState::Idle)
    }

    /// Creates a feed which ignores all fetch triggers until it is activated.
    pub fn dormant(source: S) -> Self {
        Self::with_state(source, FeedState::Dormant)
    }

    fn with_state(source: S, state: FeedState) -> Self {
        Self {
            source,
            inner: Mutex::new(FeedInner {
                state,
                pages: vec![],
                generation: 0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, FeedInner<S::Item>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn key(&self) -> String {
        self.source.key()
    }

    pub fn state(&self) -> FeedState {
        self.inner().state.clone()
    }

    pub fn pages(&self) -> Vec<ListResponse<S::Item>> {
        self.inner().pages.clone()
    }

    /// All items of all pages, in page order.
    pub fn items(&self) -> Vec<S::Item> {
        self.inner()
            .pages
            .iter()
            .flat_map(|p| p.results.iter().cloned())
            .collect()
    }

    pub fn has_next_page(&self) -> bool {
        matches!(
            self.inner().state,
            FeedState::Ready {
                has_next_page: true
            }
        )
    }

    pub fn is_loading(&self) -> bool {
        self.inner().state == FeedState::Loading
    }

    pub fn is_fetching(&self) -> bool {
        matches!(
            self.inner().state,
            FeedState::Loading | FeedState::LoadingMore
        )
    }

    /// Lifts the dormant state and fetches the first page. Does nothing on a feed which
    /// is already active.
    pub async fn activate(&self) -> ApiResult<FeedState> {
        {
            let mut inner = self.inner();
            if inner.state != FeedState::Dormant {
                return Ok(inner.state.clone());
            }
            debug!("Activating feed {}", self.key());
            inner.state = FeedState::Idle;
        }
        self.start().await
    }

    /// Fetches the first page, unless this already happened or is in progress.
    pub async fn start(&self) -> ApiResult<FeedState> {
        let generation = {
            let mut inner = self.inner();
            match &inner.state {
                FeedState::Idle => {}
                FeedState::Error(e) => return Err(e.clone()),
                state => return Ok(state.clone()),
            }
            inner.state = FeedState::Loading;
            inner.generation
        };
        self.fetch(FIRST_PAGE, generation).await
    }

    /// Appends the next page. Does nothing if there is no next page or another fetch is
    /// in progress.
    pub async fn load_next_page(&self) -> ApiResult<FeedState> {
        let (page, generation) = {
            let mut inner = self.inner();
            let next_page = inner.pages.last().and_then(|p| p.next_page);
            let ready = matches!(
                inner.state,
                FeedState::Ready {
                    has_next_page: true
                }
            );
            match (ready, next_page) {
                (true, Some(next_page)) => {
                    inner.state = FeedState::LoadingMore;
                    (next_page, inner.generation)
                }
                _ => return Ok(inner.state.clone()),
            }
        };
        self.fetch(page, generation).await
    }

    /// Drops all pages and fetches the first page again.
    pub async fn refetch(&self) -> ApiResult<FeedState> {
        let generation = {
            let mut inner = self.inner();
            if inner.state == FeedState::Dormant {
                return Ok(FeedState::Dormant);
            }
            inner.generation += 1;
            inner.pages.clear();
            inner.state = FeedState::Loading;
            inner.generation
        };
        debug!("Refetching feed {}", self.key());
        self.fetch(FIRST_PAGE, generation).await
    }

    async fn fetch(&self, page: i32, generation: u64) -> ApiResult<FeedState> {
        debug!("Fetching page {page} of feed {}", self.key());
        let res = self.source.fetch_page(page).await;

        let mut inner = self.inner();
        if inner.generation != generation {
            debug!("Discarding stale page {page} of feed {}", self.key());
            return Ok(inner.state.clone());
        }
        match res {
            Ok(list) => {
                let has_next_page = list.next_page.is_some();
                inner.pages.push(list);
                inner.state = FeedState::Ready { has_next_page };
                Ok(inner.state.clone())
            }
            Err(e) => {
                inner.state = FeedState::Error(e.clone());
                Err(e)
            }
        }
    }
}
