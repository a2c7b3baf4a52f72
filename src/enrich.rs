use crate::{
    api::ApiClient,
    common::{
        comment::{Comment, CommentView},
        meme::{Meme, MemeView},
        newtypes::UserId,
        user::User,
        ListResponse,
    },
    errors::{ApiError, ApiResult},
};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get_user_by_id(&self, id: &UserId) -> ApiResult<User>;
}

#[async_trait]
impl UserLookup for ApiClient {
    async fn get_user_by_id(&self, id: &UserId) -> ApiResult<User> {
        ApiClient::get_user_by_id(self, id).await
    }
}

/// Entities which reference their author only by id.
pub trait Authored {
    fn author_id(&self) -> &UserId;
}

impl Authored for Meme {
    fn author_id(&self) -> &UserId {
        &self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> &UserId {
        &self.author_id
    }
}

/// Attaches the author to every item of a page.
///
/// All author lookups of a page run concurrently. The result keeps the order of the
/// input regardless of the order in which lookups finish, and a single failed lookup
/// fails the whole page.
#[derive(Clone)]
pub struct AuthorResolver {
    lookup: Arc<dyn UserLookup>,
    deduplicate: bool,
}

impl Debug for AuthorResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorResolver")
            .field("deduplicate", &self.deduplicate)
            .finish_non_exhaustive()
    }
}

impl AuthorResolver {
    /// With `deduplicate` unset every item triggers its own lookup, even if several items
    /// share an author.
    pub fn new(lookup: Arc<dyn UserLookup>, deduplicate: bool) -> Self {
        Self {
            lookup,
            deduplicate,
        }
    }

    pub async fn resolve<T: Authored + Sync>(&self, items: &[T]) -> ApiResult<Vec<User>> {
        if !self.deduplicate {
            return try_join_all(
                items
                    .iter()
                    .map(|item| self.lookup.get_user_by_id(item.author_id())),
            )
            .await;
        }

        let mut distinct: Vec<&UserId> = vec![];
        for item in items {
            if !distinct.contains(&item.author_id()) {
                distinct.push(item.author_id());
            }
        }
        let users =
            try_join_all(distinct.iter().map(|id| self.lookup.get_user_by_id(id))).await?;
        let by_id: HashMap<&UserId, User> = distinct.into_iter().zip(users).collect();
        items
            .iter()
            .map(|item| {
                by_id.get(item.author_id()).cloned().ok_or_else(|| {
                    ApiError::unknown(format!("Missing author {}", item.author_id()))
                })
            })
            .collect()
    }

    pub async fn enrich_page<T, V, F>(
        &self,
        page: ListResponse<T>,
        join: F,
    ) -> ApiResult<ListResponse<V>>
    where
        T: Authored + Send + Sync,
        F: Fn(T, User) -> V + Send,
    {
        let authors = self.resolve(&page.results).await?;
        let mut page = page;
        let items = std::mem::take(&mut page.results);
        let results = items
            .into_iter()
            .zip(authors)
            .map(|(item, author)| join(item, author))
            .collect();
        Ok(page.map_results(results))
    }

    pub async fn enrich_memes(
        &self,
        page: ListResponse<Meme>,
    ) -> ApiResult<ListResponse<MemeView>> {
        self.enrich_page(page, |meme, author| MemeView {
            meme,
            author,
            comments: vec![],
        })
        .await
    }

    pub async fn enrich_comments(
        &self,
        page: ListResponse<Comment>,
    ) -> ApiResult<ListResponse<CommentView>> {
        self.enrich_page(page, |comment, author| CommentView { comment, author })
            .await
    }
}
