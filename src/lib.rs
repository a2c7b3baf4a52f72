use crate::{
    api::ApiClient,
    common::{comment::Comment, newtypes::MemeId},
    config::MemeFactoryConfig,
    enrich::AuthorResolver,
    errors::ApiResult,
    feed::{CommentFeedSource, Feed, MemeFeedSource},
    mutation::{CommentComposer, MemeComposer},
    session::{Authentication, FileTokenStore, Session},
};
use std::sync::Arc;

pub mod api;
pub mod common;
pub mod config;
pub mod enrich;
pub mod errors;
pub mod feed;
pub mod mutation;
pub mod session;

/// Wires the session, API client and author resolution together, and hands out feeds
/// and composers sharing them.
#[derive(Clone, Debug)]
pub struct MemeFactoryContext {
    pub config: MemeFactoryConfig,
    pub session: Session,
    pub client: ApiClient,
    resolver: AuthorResolver,
}

impl MemeFactoryContext {
    /// Uses the token file from the config, so that a previous login is picked up.
    pub fn new(config: MemeFactoryConfig) -> ApiResult<Self> {
        let session = Session::new(FileTokenStore::new(config.session.token_path.clone()));
        Self::with_session(config, session)
    }

    pub fn with_session(config: MemeFactoryConfig, session: Session) -> ApiResult<Self> {
        let client = ApiClient::new(&config.api, session.clone())?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: MemeFactoryConfig, client: ApiClient) -> Self {
        let resolver = AuthorResolver::new(
            Arc::new(client.clone()),
            config.feed.deduplicate_authors,
        );
        Self {
            session: client.session().clone(),
            config,
            client,
            resolver,
        }
    }

    pub fn authentication(&self) -> Authentication {
        Authentication::new(self.session.clone())
    }

    pub fn meme_feed(&self) -> Arc<Feed<MemeFeedSource>> {
        let source = MemeFeedSource::new(self.client.clone(), self.resolver.clone());
        Arc::new(Feed::new(source))
    }

    /// Comment feeds start dormant, they are activated when the comment section is opened.
    pub fn comment_feed(&self, meme_id: MemeId) -> Arc<Feed<CommentFeedSource>> {
        let source = CommentFeedSource::new(self.client.clone(), self.resolver.clone(), meme_id);
        Arc::new(Feed::dormant(source))
    }

    /// Posting a comment refreshes the comment feed and, through the notifier, the memes
    /// feed which shows the comment counts.
    pub fn comment_composer(
        &self,
        meme_id: MemeId,
        comments: Arc<Feed<CommentFeedSource>>,
        memes: Option<Arc<Feed<MemeFeedSource>>>,
    ) -> CommentComposer {
        let composer = CommentComposer::new(self.client.clone(), meme_id, comments);
        match memes {
            Some(memes) => composer.with_notifier(memes),
            None => composer,
        }
    }

    /// Posts a comment on a meme and returns it along with the meme's comment count as
    /// reported by the server after the write. Blank content posts nothing.
    pub async fn post_comment(
        &self,
        meme_id: MemeId,
        content: &str,
    ) -> ApiResult<Option<(Comment, i64)>> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let comments = self.comment_feed(meme_id.clone());
        comments.activate().await?;
        let composer = self.comment_composer(meme_id, comments.clone(), None);
        composer.set_content(content);
        let Some(comment) = composer.submit().await? else {
            return Ok(None);
        };
        let total = comments.pages().first().map_or(0, |page| page.total);
        Ok(Some((comment, total)))
    }

    pub fn meme_composer(&self, memes: Arc<Feed<MemeFeedSource>>) -> MemeComposer {
        MemeComposer::new(self.client.clone(), memes)
    }
}
