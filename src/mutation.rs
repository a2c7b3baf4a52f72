//! Writes which invalidate a feed: posting a comment and creating a meme.
//!
//! Both composers hold the pending user input and run the same sequence on submit: write
//! to the API, reset the input, await the optional change notification, then await the
//! refetch of the owning feed. `is_submitting` stays set until all of it has settled.

use crate::{
    api::ApiClient,
    common::{
        comment::Comment,
        meme::{CreateMemeParams, Meme, MemePicture, MemeText},
        newtypes::MemeId,
    },
    errors::ApiResult,
    feed::{CommentFeedSource, Feed, MemeFeedSource, PageSource},
};
use async_trait::async_trait;
use log::info;
use rand::Rng;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

/// Caption positions are picked inside this area, in pixels.
const CAPTION_AREA: (f64, f64) = (400.0, 225.0);

/// Receives a signal after a successful write, e.g. to refresh counters in a parent feed.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify(&self) -> ApiResult<()>;
}

#[async_trait]
impl<S: PageSource> ChangeNotifier for Feed<S> {
    async fn notify(&self) -> ApiResult<()> {
        self.refetch().await?;
        Ok(())
    }
}

/// Resets the flag when the submission ends, whichever way it ends.
struct SubmittingGuard<'a>(&'a AtomicBool);

impl<'a> SubmittingGuard<'a> {
    /// Returns `None` if a submission is already running.
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct CommentComposer {
    client: ApiClient,
    meme_id: MemeId,
    feed: Arc<Feed<CommentFeedSource>>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    content: Mutex<String>,
    submitting: AtomicBool,
}

impl CommentComposer {
    pub fn new(client: ApiClient, meme_id: MemeId, feed: Arc<Feed<CommentFeedSource>>) -> Self {
        Self {
            client,
            meme_id,
            feed,
            notifier: None,
            content: Mutex::new(String::new()),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn set_content(&self, content: impl Into<String>) {
        *lock(&self.content) = content.into();
    }

    pub fn content(&self) -> String {
        lock(&self.content).clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Posts the pending comment. Blank input and concurrent submissions are ignored and
    /// return `Ok(None)`. On failure the input is kept so that the user can retry.
    pub async fn submit(&self) -> ApiResult<Option<Comment>> {
        let content = self.content();
        if content.trim().is_empty() {
            return Ok(None);
        }
        let Some(_guard) = SubmittingGuard::acquire(&self.submitting) else {
            return Ok(None);
        };

        let comment = self
            .client
            .create_meme_comment(&self.meme_id, &content)
            .await?;
        info!("Created comment {} on meme {}", comment.id, self.meme_id);
        lock(&self.content).clear();
        if let Some(notifier) = &self.notifier {
            notifier.notify().await?;
        }
        self.feed.refetch().await?;
        Ok(Some(comment))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemeDraft {
    pub picture: Option<MemePicture>,
    pub description: String,
    pub texts: Vec<MemeText>,
}

pub struct MemeComposer {
    client: ApiClient,
    feed: Arc<Feed<MemeFeedSource>>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    draft: Mutex<MemeDraft>,
    submitting: AtomicBool,
}

impl MemeComposer {
    pub fn new(client: ApiClient, feed: Arc<Feed<MemeFeedSource>>) -> Self {
        Self {
            client,
            feed,
            notifier: None,
            draft: Mutex::new(MemeDraft::default()),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn draft(&self) -> MemeDraft {
        lock(&self.draft).clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn set_picture(&self, picture: MemePicture) {
        lock(&self.draft).picture = Some(picture);
    }

    pub fn set_description(&self, description: impl Into<String>) {
        lock(&self.draft).description = description.into();
    }

    /// Appends a caption with a default text at a random position.
    pub fn add_caption(&self) -> usize {
        let mut rng = rand::thread_rng();
        let x = rng.gen_range(0.0..CAPTION_AREA.0);
        let y = rng.gen_range(0.0..CAPTION_AREA.1);
        let mut draft = lock(&self.draft);
        let content = format!("New caption {}", draft.texts.len() + 1);
        draft.texts.push(MemeText { content, x, y });
        draft.texts.len() - 1
    }

    pub fn update_caption(&self, index: usize, content: impl Into<String>) -> bool {
        match lock(&self.draft).texts.get_mut(index) {
            Some(text) => {
                text.content = content.into();
                true
            }
            None => false,
        }
    }

    pub fn move_caption(&self, index: usize, x: f64, y: f64) -> bool {
        match lock(&self.draft).texts.get_mut(index) {
            Some(text) => {
                text.x = x;
                text.y = y;
                true
            }
            None => false,
        }
    }

    pub fn remove_caption(&self, index: usize) -> bool {
        let mut draft = lock(&self.draft);
        if index < draft.texts.len() {
            draft.texts.remove(index);
            true
        } else {
            false
        }
    }

    /// Uploads the drafted meme. Without a picture nothing is sent and `Ok(None)` is
    /// returned.
    pub async fn submit(&self) -> ApiResult<Option<Meme>> {
        let draft = self.draft();
        let Some(picture) = draft.picture else {
            return Ok(None);
        };
        let Some(_guard) = SubmittingGuard::acquire(&self.submitting) else {
            return Ok(None);
        };

        let params = CreateMemeParams {
            picture,
            description: draft.description,
            texts: draft.texts,
        };
        let meme = self.client.create_meme(params).await?;
        info!("Created meme {}", meme.id);
        *lock(&self.draft) = MemeDraft::default();
        if let Some(notifier) = &self.notifier {
            notifier.notify().await?;
        }
        self.feed.refetch().await?;
        Ok(Some(meme))
    }
}
