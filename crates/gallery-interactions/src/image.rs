use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use gallery_sync::{LiveQuery, QueryState, SyncService};
use gallery_types::api::{ReactionOutcome, ReactionSummary};
use gallery_types::models::{Comment, Reaction, UserIdentity, now_millis};
use gallery_types::sync::{Mutation, Query, QueryResult};

use crate::error::InteractionError;
use crate::identity::IdentityStore;
use crate::reactions::{self, ReactionPlan};

/// Reactions and comments for a single image, kept live.
pub struct ImageInteractions {
    image_id: String,
    sync: Arc<dyn SyncService>,
    identity: Arc<IdentityStore>,
    live: LiveQuery,
}

impl ImageInteractions {
    pub fn open(
        sync: Arc<dyn SyncService>,
        identity: Arc<IdentityStore>,
        image_id: impl Into<String>,
    ) -> Self {
        let image_id = image_id.into();
        let live = LiveQuery::spawn(sync.clone(), Query::for_image(&image_id));
        Self {
            image_id,
            sync,
            identity,
            live,
        }
    }

    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn state(&self) -> QueryState {
        self.live.state()
    }

    pub fn reactions(&self) -> Vec<Reaction> {
        self.live.state().data.map(|d| d.reactions).unwrap_or_default()
    }

    /// Newest first.
    pub fn comments(&self) -> Vec<Comment> {
        let mut comments = self.live.state().data.map(|d| d.comments).unwrap_or_default();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        comments
    }

    pub fn summary(&self) -> ReactionSummary {
        reactions::summarize(&self.reactions())
    }

    /// The local user's live reaction on this image, if any.
    pub fn my_reaction(&self) -> Option<Reaction> {
        let me = self.identity.current().user_id;
        self.reactions().into_iter().find(|r| r.user_id == me)
    }

    /// Only the author may delete a comment. Checked by callers before
    /// offering the action; `delete_comment` itself does not check.
    pub fn can_delete(&self, comment: &Comment) -> bool {
        comment.user_id == self.identity.current().user_id
    }

    /// Wait for the first snapshot. Fails if the service could not answer.
    pub async fn ready(&mut self) -> Result<QueryResult, InteractionError> {
        let state = self.live.ready().await?;
        match (state.data, state.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(InteractionError::Unavailable(error)),
            (None, None) => Err(InteractionError::Unavailable("no data".into())),
        }
    }

    /// Wait for the next pushed snapshot.
    pub async fn changed(&mut self) -> Result<QueryState, InteractionError> {
        Ok(self.live.changed().await?)
    }

    /// React with `emoji`: create, toggle off, or replace the user's reaction.
    pub async fn add_reaction(
        &mut self,
        emoji: &str,
        image_url: &str,
    ) -> Result<ReactionOutcome, InteractionError> {
        let actor = self.actor()?;
        if emoji.trim().is_empty() {
            return Err(InteractionError::EmptyEmoji);
        }

        let loaded = self.ready().await?;
        let plan = reactions::plan_reaction(&loaded.reactions, actor.user_id, emoji);
        let now = now_millis();

        let (mutation, reaction) = match plan {
            ReactionPlan::Create => {
                let reaction = Reaction {
                    id: Uuid::new_v4(),
                    image_id: self.image_id.clone(),
                    user_id: actor.user_id,
                    user_name: actor.user_name.clone(),
                    emoji: emoji.to_string(),
                    image_url: image_url.to_string(),
                    created_at: now,
                };
                (Mutation::CreateReaction(reaction.clone()), Some(reaction))
            }
            ReactionPlan::Remove { id } => (Mutation::DeleteReaction { id }, None),
            ReactionPlan::Replace { id, since } => {
                let created_at = reactions::replacement_time(since, now);
                let reaction = loaded
                    .reactions
                    .iter()
                    .find(|r| r.id == id)
                    .map(|r| Reaction {
                        emoji: emoji.to_string(),
                        created_at,
                        ..r.clone()
                    });
                let mutation = Mutation::UpdateReaction {
                    id,
                    emoji: emoji.to_string(),
                    created_at,
                };
                (mutation, reaction)
            }
        };

        debug!(
            "{} {:?} {} on image {}",
            actor.user_name, plan, emoji, self.image_id
        );
        self.commit(mutation).await?;

        Ok(ReactionOutcome {
            op: plan.op(),
            reaction,
        })
    }

    /// Post a comment. Text is trimmed; blank text is rejected.
    pub async fn add_comment(
        &mut self,
        text: &str,
        image_url: &str,
    ) -> Result<Comment, InteractionError> {
        let actor = self.actor()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(InteractionError::EmptyComment);
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            image_id: self.image_id.clone(),
            user_id: actor.user_id,
            user_name: actor.user_name,
            text: text.to_string(),
            image_url: image_url.to_string(),
            created_at: now_millis(),
        };

        self.commit(Mutation::CreateComment(comment.clone())).await?;
        Ok(comment)
    }

    pub async fn delete_comment(&mut self, comment_id: Uuid) -> Result<(), InteractionError> {
        self.commit(Mutation::DeleteComment { id: comment_id }).await
    }

    fn actor(&self) -> Result<UserIdentity, InteractionError> {
        let identity = self.identity.current();
        if !identity.is_logged_in() {
            return Err(InteractionError::NotLoggedIn);
        }
        Ok(identity)
    }

    async fn commit(&mut self, mutation: Mutation) -> Result<(), InteractionError> {
        self.sync.transact(vec![mutation.clone()]).await?;
        self.live.apply_optimistic(&mutation);
        Ok(())
    }
}
