use crate::Database;
use crate::models::{CommentRow, ReactionRow};
use anyhow::Result;
use gallery_types::events::SyncEvent;
use gallery_types::sync::{EntityQuery, Mutation, Order, Query, QueryResult};
use rusqlite::{Connection, Row};
use tracing::debug;

const REACTION_COLUMNS: &str = "id, image_id, user_id, user_name, emoji, image_url, created_at";
const COMMENT_COLUMNS: &str = "id, image_id, user_id, user_name, text, image_url, created_at";

impl Database {
    // -- Transactions --

    /// Apply a batch of mutations atomically.
    /// Returns one change event per mutation that actually touched a row.
    pub fn apply_mutations(&self, mutations: &[Mutation]) -> Result<Vec<SyncEvent>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut events = Vec::with_capacity(mutations.len());

            for mutation in mutations {
                if let Some(event) = apply_one(&tx, mutation)? {
                    events.push(event);
                } else {
                    debug!("Mutation matched no row: {:?}", mutation);
                }
            }

            tx.commit()?;
            Ok(events)
        })
    }

    // -- Queries --

    pub fn run_query(&self, query: &Query) -> Result<QueryResult> {
        self.with_conn(|conn| {
            let reactions = match &query.reactions {
                Some(q) => query_reactions(conn, q)?
                    .into_iter()
                    .map(ReactionRow::into_reaction)
                    .collect(),
                None => vec![],
            };
            let comments = match &query.comments {
                Some(q) => query_comments(conn, q)?
                    .into_iter()
                    .map(CommentRow::into_comment)
                    .collect(),
                None => vec![],
            };
            Ok(QueryResult { reactions, comments })
        })
    }

    pub fn get_reaction(&self, id: &str) -> Result<Option<ReactionRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {REACTION_COLUMNS} FROM reactions WHERE id = ?1");
            conn.query_row(&sql, [id], reaction_from_row).optional()
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1");
            conn.query_row(&sql, [id], comment_from_row).optional()
        })
    }

    // -- Local state --

    pub fn get_state(&self, name: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM local_state WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    pub fn put_state(&self, name: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO local_state (name, value, updated_at)
                 VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(name) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                (name, value),
            )?;
            Ok(())
        })
    }
}

fn apply_one(conn: &Connection, mutation: &Mutation) -> Result<Option<SyncEvent>> {
    match mutation {
        Mutation::CreateReaction(reaction) => {
            let row = ReactionRow::from(reaction);
            conn.execute(
                "INSERT INTO reactions (id, image_id, user_id, user_name, emoji, image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    row.id,
                    row.image_id,
                    row.user_id,
                    row.user_name,
                    row.emoji,
                    row.image_url,
                    row.created_at
                ],
            )?;
            Ok(Some(SyncEvent::ReactionCreate { reaction: reaction.clone() }))
        }
        Mutation::UpdateReaction { id, emoji, created_at } => {
            let sql = format!(
                "UPDATE reactions SET emoji = ?1, created_at = ?2 WHERE id = ?3 RETURNING {REACTION_COLUMNS}"
            );
            let updated = conn
                .query_row(
                    &sql,
                    rusqlite::params![emoji, created_at.timestamp_millis(), id.to_string()],
                    reaction_from_row,
                )
                .optional()?;
            Ok(updated.map(|row| SyncEvent::ReactionUpdate { reaction: row.into_reaction() }))
        }
        Mutation::DeleteReaction { id } => {
            let image_id: Option<String> = conn
                .query_row(
                    "DELETE FROM reactions WHERE id = ?1 RETURNING image_id",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(image_id.map(|image_id| SyncEvent::ReactionDelete { id: *id, image_id }))
        }
        Mutation::CreateComment(comment) => {
            let row = CommentRow::from(comment);
            conn.execute(
                "INSERT INTO comments (id, image_id, user_id, user_name, text, image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    row.id,
                    row.image_id,
                    row.user_id,
                    row.user_name,
                    row.text,
                    row.image_url,
                    row.created_at
                ],
            )?;
            Ok(Some(SyncEvent::CommentCreate { comment: comment.clone() }))
        }
        Mutation::DeleteComment { id } => {
            let image_id: Option<String> = conn
                .query_row(
                    "DELETE FROM comments WHERE id = ?1 RETURNING image_id",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(image_id.map(|image_id| SyncEvent::CommentDelete { id: *id, image_id }))
        }
    }
}

fn query_reactions(conn: &Connection, q: &EntityQuery) -> Result<Vec<ReactionRow>> {
    let sql = entity_sql("reactions", REACTION_COLUMNS, q.order);
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(rusqlite::params![q.image_id, sql_limit(q.limit)], reaction_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_comments(conn: &Connection, q: &EntityQuery) -> Result<Vec<CommentRow>> {
    let sql = entity_sql("comments", COMMENT_COLUMNS, q.order);
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(rusqlite::params![q.image_id, sql_limit(q.limit)], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// `?1` is the optional image filter, `?2` the limit (-1 means none).
fn entity_sql(table: &str, columns: &str, order: Order) -> String {
    let dir = match order {
        Order::Asc => "ASC",
        Order::Desc => "DESC",
    };
    format!(
        "SELECT {columns} FROM {table}
         WHERE (?1 IS NULL OR image_id = ?1)
         ORDER BY created_at {dir}, id {dir}
         LIMIT ?2"
    )
}

fn sql_limit(limit: Option<u32>) -> i64 {
    limit.map_or(-1, i64::from)
}

fn reaction_from_row(row: &Row<'_>) -> rusqlite::Result<ReactionRow> {
    Ok(ReactionRow {
        id: row.get(0)?,
        image_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        emoji: row.get(4)?,
        image_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        image_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        text: row.get(4)?,
        image_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use gallery_types::models::{Comment, Reaction};
    use uuid::Uuid;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn reaction(image_id: &str, emoji: &str, ms: i64) -> Reaction {
        Reaction {
            id: Uuid::new_v4(),
            image_id: image_id.into(),
            user_id: Uuid::new_v4(),
            user_name: "ada".into(),
            emoji: emoji.into(),
            image_url: "https://example.com/thumb.jpg".into(),
            created_at: at(ms),
        }
    }

    fn comment(image_id: &str, text: &str, ms: i64) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            image_id: image_id.into(),
            user_id: Uuid::new_v4(),
            user_name: "grace".into(),
            text: text.into(),
            image_url: "https://example.com/thumb.jpg".into(),
            created_at: at(ms),
        }
    }

    #[test]
    fn create_then_query_by_image() {
        let db = Database::open_in_memory().unwrap();
        let mine = reaction("a", "🔥", 1_000);
        let other = reaction("b", "😂", 2_000);

        let events = db
            .apply_mutations(&[
                Mutation::CreateReaction(mine.clone()),
                Mutation::CreateReaction(other),
            ])
            .unwrap();
        assert_eq!(events.len(), 2);

        let result = db.run_query(&Query::for_image("a")).unwrap();
        assert_eq!(result.reactions, vec![mine]);
        assert!(result.comments.is_empty());
    }

    #[test]
    fn recent_query_is_newest_first_and_limited() {
        let db = Database::open_in_memory().unwrap();
        let mutations: Vec<Mutation> = (0..5)
            .map(|i| Mutation::CreateComment(comment("a", &format!("c{i}"), 1_000 + i)))
            .collect();
        db.apply_mutations(&mutations).unwrap();

        let result = db.run_query(&Query::recent(3)).unwrap();
        let texts: Vec<&str> = result.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["c4", "c3", "c2"]);
    }

    #[test]
    fn update_returns_full_row() {
        let db = Database::open_in_memory().unwrap();
        let original = reaction("a", "🔥", 1_000);
        db.apply_mutations(&[Mutation::CreateReaction(original.clone())]).unwrap();

        let later = original.created_at + Duration::milliseconds(250);
        let events = db
            .apply_mutations(&[Mutation::UpdateReaction {
                id: original.id,
                emoji: "😮".into(),
                created_at: later,
            }])
            .unwrap();

        match &events[..] {
            [SyncEvent::ReactionUpdate { reaction }] => {
                assert_eq!(reaction.emoji, "😮");
                assert_eq!(reaction.created_at, later);
                assert_eq!(reaction.image_id, "a");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn delete_of_missing_row_emits_nothing() {
        let db = Database::open_in_memory().unwrap();
        let events = db
            .apply_mutations(&[Mutation::DeleteComment { id: Uuid::new_v4() }])
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn delete_reports_image_scope() {
        let db = Database::open_in_memory().unwrap();
        let c = comment("img-7", "nice", 1_000);
        db.apply_mutations(&[Mutation::CreateComment(c.clone())]).unwrap();

        let events = db.apply_mutations(&[Mutation::DeleteComment { id: c.id }]).unwrap();
        assert_eq!(events, vec![SyncEvent::CommentDelete { id: c.id, image_id: "img-7".into() }]);
        assert!(db.get_comment(&c.id.to_string()).unwrap().is_none());
    }

    #[test]
    fn failed_batch_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let dup = reaction("a", "🔥", 1_000);

        let result = db.apply_mutations(&[
            Mutation::CreateReaction(dup.clone()),
            Mutation::CreateReaction(dup.clone()),
        ]);
        assert!(result.is_err());
        assert!(db.get_reaction(&dup.id.to_string()).unwrap().is_none());
    }

    #[test]
    fn local_state_upserts_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        {
            let db = Database::open(&path).unwrap();
            assert!(db.get_state("k").unwrap().is_none());
            db.put_state("k", "one").unwrap();
            db.put_state("k", "two").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_state("k").unwrap().as_deref(), Some("two"));
    }
}
