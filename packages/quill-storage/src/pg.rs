use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, postgres::PgRow};
use uuid::Uuid;

use crate::{
	BoxFuture, Error, OwnedEntity, OwnedRepository, RecordStore, Result,
	db::Db,
	models::{
		NotePatch, NoteRecord, NoteTagRecord, NoteWithTagRefs, TagPatch, TagRecord, UserPatch,
		UserRecord,
	},
};

// Links without a resolvable tag surface as NULL entries; notes without links get an empty array.
const NOTE_WITH_TAGS_SELECT: &str = "\
SELECT
	n.*,
	COALESCE(
		array_agg(t.name ORDER BY nt.linked_at, t.name) FILTER (WHERE nt.note_id IS NOT NULL),
		ARRAY[]::text[]
	) AS tag_names
FROM notes n
LEFT JOIN note_tags nt ON nt.note_id = n.id
LEFT JOIN tags t ON t.id = nt.tag_id";

impl OwnedRepository<NoteRecord> for Db {
	fn get<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<Option<NoteRecord>>> {
		Box::pin(fetch_owned(&self.pool, owner_id, id))
	}

	fn update<'a>(
		&'a self,
		owner_id: Uuid,
		id: Uuid,
		patch: &'a NotePatch,
	) -> BoxFuture<'a, Result<Option<NoteRecord>>> {
		Box::pin(update_note(&self.pool, owner_id, id, patch))
	}

	fn delete<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(delete_owned::<NoteRecord>(&self.pool, owner_id, id))
	}
}

impl OwnedRepository<TagRecord> for Db {
	fn get<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<Option<TagRecord>>> {
		Box::pin(fetch_owned(&self.pool, owner_id, id))
	}

	fn update<'a>(
		&'a self,
		owner_id: Uuid,
		id: Uuid,
		patch: &'a TagPatch,
	) -> BoxFuture<'a, Result<Option<TagRecord>>> {
		Box::pin(async move {
			let sql = format!(
				"UPDATE tags SET name = COALESCE($3, name) WHERE id = $1 AND {} = $2 RETURNING *",
				TagRecord::OWNER_COLUMN
			);
			let row = sqlx::query_as::<_, TagRecord>(&sql)
				.bind(id)
				.bind(owner_id)
				.bind(patch.name.as_deref())
				.fetch_optional(&self.pool)
				.await
				.map_err(|err| Error::from_insert(err, "Tag"))?;

			Ok(row)
		})
	}

	fn delete<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(delete_owned::<TagRecord>(&self.pool, owner_id, id))
	}
}

impl OwnedRepository<UserRecord> for Db {
	fn get<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<Option<UserRecord>>> {
		Box::pin(fetch_owned(&self.pool, owner_id, id))
	}

	fn update<'a>(
		&'a self,
		owner_id: Uuid,
		id: Uuid,
		patch: &'a UserPatch,
	) -> BoxFuture<'a, Result<Option<UserRecord>>> {
		Box::pin(async move {
			let sql = format!(
				"\
UPDATE users
SET full_name = COALESCE($3, full_name)
WHERE id = $1 AND {} = $2
RETURNING *",
				UserRecord::OWNER_COLUMN
			);
			let row = sqlx::query_as::<_, UserRecord>(&sql)
				.bind(id)
				.bind(owner_id)
				.bind(patch.full_name.as_deref())
				.fetch_optional(&self.pool)
				.await?;

			Ok(row)
		})
	}

	fn delete<'a>(&'a self, owner_id: Uuid, id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(delete_owned::<UserRecord>(&self.pool, owner_id, id))
	}
}

impl RecordStore for Db {
	fn find_user_by_email<'a>(
		&'a self,
		email: &'a str,
	) -> BoxFuture<'a, Result<Option<UserRecord>>> {
		Box::pin(async move {
			let row = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = $1")
				.bind(email)
				.fetch_optional(&self.pool)
				.await?;

			Ok(row)
		})
	}

	fn insert_user<'a>(&'a self, user: &'a UserRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO users (id, email, full_name, created_at)
VALUES ($1, $2, $3, $4)",
			)
			.bind(user.id)
			.bind(user.email.as_str())
			.bind(user.full_name.as_deref())
			.bind(user.created_at)
			.execute(&self.pool)
			.await
			.map_err(|err| Error::from_insert(err, "User"))?;

			Ok(())
		})
	}

	fn insert_note<'a>(&'a self, note: &'a NoteRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO notes (
	id,
	user_id,
	title,
	type,
	transcript,
	summary,
	media_url,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
			)
			.bind(note.id)
			.bind(note.user_id)
			.bind(note.title.as_str())
			.bind(note.r#type.as_str())
			.bind(note.transcript.as_str())
			.bind(note.summary.as_deref())
			.bind(note.media_url.as_deref())
			.bind(note.created_at)
			.bind(note.updated_at)
			.execute(&self.pool)
			.await
			.map_err(|err| Error::from_insert(err, "Note"))?;

			Ok(())
		})
	}

	fn note_with_tags<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
	) -> BoxFuture<'a, Result<Option<NoteWithTagRefs>>> {
		Box::pin(async move {
			let sql = format!(
				"{NOTE_WITH_TAGS_SELECT}
WHERE n.id = $1 AND n.user_id = $2
GROUP BY n.id"
			);
			let row = sqlx::query_as::<_, NoteWithTagRefs>(&sql)
				.bind(note_id)
				.bind(owner_id)
				.fetch_optional(&self.pool)
				.await?;

			Ok(row)
		})
	}

	fn notes_with_tags<'a>(
		&'a self,
		owner_id: Uuid,
	) -> BoxFuture<'a, Result<Vec<NoteWithTagRefs>>> {
		Box::pin(async move {
			let sql = format!(
				"{NOTE_WITH_TAGS_SELECT}
WHERE n.user_id = $1
GROUP BY n.id
ORDER BY n.created_at DESC, n.id DESC"
			);
			let rows = sqlx::query_as::<_, NoteWithTagRefs>(&sql)
				.bind(owner_id)
				.fetch_all(&self.pool)
				.await?;

			Ok(rows)
		})
	}

	fn find_tag<'a>(
		&'a self,
		owner_id: Uuid,
		name: &'a str,
	) -> BoxFuture<'a, Result<Option<TagRecord>>> {
		Box::pin(async move {
			let row = sqlx::query_as::<_, TagRecord>(
				"SELECT * FROM tags WHERE user_id = $1 AND name = $2",
			)
			.bind(owner_id)
			.bind(name)
			.fetch_optional(&self.pool)
			.await?;

			Ok(row)
		})
	}

	fn insert_tag<'a>(&'a self, tag: &'a TagRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO tags (id, user_id, name, created_at)
VALUES ($1, $2, $3, $4)",
			)
			.bind(tag.id)
			.bind(tag.user_id)
			.bind(tag.name.as_str())
			.bind(tag.created_at)
			.execute(&self.pool)
			.await
			.map_err(|err| Error::from_insert(err, "Tag"))?;

			Ok(())
		})
	}

	fn list_tags<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Vec<TagRecord>>> {
		Box::pin(async move {
			let rows = sqlx::query_as::<_, TagRecord>(
				"SELECT * FROM tags WHERE user_id = $1 ORDER BY name, id",
			)
			.bind(owner_id)
			.fetch_all(&self.pool)
			.await?;

			Ok(rows)
		})
	}

	fn link_note_tag<'a>(&'a self, link: &'a NoteTagRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO note_tags (note_id, tag_id, linked_at)
VALUES ($1, $2, $3)
ON CONFLICT (note_id, tag_id) DO NOTHING",
			)
			.bind(link.note_id)
			.bind(link.tag_id)
			.bind(link.linked_at)
			.execute(&self.pool)
			.await
			.map_err(|err| Error::from_insert(err, "Tag link"))?;

			Ok(())
		})
	}
}

async fn fetch_owned<T>(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<Option<T>>
where
	T: OwnedEntity + for<'r> FromRow<'r, PgRow> + Unpin,
{
	let sql = format!("SELECT * FROM {} WHERE id = $1 AND {} = $2", T::TABLE, T::OWNER_COLUMN);
	let row = sqlx::query_as::<_, T>(&sql).bind(id).bind(owner_id).fetch_optional(pool).await?;

	Ok(row)
}

async fn delete_owned<T>(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<bool>
where
	T: OwnedEntity,
{
	let sql = format!("DELETE FROM {} WHERE id = $1 AND {} = $2", T::TABLE, T::OWNER_COLUMN);
	let result = sqlx::query(&sql).bind(id).bind(owner_id).execute(pool).await?;

	Ok(result.rows_affected() > 0)
}

async fn update_note(
	pool: &PgPool,
	owner_id: Uuid,
	id: Uuid,
	patch: &NotePatch,
) -> Result<Option<NoteRecord>> {
	let mut builder = QueryBuilder::<Postgres>::new("UPDATE notes SET updated_at = ");

	builder.push_bind(patch.updated_at);

	if let Some(title) = patch.title.as_deref() {
		builder.push(", title = ").push_bind(title);
	}
	if let Some(note_type) = patch.r#type.as_deref() {
		builder.push(", type = ").push_bind(note_type);
	}
	if let Some(transcript) = patch.transcript.as_deref() {
		builder.push(", transcript = ").push_bind(transcript);
	}
	if let Some(summary) = patch.summary.as_deref() {
		builder.push(", summary = ").push_bind(summary);
	}
	if let Some(media_url) = patch.media_url.as_deref() {
		builder.push(", media_url = ").push_bind(media_url);
	}

	builder
		.push(" WHERE id = ")
		.push_bind(id)
		.push(format!(" AND {} = ", NoteRecord::OWNER_COLUMN))
		.push_bind(owner_id)
		.push(" RETURNING *");

	let row = builder.build_query_as::<NoteRecord>().fetch_optional(pool).await?;

	Ok(row)
}
