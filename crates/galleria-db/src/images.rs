//! PostgreSQL image store.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, instrument};

use galleria_core::{
    Error, Image, ImageMetadata, ImageStore, QueryPlan, Result, SearchField, SortDirection,
    SortKey, SortSpec, SuggestionPipeline, SuggestionStage, TextMatch,
};

use crate::escape_like;
use crate::match_filter::{QueryParam, TextMatchQueryBuilder};

const IMAGE_COLUMNS: &str = "i.id, i.name, i.description, i.added_by, i.album_id, i.album_name, \
     i.auto_tags, i.user_tags, i.user_faces, i.backlog_faces, i.views, i.taken_at";

/// Image store backed by the `image` table.
#[derive(Clone)]
pub struct PgImageStore {
    pool: PgPool,
}

impl PgImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace one image. The `image_term` index is refreshed by
    /// trigger.
    pub async fn upsert(&self, image: &Image) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO image (id, name, description, added_by, album_id, album_name,
                               auto_tags, user_tags, user_faces, backlog_faces, views, taken_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                added_by = EXCLUDED.added_by,
                album_id = EXCLUDED.album_id,
                album_name = EXCLUDED.album_name,
                auto_tags = EXCLUDED.auto_tags,
                user_tags = EXCLUDED.user_tags,
                user_faces = EXCLUDED.user_faces,
                backlog_faces = EXCLUDED.backlog_faces,
                views = EXCLUDED.views,
                taken_at = EXCLUDED.taken_at
            "#,
        )
        .bind(image.id)
        .bind(&image.name)
        .bind(&image.description)
        .bind(&image.added_by)
        .bind(image.album_id)
        .bind(&image.album_name)
        .bind(&image.auto_tags)
        .bind(&image.user_tags)
        .bind(&image.user_faces)
        .bind(&image.backlog_faces)
        .bind(image.views)
        .bind(image.taken_at())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Bump the view counter of one image and return the new value.
    pub async fn increment_views(&self, id: uuid::Uuid) -> Result<i64> {
        let row = sqlx::query("UPDATE image SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        match row {
            Some(row) => Ok(row.try_get("views")?),
            None => Err(Error::NotFound(format!("image {}", id))),
        }
    }
}

fn bind_params<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: &'q [QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        q = match param {
            QueryParam::Int(val) => q.bind(val),
            QueryParam::StringArray(arr) => q.bind(arr),
        };
    }
    q
}

/// WHERE clause for an optional text match, plus its parameters.
fn where_clause(text_match: Option<&TextMatch>) -> (String, Vec<QueryParam>) {
    match text_match {
        Some(text_match) => TextMatchQueryBuilder::new(text_match, 0).build(),
        None => ("TRUE".to_string(), Vec::new()),
    }
}

/// ORDER BY clause. Undated images are the oldest in both directions.
fn order_clause(sort: Option<SortSpec>) -> String {
    let Some(sort) = sort else {
        return String::new();
    };
    let dir = sort.direction.as_sql();
    match sort.key {
        SortKey::TakenAt => {
            let nulls = match sort.direction {
                SortDirection::Asc => "NULLS FIRST",
                SortDirection::Desc => "NULLS LAST",
            };
            format!("ORDER BY i.taken_at {dir} {nulls}, i.id {dir}")
        }
        SortKey::Views => format!("ORDER BY i.views {dir}, i.id {dir}"),
    }
}

/// `value ILIKE $n` over the given fields, array fields checked via unnest.
fn substring_predicate(fields: &[SearchField], alias: &str, param_idx: usize) -> String {
    let predicates: Vec<String> = fields
        .iter()
        .map(|field| {
            if field.is_array() {
                format!(
                    "EXISTS (SELECT 1 FROM unnest({alias}.{col}) AS t(value) \
                     WHERE t.value ILIKE ${param_idx} ESCAPE '\\')",
                    col = field.as_str()
                )
            } else {
                format!(
                    "{alias}.{col} ILIKE ${param_idx} ESCAPE '\\'",
                    col = field.as_str()
                )
            }
        })
        .collect();
    if predicates.is_empty() {
        "FALSE".to_string()
    } else {
        format!("({})", predicates.join(" OR "))
    }
}

/// Array expression concatenating every value of the given fields.
fn flatten_expression(fields: &[SearchField], alias: &str) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|field| {
            if field.is_array() {
                format!("{alias}.{}", field.as_str())
            } else {
                format!("ARRAY[{alias}.{}]", field.as_str())
            }
        })
        .collect();
    if parts.is_empty() {
        "ARRAY[]::text[]".to_string()
    } else {
        parts.join(" || ")
    }
}

/// Translate a suggestion pipeline into one SQL statement.
///
/// `$1` is the escaped `%needle%` pattern. When the pipeline carries a
/// limit stage it is returned alongside the SQL and bound as `$2`.
fn suggestion_sql(pipeline: &SuggestionPipeline) -> Result<(String, Option<usize>)> {
    let mut match_fields: Option<&[SearchField]> = None;
    let mut flatten_fields: Option<&[SearchField]> = None;
    let mut filter_terms = false;
    let mut distinct = false;
    let mut limit: Option<usize> = None;

    for stage in pipeline.stages() {
        match stage {
            SuggestionStage::MatchSubstring { fields, .. } => {
                match_fields = Some(fields.as_slice())
            }
            SuggestionStage::Flatten { fields } => flatten_fields = Some(fields.as_slice()),
            SuggestionStage::FilterTerms { .. } => filter_terms = true,
            SuggestionStage::Distinct => distinct = true,
            SuggestionStage::Limit { count } => limit = Some(*count),
        }
    }

    let flatten_fields = flatten_fields.ok_or_else(|| {
        Error::RetrievalFailure("suggestion pipeline has no flatten stage".to_string())
    })?;
    let candidate_filter = match match_fields {
        Some(fields) => substring_predicate(fields, "c", 1),
        None => "TRUE".to_string(),
    };
    let term_filter = if filter_terms {
        "p.term ILIKE $1 ESCAPE '\\'"
    } else {
        "TRUE"
    };

    // DISTINCT ON keeps first-seen order within the flattened pool
    let select = if distinct {
        format!(
            "SELECT d.term FROM (\
             SELECT DISTINCT ON (p.term) p.term, p.ord FROM pool p WHERE {term_filter} \
             ORDER BY p.term, p.ord) d ORDER BY d.ord"
        )
    } else {
        format!("SELECT p.term FROM pool p WHERE {term_filter} ORDER BY p.ord")
    };
    let limit_clause = if limit.is_some() { " LIMIT $2" } else { "" };

    let sql = format!(
        "WITH candidate AS (\
         SELECT c.*, row_number() OVER () AS image_ord FROM image c WHERE {candidate_filter}), \
         pool AS (\
         SELECT f.term, (c.image_ord, f.ord) AS ord \
         FROM candidate c CROSS JOIN LATERAL unnest({flatten}) WITH ORDINALITY AS f(term, ord)) \
         {select}{limit_clause}",
        flatten = flatten_expression(flatten_fields, "c"),
    );
    Ok((sql, limit))
}

fn image_from_row(row: &PgRow) -> Result<Image> {
    Ok(Image {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        added_by: row.try_get("added_by")?,
        album_id: row.try_get("album_id")?,
        album_name: row.try_get("album_name")?,
        auto_tags: row.try_get("auto_tags")?,
        user_tags: row.try_get("user_tags")?,
        user_faces: row.try_get("user_faces")?,
        backlog_faces: row.try_get("backlog_faces")?,
        views: row.try_get("views")?,
        metadata: ImageMetadata {
            date_time: row.try_get("taken_at")?,
        },
    })
}

#[async_trait]
impl ImageStore for PgImageStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self, text_match), fields(subsystem = "db", component = "pg_store", op = "count"))]
    async fn count(&self, text_match: Option<&TextMatch>) -> Result<u64> {
        let start = Instant::now();
        let (clause, params) = where_clause(text_match);
        let sql = format!("SELECT COUNT(*) AS total FROM image i WHERE {clause}");

        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        let total: i64 = row.try_get("total")?;

        debug!(
            total_count = total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Count complete"
        );
        Ok(total.max(0) as u64)
    }

    #[instrument(skip(self, plan), fields(subsystem = "db", component = "pg_store", op = "find"))]
    async fn find(&self, plan: &QueryPlan) -> Result<Vec<Image>> {
        let start = Instant::now();
        let (clause, params) = where_clause(plan.text_match());
        let skip_idx = params.len() + 1;
        let limit_idx = params.len() + 2;
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM image i WHERE {clause} {order} LIMIT ${limit_idx} OFFSET ${skip_idx}",
            order = order_clause(plan.sort()),
        );

        let skip = i64::try_from(plan.skip()).unwrap_or(i64::MAX);
        let limit = i64::try_from(plan.limit()).unwrap_or(i64::MAX);
        let rows = bind_params(sqlx::query(&sql), &params)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let images = rows.iter().map(image_from_row).collect::<Result<Vec<_>>>()?;
        debug!(
            result_count = images.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Find complete"
        );
        Ok(images)
    }

    #[instrument(skip(self, pipeline), fields(subsystem = "db", component = "pg_store", op = "aggregate_terms"))]
    async fn aggregate_terms(&self, pipeline: &SuggestionPipeline) -> Result<Vec<String>> {
        let start = Instant::now();
        let (sql, limit) = suggestion_sql(pipeline)?;
        let pattern = format!("%{}%", escape_like(pipeline.needle()));

        let mut q = sqlx::query(&sql).bind(pattern);
        if let Some(limit) = limit {
            q = q.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let terms = rows
            .iter()
            .map(|row| row.try_get::<String, _>("term"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(
            result_count = terms.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Aggregation complete"
        );
        Ok(terms)
    }
}
