// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message template CRUD operations.

use clinicbot_core::types::{
    normalize_tags, now_timestamp, MessageTemplate, NewTemplate, TemplateFilter, TemplatePatch,
};
use clinicbot_core::{ClinicError, LanguageCode};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;
use crate::queries::{decode_tags, encode_tags};

const TEMPLATE_COLUMNS: &str = "id, title, body, language, tags, created_at, updated_at";

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<MessageTemplate> {
    let language: String = row.get(3)?;
    let tags: String = row.get(4)?;
    Ok(MessageTemplate {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        language: language.parse::<LanguageCode>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        tags: decode_tags(&tags),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn select_template(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<MessageTemplate>> {
    conn.query_row(
        &format!("SELECT {TEMPLATE_COLUMNS} FROM message_templates WHERE id = ?1"),
        params![id],
        row_to_template,
    )
    .optional()
}

/// Validate and insert a new template with a generated id.
pub async fn create_template(
    db: &Database,
    template: &NewTemplate,
) -> Result<MessageTemplate, ClinicError> {
    template.validate()?;
    let now = now_timestamp();
    let stored = MessageTemplate {
        id: uuid::Uuid::new_v4().to_string(),
        title: template.title.trim().to_string(),
        body: template.body.clone(),
        language: template.language,
        tags: normalize_tags(&template.tags),
        created_at: now.clone(),
        updated_at: now,
    };
    let row = stored.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_templates (id, title, body, language, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.title,
                    row.body,
                    row.language.to_string(),
                    encode_tags(&row.tags),
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(stored)
}

/// Fetch one template.
pub async fn get_template(db: &Database, id: &str) -> Result<Option<MessageTemplate>, ClinicError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_template(conn, &id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a partial update inside one writer call.
pub async fn update_template(
    db: &Database,
    id: &str,
    patch: TemplatePatch,
) -> Result<MessageTemplate, ClinicError> {
    let template_id = id.to_string();
    let now = now_timestamp();
    let outcome = db
        .connection()
        .call(move |conn| {
            let Some(mut template) = select_template(conn, &template_id)? else {
                return Ok(Err(ClinicError::not_found("template", template_id)));
            };
            if let Err(e) = patch.apply(&mut template) {
                return Ok(Err(e));
            }
            template.title = template.title.trim().to_string();
            template.updated_at = now;
            conn.execute(
                "UPDATE message_templates
                 SET title = ?2, body = ?3, language = ?4, tags = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    template.id,
                    template.title,
                    template.body,
                    template.language.to_string(),
                    encode_tags(&template.tags),
                    template.updated_at,
                ],
            )?;
            Ok(Ok(template))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}

/// Delete a template; unknown ids are `NotFound`.
pub async fn delete_template(db: &Database, id: &str) -> Result<(), ClinicError> {
    let template_id = id.to_string();
    let deleted = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM message_templates WHERE id = ?1", params![template_id]))
        .await
        .map_err(crate::database::map_tr_err)?;
    if deleted == 0 {
        return Err(ClinicError::not_found("template", id));
    }
    Ok(())
}

/// List templates matching `filter`, newest first.
pub async fn list_templates(
    db: &Database,
    filter: &TemplateFilter,
) -> Result<Vec<MessageTemplate>, ClinicError> {
    let templates = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TEMPLATE_COLUMNS} FROM message_templates ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map([], row_to_template)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(templates.into_iter().filter(|t| t.matches(filter)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn new_template(title: &str, body: &str, language: LanguageCode) -> NewTemplate {
        NewTemplate {
            title: title.to_string(),
            body: body.to_string(),
            language,
            tags: ["pricing".to_string()].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let (db, _dir) = setup_db().await;

        let created = create_template(&db, &new_template("Prices", "FUE starts at...", LanguageCode::En))
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let fetched = get_template(&db, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let patch = TemplatePatch {
            body: Some("DHI starts at...".into()),
            ..TemplatePatch::default()
        };
        let updated = update_template(&db, &created.id, patch).await.unwrap();
        assert_eq!(updated.body, "DHI starts at...");
        assert_eq!(updated.title, "Prices");
        assert_eq!(updated.created_at, created.created_at);

        delete_template(&db, &created.id).await.unwrap();
        assert!(get_template(&db, &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_title_is_rejected_and_nothing_stored() {
        let (db, _dir) = setup_db().await;
        let err = create_template(&db, &new_template("  ", "body", LanguageCode::Tr))
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
        assert!(list_templates(&db, &TemplateFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_patch_leaves_template_unchanged() {
        let (db, _dir) = setup_db().await;
        let created = create_template(&db, &new_template("Hours", "9-18", LanguageCode::Ru))
            .await
            .unwrap();
        let patch = TemplatePatch {
            body: Some(String::new()),
            ..TemplatePatch::default()
        };
        let err = update_template(&db, &created.id, patch).await.unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
        let fetched = get_template(&db, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched.body, "9-18");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (db, _dir) = setup_db().await;
        let err = update_template(&db, "nope", TemplatePatch::default()).await.unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { entity: "template", .. }));
        let err = delete_template(&db, "nope").await.unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { .. }));
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let (db, _dir) = setup_db().await;
        let created = create_template(&db, &new_template("Hours", "9-18", LanguageCode::En))
            .await
            .unwrap();

        delete_template(&db, &created.id).await.unwrap();
        let err = delete_template(&db, &created.id).await.unwrap_err();
        assert!(matches!(err, ClinicError::NotFound { entity: "template", .. }));
    }

    #[tokio::test]
    async fn list_filters_by_language_and_search() {
        let (db, _dir) = setup_db().await;
        create_template(&db, &new_template("Fiyatlar", "FUE fiyatı", LanguageCode::Tr)).await.unwrap();
        create_template(&db, &new_template("Prices", "FUE price", LanguageCode::En)).await.unwrap();
        create_template(&db, &new_template("Directions", "Our address", LanguageCode::En)).await.unwrap();

        let english = TemplateFilter {
            language: Some(LanguageCode::En),
            ..TemplateFilter::default()
        };
        assert_eq!(list_templates(&db, &english).await.unwrap().len(), 2);

        let search = TemplateFilter {
            language: Some(LanguageCode::En),
            search: Some("fue".into()),
            tag: None,
        };
        let hits = list_templates(&db, &search).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Prices");
    }
}
