//! Template business logic - Named reply bodies the operator can switch between.

use crate::{
    config::templates::TemplateConfig,
    entities::{Template, template},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::OnConflict};
use tracing::info;

/// Creates the template or replaces the body of an existing one.
///
/// Both the name and the message are trimmed and must not be empty.
pub async fn upsert_template<C>(db: &C, name: &str, message: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    let message = message.trim();
    if name.is_empty() {
        return Err(Error::malformed("Template name cannot be empty."));
    }
    if message.is_empty() {
        return Err(Error::malformed("Template message cannot be empty."));
    }

    let model = template::ActiveModel {
        name: Set(name.to_string()),
        message: Set(message.to_string()),
        updated_at: Set(Utc::now()),
    };
    Template::insert(model)
        .on_conflict(
            OnConflict::column(template::Column::Name)
                .update_columns([template::Column::Message, template::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    info!("Template '{}' set", name);
    Ok(())
}

/// Finds a template by exact name.
pub async fn get_template<C>(db: &C, name: &str) -> Result<Option<template::Model>>
where
    C: ConnectionTrait,
{
    Template::find_by_id(name.trim().to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Deletes a template, returning [`Error::TemplateNotFound`] if there was none.
pub async fn delete_template<C>(db: &C, name: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    let result = Template::delete_by_id(name.to_string()).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::TemplateNotFound {
            name: name.to_string(),
        });
    }
    info!("Template '{}' deleted", name);
    Ok(())
}

/// All template names, alphabetically.
pub async fn list_template_names<C>(db: &C) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    Template::find()
        .select_only()
        .column(template::Column::Name)
        .order_by_asc(template::Column::Name)
        .into_tuple::<String>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts seed templates whose names are not taken yet.
///
/// Returns the number of templates inserted.
pub async fn seed_templates<C>(db: &C, seeds: &[TemplateConfig]) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut inserted = 0;
    for seed in seeds {
        if get_template(db, &seed.name).await?.is_some() {
            continue;
        }
        upsert_template(db, &seed.name, &seed.message).await?;
        inserted += 1;
    }
    if inserted > 0 {
        info!("Seeded {} template(s)", inserted);
    }
    Ok(inserted)
}
