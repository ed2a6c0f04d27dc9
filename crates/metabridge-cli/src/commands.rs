//! Subcommand implementations. Each returns the JSON report to print.

use anyhow::Context;
use serde_json::{json, Value};

use metabridge_core::{
    fetch_trees, read_staged, write_staged, AppConfig, ChildRef, Importer, SourceLocks,
};
use metabridge_db::{create_pool, PgWarehouseLoader};
use metabridge_sparql::SparqlSource;

type CliImporter = Importer<SparqlSource, PgWarehouseLoader>;

async fn importer(config: &AppConfig, source_id: &str) -> anyhow::Result<CliImporter> {
    let settings = config.source(source_id)?;
    let source = SparqlSource::from_settings(settings, &config.sparql, &config.prefixes)?;
    let pool = create_pool(&config.database_url, &config.pool)
        .await
        .context("connecting to the warehouse")?;
    let loader = PgWarehouseLoader::new(
        pool,
        config.warehouse.clone(),
        config.paths.table_code_prefix.clone(),
    )?;
    Ok(Importer::new(
        source,
        loader,
        SourceLocks::new(),
        config.paths.clone(),
    ))
}

/// Explicit roots win over configured ones; none means every top element.
fn roots(
    config: &AppConfig,
    source_id: &str,
    explicit: Vec<ChildRef>,
) -> anyhow::Result<Vec<ChildRef>> {
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    Ok(config
        .source(source_id)?
        .roots
        .iter()
        .map(|r| ChildRef::new(r.uri.clone(), r.node_type.clone()))
        .collect())
}

pub async fn import(
    config: &AppConfig,
    source_id: &str,
    root: Vec<ChildRef>,
) -> anyhow::Result<Value> {
    let roots = roots(config, source_id, root)?;
    let importer = importer(config, source_id).await?;
    let report = importer.import_source(source_id, &roots).await?;
    Ok(serde_json::to_value(report)?)
}

pub async fn fetch(
    config: &AppConfig,
    source_id: &str,
    root: Vec<ChildRef>,
) -> anyhow::Result<Value> {
    let roots = roots(config, source_id, root)?;
    let settings = config.source(source_id)?;
    let source = SparqlSource::from_settings(settings, &config.sparql, &config.prefixes)?;

    let locks = SourceLocks::new();
    let _lease = locks.try_acquire(&[source_id])?;
    let fetched = fetch_trees(&source, source_id, &roots, &config.paths).await?;

    let files = write_staged(
        &config.staging.directory,
        &config.staging.file_prefix,
        source_id,
        &fetched.projection.rows,
        &config.warehouse,
    )?;
    Ok(json!({
        "source_id": source_id,
        "trees": fetched.trees,
        "rows": fetched.projection.rows.counts(),
        "files": files,
        "errors": fetched.projection.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
    }))
}

pub async fn load(config: &AppConfig, source_id: &str) -> anyhow::Result<Value> {
    let rows = read_staged(
        &config.staging.directory,
        &config.staging.file_prefix,
        source_id,
        &config.warehouse,
    )
    .with_context(|| format!("reading staged rows of '{}'", source_id))?;
    let importer = importer(config, source_id).await?;
    let report = importer.load_rows(source_id, &rows).await?;
    Ok(json!({ "source_id": source_id, "load": report }))
}

pub async fn flush(config: &AppConfig, source_id: &str) -> anyhow::Result<Value> {
    let importer = importer(config, source_id).await?;
    let report = importer.flush_source(source_id).await?;
    Ok(json!({ "source_id": source_id, "flush": report }))
}
