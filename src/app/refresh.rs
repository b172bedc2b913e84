//! Widget data refresh tasks.
//!
//! Every widget refresh is an independent fetch-then-compute task: fetch a
//! bounded record page, re-apply the widget's full filter spec client-side,
//! then aggregate into the shape its renderer consumes. Refreshes for
//! different widgets run concurrently; a newer refresh for the same widget
//! supersedes the older one by generation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::mpsc;

use crate::aggregate::{aggregate, evaluate_stat, timeline, top_n, GroupKey};
use crate::api::{ApiClient, ApiError, LogQuery, DEFAULT_FETCH_LIMIT, WIDE_FETCH_LIMIT};
use crate::models::filter::{FilterSpec, RelativeRange, TimeRange};
use crate::models::widget::{ChartConfig, Widget, WidgetBody, WidgetKind};
use crate::models::{LogRecord, StatsSummary};

use super::state::{AppMessage, AppState, WidgetData, CACHE_TTL_SECS};

/// Spawn a refresh for one widget and mark it loading.
pub async fn spawn_widget_refresh(
    state: Arc<AppState>,
    tx: mpsc::Sender<AppMessage>,
    widget: Widget,
) {
    let generation = state.next_generation(&widget.id).await;
    state
        .widget_data
        .write()
        .await
        .insert(widget.id.clone(), WidgetData::Loading);

    let cached_stats = {
        let cache = state.stats_cache.read().await;
        cache
            .as_ref()
            .filter(|c| !c.is_stale(Utc::now(), Duration::seconds(CACHE_TTL_SECS)))
            .map(|c| c.data.clone())
    };

    let api = state.api.clone();
    tokio::spawn(async move {
        let widget_id = widget.id.clone();
        let data = match compute_widget_data(&api, &widget, cached_stats).await {
            Ok((data, fetched_stats)) => {
                if let Some(stats) = fetched_stats {
                    let _ = tx.send(AppMessage::StatsLoaded { stats }).await;
                }
                data
            }
            Err(e) => WidgetData::Failed(e.summary()),
        };
        let _ = tx
            .send(AppMessage::WidgetRefreshed {
                widget_id,
                generation,
                data,
            })
            .await;
    });
}

/// Spawn a raw-query execution for a query-builder widget.
pub async fn spawn_query(
    state: Arc<AppState>,
    tx: mpsc::Sender<AppMessage>,
    widget_id: String,
    query: String,
) {
    let generation = state.next_generation(&widget_id).await;
    state
        .widget_data
        .write()
        .await
        .insert(widget_id.clone(), WidgetData::Loading);

    let api = state.api.clone();
    tokio::spawn(async move {
        let data = match api.run_query(&query).await {
            Ok(rows) => {
                let columns = rows
                    .first()
                    .map(|row| row.keys().cloned().collect())
                    .unwrap_or_default();
                WidgetData::QueryRows { columns, rows }
            }
            Err(e) => WidgetData::Failed(e.summary()),
        };
        let _ = tx
            .send(AppMessage::WidgetRefreshed {
                widget_id,
                generation,
                data,
            })
            .await;
    });
}

/// Fetch and filter the record page a widget's filters describe.
async fn fetch_filtered(
    api: &ApiClient,
    filters: &FilterSpec,
    limit: usize,
) -> Result<Vec<LogRecord>, ApiError> {
    let records = api.fetch_logs(&LogQuery::from_filters(filters, limit)).await?;
    Ok(records.into_iter().filter(|r| filters.matches(r)).collect())
}

fn with_range_override(filters: &FilterSpec, range: Option<RelativeRange>) -> FilterSpec {
    match range {
        Some(range) => {
            let mut filters = filters.clone();
            filters.time_range = TimeRange::Relative(range);
            filters
        }
        None => filters.clone(),
    }
}

fn chart_group_key(config: &ChartConfig, kind: WidgetKind) -> GroupKey {
    match config.group_by.as_deref() {
        Some(field) if !field.is_empty() => GroupKey::parse(field),
        _ => match kind {
            WidgetKind::ChartProtocol => GroupKey::Protocol,
            WidgetKind::ChartEventType => GroupKey::EventType,
            _ => GroupKey::Severity,
        },
    }
}

/// Compute the rendering data for one widget. Also returns a freshly fetched
/// stats summary, if one had to be fetched, so the caller can cache it.
async fn compute_widget_data(
    api: &ApiClient,
    widget: &Widget,
    cached_stats: Option<StatsSummary>,
) -> Result<(WidgetData, Option<StatsSummary>), ApiError> {
    match &widget.body {
        WidgetBody::StatCard(config) => {
            let records = fetch_filtered(api, &config.filters, WIDE_FETCH_LIMIT).await?;
            let value = evaluate_stat(&records, config.field, Utc::now());
            Ok((WidgetData::Scalar(value), None))
        }

        WidgetBody::ChartSeverity(config)
        | WidgetBody::ChartProtocol(config)
        | WidgetBody::ChartEventType(config) => {
            let records = fetch_filtered(api, &config.filters, WIDE_FETCH_LIMIT).await?;
            let key = chart_group_key(config, widget.kind());
            Ok((WidgetData::Groups(aggregate(&records, &key)), None))
        }

        WidgetBody::TopN(config) => {
            let filters = with_range_override(&config.filters, config.time_range);
            let records = fetch_filtered(api, &filters, WIDE_FETCH_LIMIT).await?;
            let key = GroupKey::parse(&config.field);
            Ok((WidgetData::Groups(top_n(&records, &key, config.limit)), None))
        }

        WidgetBody::DataTable(config) => {
            let mut records = fetch_filtered(api, &config.filters, config.limit.max(1)).await?;
            records.truncate(config.limit);
            Ok((
                WidgetData::Rows {
                    columns: config.column_list(),
                    records,
                },
                None,
            ))
        }

        WidgetBody::DeviceStats(_) => match cached_stats {
            Some(stats) => Ok((WidgetData::Groups(stats.top_device_types(10)), None)),
            None => {
                let stats = api.fetch_stats().await?;
                Ok((WidgetData::Groups(stats.top_device_types(10)), Some(stats)))
            }
        },

        WidgetBody::EventTimeline(config) => {
            let filters = with_range_override(&config.filters, config.time_range);
            let records = fetch_filtered(api, &filters, DEFAULT_FETCH_LIMIT).await?;
            let bucket_minutes = filters
                .relative_range()
                .unwrap_or_default()
                .bucket_minutes();
            Ok((WidgetData::Groups(timeline(&records, bucket_minutes)), None))
        }

        // The query panel fetches nothing on refresh; execution happens only
        // on an explicit run action, in every mode including read-only.
        WidgetBody::QueryBuilder(_) => Ok((
            WidgetData::QueryRows {
                columns: Vec::new(),
                rows: Vec::new(),
            },
            None,
        )),
    }
}
